pub mod record;
pub mod stats;

pub use record::MatchRecord;
pub use stats::ScanStatistics;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence classification for a single finding.
///
/// `Strong` means the scanner is certain the site breaks against the changed
/// API. `Weak` means the match is heuristic (e.g. a method name on an
/// unknowable receiver) and needs human review.
///
/// The default is `Strong`: a finding whose rule did not classify itself is
/// treated as definite breakage rather than silently downgraded to
/// review-only. Downstream consumers rely on this fail-closed bias.
///
/// Serde derives are for downstream presentation layers and for rule
/// configuration payloads (`"indicator": "weak"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Severity {
    /// Certain breakage against a removed or changed API.
    #[default]
    Strong = 0,
    /// Heuristic finding, needs human judgement.
    Weak = 1,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Strong => write!(f, "strong"),
            Severity::Weak => write!(f, "weak"),
        }
    }
}
