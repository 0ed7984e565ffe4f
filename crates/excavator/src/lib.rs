//! # The Excavator: deprecated-API matching engine
//!
//! **Role**: Parses PHP source into a syntax tree and runs the full battery
//! of rule matchers against it in a single shared traversal.
//!
//! **Core pieces**:
//! - [`parser::ParserHost`]: tree-sitter PHP parsing over memory-mapped files.
//! - [`names::NameContext`]: pass-1 namespace/`use` resolution to
//!   fully-qualified names.
//! - [`stats::FileStatistics`]: pass-1 ignore markers and code counts; the
//!   single "skip this file entirely" decision point.
//! - [`matchers`]: one visitor per rule family, all riding the same pass-2
//!   walk and emitting [`common::MatchRecord`] values.
//! - [`registry::RuleSet`]: static rule table + cached JSON configuration.
//! - [`scanner::FileScanner`]: the per-file two-pass contract.
//! - [`orchestrator::ScanOrchestrator`]: drives whole roots, aggregates
//!   records and strong/weak statistics.

pub mod matchers;
pub mod names;
pub mod orchestrator;
pub mod parser;
pub mod registry;
pub mod scanner;
pub mod stats;
pub mod traversal;

pub use orchestrator::{RootReport, ScanOrchestrator, ScanReport};
pub use registry::{RuleKind, RuleSet};
pub use scanner::FileScanner;

/// Errors produced by the excavator crate.
///
/// Per-file parse failures are deliberately NOT here: they are soft,
/// reported through the optional parse-error notification, and a failing
/// file simply contributes zero records.
#[derive(Debug, thiserror::Error)]
pub enum ExcavatorError {
    /// The PHP grammar could not be loaded into tree-sitter.
    #[error("grammar load failure: {0}")]
    GrammarLoad(String),

    /// I/O error (file read, mmap).
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A scan root does not exist or is not a readable directory. Distinct
    /// from a root that merely contains no matching files, which is an
    /// empty success.
    #[error("scan root not found or unreadable: {0}")]
    RootNotFound(std::path::PathBuf),

    /// Byte range exceeds u32::MAX (file too large for tree-sitter).
    #[error("byte range overflow: file size exceeds 4GB limit")]
    ByteRangeOverflow,
}
