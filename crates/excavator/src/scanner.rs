//! The per-file scan contract: parse once, two passes, every matcher rides
//! the same walk.
//!
//! Pipeline per file: `parse → resolve names → collect statistics →
//! (if not ignored) dispatch every node to every matcher → stamp records`.
//! Matchers never see file identity; the scanner injects relative path,
//! absolute path and rule id when collecting. Severity left unspecified by
//! a rule defaults to strong at this single stamping point.

use std::path::Path;

use common::{MatchRecord, Severity};
use tracing::debug;

use crate::matchers::VisitCtx;
use crate::names::NameContext;
use crate::parser::{map_file, ParserHost};
use crate::registry::RuleSet;
use crate::stats::FileStatistics;
use crate::traversal::walk;
use crate::ExcavatorError;

/// Callback invoked on a per-file parse failure: `(file identity, detail)`.
pub type ParseErrorFn<'a> = dyn FnMut(&str, &str) + 'a;

/// Scans one file at a time against a shared rule set.
pub struct FileScanner<'rules> {
    rules: &'rules RuleSet,
    host: ParserHost,
}

impl<'rules> FileScanner<'rules> {
    pub fn new(rules: &'rules RuleSet) -> Result<Self, ExcavatorError> {
        Ok(Self {
            rules,
            host: ParserHost::new()?,
        })
    }

    /// Scans a single file and returns its records in matcher-registration
    /// order, then within-matcher emission order.
    ///
    /// Parse failures are soft: the optional notification fires once and
    /// the file contributes zero records. Ignored files return zero records
    /// without any matcher running.
    ///
    /// # Errors
    /// Only I/O-level failures (unreadable file, oversized file) are
    /// returned; the orchestrator treats those as per-file soft failures
    /// too.
    pub fn scan_file(
        &mut self,
        relative_path: &str,
        absolute_path: &Path,
        mut on_parse_error: Option<&mut ParseErrorFn<'_>>,
    ) -> Result<Vec<MatchRecord>, ExcavatorError> {
        let buffer = map_file(absolute_path)?;
        let source = buffer.bytes();
        if source.is_empty() {
            return Ok(Vec::new());
        }

        let tree = match self.host.parse_source(source) {
            Ok(tree) => tree,
            Err(failure) => {
                debug!(file = relative_path, "parse failure: {}", failure.message);
                if let Some(callback) = on_parse_error.as_mut() {
                    callback(relative_path, &failure.message);
                }
                return Ok(Vec::new());
            }
        };

        // Pass 1: resolve names, collect statistics, decide the ignore gate.
        let names = NameContext::collect(&tree, source);
        let statistics = FileStatistics::collect(&tree, source);
        if statistics.is_file_ignored() {
            debug!(file = relative_path, "file ignored");
            return Ok(Vec::new());
        }

        // Pass 2: one walk, every node to every matcher.
        let mut matchers = self.rules.build_matchers();
        let ctx = VisitCtx {
            source,
            names: &names,
        };
        walk(tree.root_node(), |node| {
            for matcher in matchers.iter_mut() {
                matcher.visit(&node, &ctx);
            }
        });

        // Collect and stamp.
        let absolute = display_path(absolute_path);
        let mut records = Vec::new();
        for matcher in matchers.iter_mut() {
            let rule_id = matcher.rule_id();
            for raw in matcher.take_matches() {
                if statistics.is_line_ignored(raw.line) {
                    continue;
                }
                records.push(MatchRecord {
                    relative_path: relative_path.to_string(),
                    absolute_path: absolute.clone(),
                    line: raw.line,
                    severity: raw.severity.unwrap_or(Severity::Strong),
                    message: raw.message,
                    rule_id: rule_id.to_string(),
                    docs: raw.docs,
                });
            }
        }
        Ok(records)
    }
}

/// UTF-8 path text with forward slashes.
pub(crate) fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
