//! The finding value type shared by every rule.
//!
//! A [`MatchRecord`] is created exactly once — by a matcher, at the moment a
//! pattern is confirmed during traversal — then stamped with file identity by
//! the scanner and never mutated again.

use crate::Severity;
use serde::Serialize;
use serde_json::Value;

/// A single confirmed finding: one deprecated/removed API usage site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    /// Path relative to the scanned root (UTF-8, forward slashes).
    pub relative_path: String,

    /// Absolute path on the filesystem (UTF-8, forward slashes).
    pub absolute_path: String,

    /// 1-based source line of the matched site; `0` = unknown/file-level.
    pub line: u32,

    /// Confidence classification. Defaults to [`Severity::Strong`] when the
    /// producing rule left it unspecified.
    pub severity: Severity,

    /// Human-readable description of the issue.
    pub message: String,

    /// Identifier of the rule that produced this record,
    /// e.g. `"MethodCallStaticMatcher"`.
    pub rule_id: String,

    /// Ordered documentation references (changelog entries) for the rule.
    pub docs: Vec<String>,
}

impl MatchRecord {
    /// Returns `true` for a certain finding.
    pub fn is_strong(&self) -> bool {
        self.severity == Severity::Strong
    }

    /// Returns `true` for a heuristic finding.
    pub fn is_weak(&self) -> bool {
        self.severity == Severity::Weak
    }

    /// Human-readable rule category derived from the rule identifier.
    ///
    /// Strips the conventional `Matcher` suffix and inserts a space at every
    /// lowercase→uppercase boundary.
    ///
    /// # Examples
    /// ```
    /// # use common::record::readable_category;
    /// assert_eq!(readable_category("MethodCallStaticMatcher"), "Method Call Static");
    /// ```
    pub fn category(&self) -> String {
        readable_category(&self.rule_id)
    }
}

/// Derives a readable category name from a rule identifier.
///
/// `"ArrayDimensionMatcher"` → `"Array Dimension"`. Identifiers without the
/// `Matcher` suffix are split as-is.
pub fn readable_category(rule_id: &str) -> String {
    let base = rule_id.strip_suffix("Matcher").unwrap_or(rule_id);
    let mut out = String::with_capacity(base.len() + 4);
    let mut prev_lower = false;
    for c in base.chars() {
        if prev_lower && c.is_ascii_uppercase() {
            out.push(' ');
        }
        out.push(c);
        prev_lower = c.is_ascii_lowercase();
    }
    out
}

/// Filters a raw JSON list down to its string entries.
///
/// Rule payloads come from hand-maintained JSON files; documentation lists
/// occasionally contain stray numbers or nulls. Only strings survive, in
/// original relative order, duplicates permitted.
pub fn docs_from_raw(raw: &[Value]) -> Vec<String> {
    raw.iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_record(rule_id: &str, severity: Severity) -> MatchRecord {
        MatchRecord {
            relative_path: "Classes/Service/Thing.php".into(),
            absolute_path: "/project/Classes/Service/Thing.php".into(),
            line: 42,
            severity,
            message: "Call to deprecated method".into(),
            rule_id: rule_id.into(),
            docs: vec!["Deprecation-82425.rst".into()],
        }
    }

    #[test]
    fn test_strong_weak_accessors() {
        assert!(make_record("MethodCallMatcher", Severity::Strong).is_strong());
        assert!(make_record("MethodCallMatcher", Severity::Weak).is_weak());
    }

    #[test]
    fn test_category_strips_suffix_and_splits_camel_case() {
        let record = make_record("MethodCallStaticMatcher", Severity::Strong);
        assert_eq!(record.category(), "Method Call Static");
    }

    #[test]
    fn test_category_single_word() {
        assert_eq!(readable_category("ConstantMatcher"), "Constant");
    }

    #[test]
    fn test_category_without_suffix() {
        assert_eq!(readable_category("ArrayDimension"), "Array Dimension");
    }

    #[test]
    fn test_docs_from_raw_keeps_strings_in_order() {
        let raw = vec![
            json!("Valid.rst"),
            json!(123),
            json!(null),
            json!("Another.rst"),
            json!(["nested"]),
        ];
        assert_eq!(docs_from_raw(&raw), vec!["Valid.rst", "Another.rst"]);
    }

    #[test]
    fn test_docs_from_raw_permits_duplicates() {
        let raw = vec![json!("Same.rst"), json!("Same.rst")];
        assert_eq!(docs_from_raw(&raw), vec!["Same.rst", "Same.rst"]);
    }

    #[test]
    fn test_docs_from_raw_empty() {
        assert!(docs_from_raw(&[]).is_empty());
    }
}
