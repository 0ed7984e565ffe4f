//! Class constant fetches: `Fqcn::DEPRECATED_CONST`.
//!
//! Constant access always names its scope literally (dynamic scopes are
//! vanishingly rare), so only resolvable scopes are inspected and every hit
//! is strong. `::class` is a class-name reference, not a constant.

use std::collections::HashMap;

use common::Severity;
use serde_json::Value;
use tree_sitter::Node;

use super::{node_line, parse_entries, split_static_key, ApiChange, Matcher, RawMatch, VisitCtx};
use crate::names::node_text;

pub struct ClassConstantMatcher {
    /// constant name → [(fqcn, entry)]
    candidates: HashMap<String, Vec<(String, ApiChange)>>,
    matches: Vec<RawMatch>,
}

impl ClassConstantMatcher {
    pub fn new(payload: &Value) -> Self {
        let mut candidates: HashMap<String, Vec<(String, ApiChange)>> = HashMap::new();
        for (key, entry) in parse_entries(payload) {
            if let Some((class, constant)) = split_static_key(&key) {
                candidates.entry(constant).or_default().push((class, entry));
            }
        }
        Self {
            candidates,
            matches: Vec::new(),
        }
    }
}

impl Matcher for ClassConstantMatcher {
    fn rule_id(&self) -> &'static str {
        "ClassConstantMatcher"
    }

    fn visit(&mut self, node: &Node<'_>, ctx: &VisitCtx<'_>) {
        if node.kind() != "class_constant_access_expression" {
            return;
        }
        let (Some(scope), Some(constant)) = (
            node.named_child(0),
            node.named_child(node.named_child_count().saturating_sub(1) as u32),
        ) else {
            return;
        };
        if scope.id() == constant.id() || constant.kind() != "name" {
            return;
        }
        let constant_name = node_text(&constant, ctx.source);
        if constant_name == "class" {
            return;
        }
        let Some(candidates) = self.candidates.get(constant_name) else {
            return;
        };
        if !matches!(scope.kind(), "name" | "qualified_name") {
            return;
        }

        let resolved = ctx.names.resolve_class(node_text(&scope, ctx.source));
        for (class, entry) in candidates {
            if &resolved == class {
                self.matches.push(entry.raw_match(
                    node_line(node),
                    Some(Severity::Strong),
                    format!("Use of deprecated class constant {class}::{constant_name}"),
                ));
            }
        }
    }

    fn take_matches(&mut self) -> Vec<RawMatch> {
        std::mem::take(&mut self.matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchers::testutil::collect_matches;
    use serde_json::json;

    fn payload() -> Value {
        json!({
            "Core\\Resource\\File::FILETYPE_IMAGE": { "docs": ["Deprecation-78650.rst"] }
        })
    }

    #[test]
    fn test_resolved_constant_access() {
        let mut matcher = ClassConstantMatcher::new(&payload());
        let matches = collect_matches(
            &mut matcher,
            "<?php use Core\\Resource\\File;\n$t = File::FILETYPE_IMAGE;\n",
        );
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].line, 2);
        assert_eq!(matches[0].severity, Some(Severity::Strong));
    }

    #[test]
    fn test_other_class_same_constant_untouched() {
        let mut matcher = ClassConstantMatcher::new(&payload());
        let matches = collect_matches(&mut matcher, "<?php $t = Other::FILETYPE_IMAGE;");
        assert!(matches.is_empty());
    }

    #[test]
    fn test_class_keyword_excluded() {
        let payload = json!({ "Core\\Resource\\File::class": {} });
        let mut matcher = ClassConstantMatcher::new(&payload);
        let matches = collect_matches(
            &mut matcher,
            "<?php $n = \\Core\\Resource\\File::class;",
        );
        assert!(matches.is_empty());
    }

    #[test]
    fn test_static_method_call_untouched() {
        let mut matcher = ClassConstantMatcher::new(&payload());
        let matches = collect_matches(
            &mut matcher,
            "<?php \\Core\\Resource\\File::FILETYPE_IMAGE();",
        );
        // A call is a scoped_call_expression, not a constant fetch.
        assert!(matches.is_empty());
    }
}
