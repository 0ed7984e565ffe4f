//! Static method calls: `Fqcn::deprecatedMethod(...)`.
//!
//! When the scope is a literal class name it resolves to a fully-qualified
//! name and the match is strong. `self::`, `static::`, `parent::` and
//! `$variable::` scopes cannot be resolved, so a matching method name there
//! degrades to weak.

use std::collections::HashMap;

use common::Severity;
use serde_json::Value;
use tree_sitter::Node;

use super::{
    call_argument_count, member_keyed, member_name, node_line, split_static_key, ApiChange,
    Matcher, RawMatch, VisitCtx,
};
use crate::names::node_text;

pub struct MethodCallStaticMatcher {
    candidates: HashMap<String, Vec<(String, ApiChange)>>,
    matches: Vec<RawMatch>,
}

impl MethodCallStaticMatcher {
    pub fn new(payload: &Value) -> Self {
        Self {
            candidates: member_keyed(payload, split_static_key),
            matches: Vec::new(),
        }
    }
}

impl Matcher for MethodCallStaticMatcher {
    fn rule_id(&self) -> &'static str {
        "MethodCallStaticMatcher"
    }

    fn visit(&mut self, node: &Node<'_>, ctx: &VisitCtx<'_>) {
        if node.kind() != "scoped_call_expression" {
            return;
        }
        let Some(method) = member_name(node, ctx.source) else {
            return;
        };
        let Some(candidates) = self.candidates.get(method) else {
            return;
        };
        let Some((count, unpacking)) = call_argument_count(node, ctx.source) else {
            return;
        };

        let resolved = node
            .child_by_field_name("scope")
            .filter(|scope| matches!(scope.kind(), "name" | "qualified_name"))
            .map(|scope| ctx.names.resolve_class(node_text(&scope, ctx.source)));

        for (class, entry) in candidates {
            if !entry.arg_count_plausible(count, unpacking) {
                continue;
            }
            match &resolved {
                Some(scope) if scope == class => {
                    self.matches.push(entry.raw_match(
                        node_line(node),
                        Some(Severity::Strong),
                        format!("Call to deprecated static method {class}::{method}()"),
                    ));
                }
                Some(_) => {} // Resolved to a different class: no finding.
                None => {
                    self.matches.push(entry.raw_match(
                        node_line(node),
                        Some(Severity::Weak),
                        format!("Call to deprecated static method {class}::{method}()"),
                    ));
                }
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
            "Core\\Utility\\GeneralUtility::loadTca": {
                "numberOfMandatoryArguments": 1,
                "maximumNumberOfArguments": 1
            }
        })
    }

    #[test]
    fn test_resolved_fqcn_is_strong() {
        let mut matcher = MethodCallStaticMatcher::new(&payload());
        let matches = collect_matches(
            &mut matcher,
            "<?php use Core\\Utility\\GeneralUtility;\nGeneralUtility::loadTca('table');\n",
        );
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].severity, Some(Severity::Strong));
        assert_eq!(matches[0].line, 2);
    }

    #[test]
    fn test_fully_qualified_scope_is_strong() {
        let mut matcher = MethodCallStaticMatcher::new(&payload());
        let matches = collect_matches(
            &mut matcher,
            "<?php \\Core\\Utility\\GeneralUtility::loadTca('table');",
        );
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].severity, Some(Severity::Strong));
    }

    #[test]
    fn test_self_scope_degrades_to_weak() {
        let mut matcher = MethodCallStaticMatcher::new(&payload());
        let matches = collect_matches(
            &mut matcher,
            "<?php class A { function f() { self::loadTca('t'); } }",
        );
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].severity, Some(Severity::Weak));
    }

    #[test]
    fn test_variable_scope_degrades_to_weak() {
        let mut matcher = MethodCallStaticMatcher::new(&payload());
        let matches = collect_matches(&mut matcher, "<?php $cls::loadTca('t');");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].severity, Some(Severity::Weak));
    }

    #[test]
    fn test_different_resolved_class_no_finding() {
        let mut matcher = MethodCallStaticMatcher::new(&payload());
        let matches = collect_matches(
            &mut matcher,
            "<?php use Other\\Thing; Thing::loadTca('t');",
        );
        assert!(matches.is_empty());
    }

    #[test]
    fn test_argument_count_disqualifies() {
        let mut matcher = MethodCallStaticMatcher::new(&payload());
        let matches = collect_matches(
            &mut matcher,
            "<?php \\Core\\Utility\\GeneralUtility::loadTca();",
        );
        assert!(matches.is_empty());
    }
}
