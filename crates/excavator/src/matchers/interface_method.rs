//! Interface signature changes: a method *declaration* that still carries
//! parameters an interface has since dropped.
//!
//! Implementations are matched by method name only — whether the enclosing
//! class actually implements the changed interface is not resolved across
//! files — so every hit is weak.

use std::collections::HashMap;

use common::Severity;
use serde_json::Value;
use tree_sitter::Node;

use super::{member_name, node_line, parse_entries, ApiChange, Matcher, RawMatch, VisitCtx};

pub struct InterfaceMethodChangedMatcher {
    /// method name → entry (keys may be `Fqcn->method` or bare `method`).
    candidates: HashMap<String, ApiChange>,
    matches: Vec<RawMatch>,
}

impl InterfaceMethodChangedMatcher {
    pub fn new(payload: &Value) -> Self {
        let candidates = parse_entries(payload)
            .into_iter()
            .map(|(key, entry)| {
                let method = key
                    .rsplit_once("->")
                    .map(|(_, method)| method.to_string())
                    .unwrap_or(key);
                (method, entry)
            })
            .collect();
        Self {
            candidates,
            matches: Vec::new(),
        }
    }
}

impl Matcher for InterfaceMethodChangedMatcher {
    fn rule_id(&self) -> &'static str {
        "InterfaceMethodChangedMatcher"
    }

    fn visit(&mut self, node: &Node<'_>, ctx: &VisitCtx<'_>) {
        if node.kind() != "method_declaration" {
            return;
        }
        let Some(method) = member_name(node, ctx.source) else {
            return;
        };
        let Some(entry) = self.candidates.get(method) else {
            return;
        };
        let Some(maximum) = entry.maximum_number_of_arguments else {
            return;
        };

        let declared = declared_parameter_count(node);
        if declared > maximum {
            self.matches.push(entry.raw_match(
                node_line(node),
                Some(Severity::Weak),
                format!(
                    "Method {method}() declares {declared} parameters, the interface signature now allows {maximum}"
                ),
            ));
        }
    }

    fn take_matches(&mut self) -> Vec<RawMatch> {
        std::mem::take(&mut self.matches)
    }
}

fn declared_parameter_count(node: &Node<'_>) -> usize {
    let Some(parameters) = node.child_by_field_name("parameters") else {
        return 0;
    };
    let mut cursor = parameters.walk();
    parameters
        .named_children(&mut cursor)
        .filter(|child| {
            matches!(
                child.kind(),
                "simple_parameter" | "variadic_parameter" | "property_promotion_parameter"
            )
        })
        .count()
}
