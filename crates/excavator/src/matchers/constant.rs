//! Bare constant fetches: `DEPRECATED_CONSTANT` in a value position.
//!
//! The severity is deliberately left unspecified here: the scanner's
//! fail-closed default classifies these as strong.

use std::collections::HashMap;

use serde_json::Value;
use tree_sitter::Node;

use super::{name_keyed, node_line, ApiChange, Matcher, RawMatch, VisitCtx};
use crate::names::node_text;

/// Parent kinds in which a bare `name` node is a constant fetch rather than
/// a declaration, a call target or a type.
const VALUE_PARENTS: &[&str] = &[
    "assignment_expression",
    "binary_expression",
    "unary_op_expression",
    "argument",
    "return_statement",
    "echo_statement",
    "array_element_initializer",
    "conditional_expression",
    "parenthesized_expression",
    "expression_statement",
    "match_condition_list",
    "case_statement",
];

pub struct ConstantMatcher {
    candidates: HashMap<String, ApiChange>,
    matches: Vec<RawMatch>,
}

impl ConstantMatcher {
    pub fn new(payload: &Value) -> Self {
        Self {
            candidates: name_keyed(payload),
            matches: Vec::new(),
        }
    }
}

impl Matcher for ConstantMatcher {
    fn rule_id(&self) -> &'static str {
        "ConstantMatcher"
    }

    fn visit(&mut self, node: &Node<'_>, ctx: &VisitCtx<'_>) {
        if node.kind() != "name" {
            return;
        }
        let Some(parent) = node.parent() else {
            return;
        };
        if !VALUE_PARENTS.contains(&parent.kind()) {
            return;
        }
        // `instanceof Foo` right operands are class references.
        if parent.kind() == "binary_expression" {
            let mut cursor = parent.walk();
            if parent.children(&mut cursor).any(|c| c.kind() == "instanceof") {
                return;
            }
        }

        let resolved = ctx.names.resolve_constant(node_text(node, ctx.source));
        if let Some(entry) = self.candidates.get(&resolved) {
            self.matches.push(entry.raw_match(
                node_line(node),
                None,
                format!("Use of deprecated constant {resolved}"),
            ));
        }
    }

    fn take_matches(&mut self) -> Vec<RawMatch> {
        std::mem::take(&mut self.matches)
    }
}
