//! Constructor argument-count changes: `new Fqcn(...)` with a signature
//! that dropped trailing parameters or grew new mandatory ones.
//!
//! The class name is resolved, so both directions are strong.

use std::collections::HashMap;

use common::Severity;
use serde_json::Value;
use tree_sitter::Node;

use super::{call_argument_count, name_keyed, node_line, ApiChange, Matcher, RawMatch, VisitCtx};
use crate::names::node_text;

pub struct ConstructorArgumentMatcher {
    candidates: HashMap<String, ApiChange>,
    matches: Vec<RawMatch>,
}

impl ConstructorArgumentMatcher {
    pub fn new(payload: &Value) -> Self {
        Self {
            candidates: name_keyed(payload),
            matches: Vec::new(),
        }
    }
}

impl Matcher for ConstructorArgumentMatcher {
    fn rule_id(&self) -> &'static str {
        "ConstructorArgumentMatcher"
    }

    fn visit(&mut self, node: &Node<'_>, ctx: &VisitCtx<'_>) {
        if node.kind() != "object_creation_expression" {
            return;
        }
        let Some(class_node) = first_class_child(node) else {
            return;
        };
        let resolved = ctx.names.resolve_class(node_text(&class_node, ctx.source));
        let Some(entry) = self.candidates.get(&resolved) else {
            return;
        };

        // `new Foo;` carries no argument list at all.
        let (count, unpacking) = call_argument_count(node, ctx.source).unwrap_or((0, false));
        if unpacking {
            return;
        }

        let line = node_line(node);
        if let Some(maximum) = entry.maximum_number_of_arguments {
            if count > maximum {
                self.matches.push(entry.raw_match(
                    line,
                    Some(Severity::Strong),
                    format!(
                        "new {resolved}() passes {count} arguments, constructor now takes at most {maximum}"
                    ),
                ));
                return;
            }
        }
        if count < entry.number_of_mandatory_arguments {
            self.matches.push(entry.raw_match(
                line,
                Some(Severity::Strong),
                format!(
                    "new {resolved}() passes {count} arguments, constructor now requires at least {}",
                    entry.number_of_mandatory_arguments
                ),
            ));
        }
    }

    fn take_matches(&mut self) -> Vec<RawMatch> {
        std::mem::take(&mut self.matches)
    }
}

/// First name-like child of a `new` expression (the instantiated class).
fn first_class_child<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|child| matches!(child.kind(), "name" | "qualified_name"));
    found
}
