//! Class name references: `new Fqcn`, `extends`/`implements`, `instanceof`,
//! type hints, static scopes, `use` imports and PHP 8 attributes.
//!
//! A name node only counts when it sits in a class-reference position;
//! method names, constant fetches and namespace segments are someone else's
//! business. Resolution through the import table makes every hit strong.

use std::collections::HashMap;

use common::Severity;
use serde_json::Value;
use tree_sitter::Node;

use super::{name_keyed, node_line, ApiChange, Matcher, RawMatch, VisitCtx};
use crate::names::node_text;

pub struct ClassNameMatcher {
    candidates: HashMap<String, ApiChange>,
    matches: Vec<RawMatch>,
}

impl ClassNameMatcher {
    pub fn new(payload: &Value) -> Self {
        Self {
            candidates: name_keyed(payload),
            matches: Vec::new(),
        }
    }
}

impl Matcher for ClassNameMatcher {
    fn rule_id(&self) -> &'static str {
        "ClassNameMatcher"
    }

    fn visit(&mut self, node: &Node<'_>, ctx: &VisitCtx<'_>) {
        if !matches!(node.kind(), "name" | "qualified_name") {
            return;
        }
        let Some(parent) = node.parent() else {
            return;
        };
        if !is_class_reference_position(node, &parent) {
            return;
        }

        let raw = node_text(node, ctx.source);
        // `use` paths are absolute by definition; everything else resolves
        // through the alias table.
        let resolved = if parent.kind() == "namespace_use_clause" {
            raw.trim_start_matches('\\').to_string()
        } else {
            ctx.names.resolve_class(raw)
        };

        if let Some(entry) = self.candidates.get(&resolved) {
            self.matches.push(entry.raw_match(
                node_line(node),
                Some(Severity::Strong),
                format!("Reference to deprecated class {resolved}"),
            ));
        }
    }

    fn take_matches(&mut self) -> Vec<RawMatch> {
        std::mem::take(&mut self.matches)
    }
}

/// Whether `node` occupies a class-reference slot of `parent`.
fn is_class_reference_position(node: &Node<'_>, parent: &Node<'_>) -> bool {
    match parent.kind() {
        "object_creation_expression"
        | "base_clause"
        | "class_interface_clause"
        | "named_type"
        | "namespace_use_clause"
        | "use_declaration"
        | "attribute" => true,
        // Static scopes: only the scope side, never the member side.
        "scoped_call_expression" | "scoped_property_access_expression" => parent
            .child_by_field_name("scope")
            .map(|scope| scope.id() == node.id())
            .unwrap_or(false),
        "class_constant_access_expression" => parent
            .named_child(0)
            .map(|scope| scope.id() == node.id())
            .unwrap_or(false),
        "binary_expression" => {
            let mut cursor = parent.walk();
            let has_instanceof = parent.children(&mut cursor).any(|c| c.kind() == "instanceof");
            has_instanceof
        }
        _ => false,
    }
}
