//! Array key usage: plain subscripts and `$GLOBALS` entries.
//!
//! `ArrayDimensionMatcher` flags any `$something['key']` with a configured
//! key — that is pure key-collision heuristics, so weak.
//! `ArrayGlobalMatcher` flags `$GLOBALS['key']`, where the container is
//! known exactly, so strong.

use std::collections::HashMap;

use common::Severity;
use serde_json::Value;
use tree_sitter::Node;

use super::{
    name_keyed, node_line, string_literal_text, ApiChange, Matcher, RawMatch, VisitCtx,
};
use crate::names::node_text;

/// Extracts `(container node, literal key)` from a subscript expression.
fn subscript_parts<'t>(
    node: &Node<'t>,
    source: &[u8],
) -> Option<(Node<'t>, String)> {
    if node.kind() != "subscript_expression" {
        return None;
    }
    let object = node.named_child(0)?;
    let index = node.named_child(1)?;
    let key = string_literal_text(&index, source)?;
    Some((object, key))
}

pub struct ArrayDimensionMatcher {
    candidates: HashMap<String, ApiChange>,
    matches: Vec<RawMatch>,
}

impl ArrayDimensionMatcher {
    pub fn new(payload: &Value) -> Self {
        Self {
            candidates: name_keyed(payload),
            matches: Vec::new(),
        }
    }
}

impl Matcher for ArrayDimensionMatcher {
    fn rule_id(&self) -> &'static str {
        "ArrayDimensionMatcher"
    }

    fn visit(&mut self, node: &Node<'_>, ctx: &VisitCtx<'_>) {
        let Some((_, key)) = subscript_parts(node, ctx.source) else {
            return;
        };
        if let Some(entry) = self.candidates.get(&key) {
            self.matches.push(entry.raw_match(
                node_line(node),
                Some(Severity::Weak),
                format!("Access to deprecated array key '{key}'"),
            ));
        }
    }

    fn take_matches(&mut self) -> Vec<RawMatch> {
        std::mem::take(&mut self.matches)
    }
}

pub struct ArrayGlobalMatcher {
    candidates: HashMap<String, ApiChange>,
    matches: Vec<RawMatch>,
}

impl ArrayGlobalMatcher {
    pub fn new(payload: &Value) -> Self {
        Self {
            candidates: name_keyed(payload),
            matches: Vec::new(),
        }
    }
}

impl Matcher for ArrayGlobalMatcher {
    fn rule_id(&self) -> &'static str {
        "ArrayGlobalMatcher"
    }

    fn visit(&mut self, node: &Node<'_>, ctx: &VisitCtx<'_>) {
        let Some((object, key)) = subscript_parts(node, ctx.source) else {
            return;
        };
        if object.kind() != "variable_name" || node_text(&object, ctx.source) != "$GLOBALS" {
            return;
        }
        if let Some(entry) = self.candidates.get(&key) {
            self.matches.push(entry.raw_match(
                node_line(node),
                Some(Severity::Strong),
                format!("Access to removed global array key $GLOBALS['{key}']"),
            ));
        }
    }

    fn take_matches(&mut self) -> Vec<RawMatch> {
        std::mem::take(&mut self.matches)
    }
}
