//! Free function calls: `deprecatedFunction(...)`.
//!
//! Function names resolve through the `use function` alias table with a
//! global-space fallback, so a hit is a strong match.

use std::collections::HashMap;

use common::Severity;
use serde_json::Value;
use tree_sitter::Node;

use super::{call_argument_count, name_keyed, node_line, ApiChange, Matcher, RawMatch, VisitCtx};
use crate::names::node_text;

pub struct FunctionCallMatcher {
    candidates: HashMap<String, ApiChange>,
    matches: Vec<RawMatch>,
}

impl FunctionCallMatcher {
    pub fn new(payload: &Value) -> Self {
        Self {
            candidates: name_keyed(payload),
            matches: Vec::new(),
        }
    }
}

impl Matcher for FunctionCallMatcher {
    fn rule_id(&self) -> &'static str {
        "FunctionCallMatcher"
    }

    fn visit(&mut self, node: &Node<'_>, ctx: &VisitCtx<'_>) {
        if node.kind() != "function_call_expression" {
            return;
        }
        let Some(function) = node
            .child_by_field_name("function")
            .filter(|f| matches!(f.kind(), "name" | "qualified_name"))
        else {
            return;
        };

        let resolved = ctx
            .names
            .resolve_function(node_text(&function, ctx.source));
        let Some(entry) = self.candidates.get(&resolved) else {
            return;
        };
        let Some((count, unpacking)) = call_argument_count(node, ctx.source) else {
            return;
        };
        if !entry.arg_count_plausible(count, unpacking) {
            return;
        }

        self.matches.push(entry.raw_match(
            node_line(node),
            Some(Severity::Strong),
            format!("Call to deprecated function {resolved}()"),
        ));
    }

    fn take_matches(&mut self) -> Vec<RawMatch> {
        std::mem::take(&mut self.matches)
    }
}
