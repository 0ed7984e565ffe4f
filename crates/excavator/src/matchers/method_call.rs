//! Instance method calls: `$object->deprecatedMethod(...)`.
//!
//! The receiver's type is not statically knowable, so every hit is a weak
//! match by nature: the method name matches a configured
//! `Fqcn->method` target and the argument count is plausible for the old
//! signature.

use std::collections::HashMap;

use common::Severity;
use serde_json::Value;
use tree_sitter::Node;

use super::{
    call_argument_count, member_keyed, member_name, node_line, split_instance_key, ApiChange,
    Matcher, RawMatch, VisitCtx,
};

pub struct MethodCallMatcher {
    candidates: HashMap<String, Vec<(String, ApiChange)>>,
    matches: Vec<RawMatch>,
}

impl MethodCallMatcher {
    pub fn new(payload: &Value) -> Self {
        Self {
            candidates: member_keyed(payload, split_instance_key),
            matches: Vec::new(),
        }
    }
}

impl Matcher for MethodCallMatcher {
    fn rule_id(&self) -> &'static str {
        "MethodCallMatcher"
    }

    fn visit(&mut self, node: &Node<'_>, ctx: &VisitCtx<'_>) {
        if node.kind() != "member_call_expression" {
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

        for (class, entry) in candidates {
            if entry.arg_count_plausible(count, unpacking) {
                self.matches.push(entry.raw_match(
                    node_line(node),
                    Some(Severity::Weak),
                    format!("Call to deprecated method {class}->{method}()"),
                ));
            }
        }
    }

    fn take_matches(&mut self) -> Vec<RawMatch> {
        std::mem::take(&mut self.matches)
    }
}
