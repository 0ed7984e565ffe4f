//! Instance-call argument-count changes: methods that dropped trailing
//! parameters, grew new mandatory ones, or stopped reading a position.
//!
//! Like all instance-call matching the receiver type is unknowable, so the
//! whole family is weak.

use std::collections::HashMap;

use common::Severity;
use serde_json::Value;
use tree_sitter::Node;

use super::{
    call_argument_count, member_keyed, member_name, node_line, split_instance_key, ApiChange,
    Matcher, RawMatch, VisitCtx,
};

type Candidates = HashMap<String, Vec<(String, ApiChange)>>;

/// Looks up an instance call and hands each configured candidate to `check`.
fn visit_instance_call(
    candidates: &Candidates,
    matches: &mut Vec<RawMatch>,
    node: &Node<'_>,
    ctx: &VisitCtx<'_>,
    check: impl Fn(&str, &str, &ApiChange, usize) -> Option<String>,
) {
    if node.kind() != "member_call_expression" {
        return;
    }
    let Some(method) = member_name(node, ctx.source) else {
        return;
    };
    let Some(entries) = candidates.get(method) else {
        return;
    };
    let Some((count, unpacking)) = call_argument_count(node, ctx.source) else {
        return;
    };
    if unpacking {
        return;
    }

    for (class, entry) in entries {
        if let Some(message) = check(class, method, entry, count) {
            matches.push(entry.raw_match(node_line(node), Some(Severity::Weak), message));
        }
    }
}

pub struct MethodArgumentDroppedMatcher {
    candidates: Candidates,
    matches: Vec<RawMatch>,
}

impl MethodArgumentDroppedMatcher {
    pub fn new(payload: &Value) -> Self {
        Self {
            candidates: member_keyed(payload, split_instance_key),
            matches: Vec::new(),
        }
    }
}

impl Matcher for MethodArgumentDroppedMatcher {
    fn rule_id(&self) -> &'static str {
        "MethodArgumentDroppedMatcher"
    }

    fn visit(&mut self, node: &Node<'_>, ctx: &VisitCtx<'_>) {
        visit_instance_call(
            &self.candidates,
            &mut self.matches,
            node,
            ctx,
            |class, method, entry, count| {
                let maximum = entry.maximum_number_of_arguments?;
                (count > maximum).then(|| {
                    format!(
                        "{class}->{method}() called with {count} arguments, now takes at most {maximum}"
                    )
                })
            },
        );
    }

    fn take_matches(&mut self) -> Vec<RawMatch> {
        std::mem::take(&mut self.matches)
    }
}

pub struct MethodArgumentRequiredMatcher {
    candidates: Candidates,
    matches: Vec<RawMatch>,
}

impl MethodArgumentRequiredMatcher {
    pub fn new(payload: &Value) -> Self {
        Self {
            candidates: member_keyed(payload, split_instance_key),
            matches: Vec::new(),
        }
    }
}

impl Matcher for MethodArgumentRequiredMatcher {
    fn rule_id(&self) -> &'static str {
        "MethodArgumentRequiredMatcher"
    }

    fn visit(&mut self, node: &Node<'_>, ctx: &VisitCtx<'_>) {
        visit_instance_call(
            &self.candidates,
            &mut self.matches,
            node,
            ctx,
            |class, method, entry, count| {
                let mandatory = entry.number_of_mandatory_arguments;
                (count < mandatory).then(|| {
                    format!(
                        "{class}->{method}() called with {count} arguments, now requires at least {mandatory}"
                    )
                })
            },
        );
    }

    fn take_matches(&mut self) -> Vec<RawMatch> {
        std::mem::take(&mut self.matches)
    }
}

pub struct MethodArgumentUnusedMatcher {
    candidates: Candidates,
    matches: Vec<RawMatch>,
}

impl MethodArgumentUnusedMatcher {
    pub fn new(payload: &Value) -> Self {
        Self {
            candidates: member_keyed(payload, split_instance_key),
            matches: Vec::new(),
        }
    }
}

impl Matcher for MethodArgumentUnusedMatcher {
    fn rule_id(&self) -> &'static str {
        "MethodArgumentUnusedMatcher"
    }

    fn visit(&mut self, node: &Node<'_>, ctx: &VisitCtx<'_>) {
        visit_instance_call(
            &self.candidates,
            &mut self.matches,
            node,
            ctx,
            |class, method, entry, count| {
                let hit: Vec<String> = entry
                    .unused_argument_numbers
                    .iter()
                    .filter(|&&position| position > 0 && count >= position)
                    .map(|position| position.to_string())
                    .collect();
                (!hit.is_empty()).then(|| {
                    format!(
                        "{class}->{method}() still passes ignored argument position(s) {}",
                        hit.join(", ")
                    )
                })
            },
        );
    }

    fn take_matches(&mut self) -> Vec<RawMatch> {
        std::mem::take(&mut self.matches)
    }
}
