//! Static-call argument-count changes: the `Fqcn::method(...)` forms of the
//! dropped/required families.
//!
//! A resolved literal scope makes the finding strong; `self::`, `static::`,
//! `parent::` and `$variable::` scopes degrade to weak.

use std::collections::HashMap;

use common::Severity;
use serde_json::Value;
use tree_sitter::Node;

use super::{
    call_argument_count, member_keyed, member_name, node_line, split_static_key, ApiChange,
    Matcher, RawMatch, VisitCtx,
};
use crate::names::node_text;

type Candidates = HashMap<String, Vec<(String, ApiChange)>>;

fn visit_static_call(
    candidates: &Candidates,
    matches: &mut Vec<RawMatch>,
    node: &Node<'_>,
    ctx: &VisitCtx<'_>,
    check: impl Fn(&str, &str, &ApiChange, usize) -> Option<String>,
) {
    if node.kind() != "scoped_call_expression" {
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

    let resolved = node
        .child_by_field_name("scope")
        .filter(|scope| matches!(scope.kind(), "name" | "qualified_name"))
        .map(|scope| ctx.names.resolve_class(node_text(&scope, ctx.source)));

    for (class, entry) in entries {
        let severity = match &resolved {
            Some(scope) if scope == class => Severity::Strong,
            Some(_) => continue,
            None => Severity::Weak,
        };
        if let Some(message) = check(class, method, entry, count) {
            matches.push(entry.raw_match(node_line(node), Some(severity), message));
        }
    }
}

pub struct MethodArgumentDroppedStaticMatcher {
    candidates: Candidates,
    matches: Vec<RawMatch>,
}

impl MethodArgumentDroppedStaticMatcher {
    pub fn new(payload: &Value) -> Self {
        Self {
            candidates: member_keyed(payload, split_static_key),
            matches: Vec::new(),
        }
    }
}

impl Matcher for MethodArgumentDroppedStaticMatcher {
    fn rule_id(&self) -> &'static str {
        "MethodArgumentDroppedStaticMatcher"
    }

    fn visit(&mut self, node: &Node<'_>, ctx: &VisitCtx<'_>) {
        visit_static_call(
            &self.candidates,
            &mut self.matches,
            node,
            ctx,
            |class, method, entry, count| {
                let maximum = entry.maximum_number_of_arguments?;
                (count > maximum).then(|| {
                    format!(
                        "{class}::{method}() called with {count} arguments, now takes at most {maximum}"
                    )
                })
            },
        );
    }

    fn take_matches(&mut self) -> Vec<RawMatch> {
        std::mem::take(&mut self.matches)
    }
}

pub struct MethodArgumentRequiredStaticMatcher {
    candidates: Candidates,
    matches: Vec<RawMatch>,
}

impl MethodArgumentRequiredStaticMatcher {
    pub fn new(payload: &Value) -> Self {
        Self {
            candidates: member_keyed(payload, split_static_key),
            matches: Vec::new(),
        }
    }
}

impl Matcher for MethodArgumentRequiredStaticMatcher {
    fn rule_id(&self) -> &'static str {
        "MethodArgumentRequiredStaticMatcher"
    }

    fn visit(&mut self, node: &Node<'_>, ctx: &VisitCtx<'_>) {
        visit_static_call(
            &self.candidates,
            &mut self.matches,
            node,
            ctx,
            |class, method, entry, count| {
                let mandatory = entry.number_of_mandatory_arguments;
                (count < mandatory).then(|| {
                    format!(
                        "{class}::{method}() called with {count} arguments, now requires at least {mandatory}"
                    )
                })
            },
        );
    }

    fn take_matches(&mut self) -> Vec<RawMatch> {
        std::mem::take(&mut self.matches)
    }
}
