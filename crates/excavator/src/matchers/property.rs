//! Property access changes: visibility tightened, renamed, or moved away
//! from static access.
//!
//! Instance property receivers are unknowable, so the protected/public
//! families are weak. Static property access names its scope, so the
//! exists-static family is strong when the scope resolves.

use std::collections::HashMap;

use common::Severity;
use serde_json::Value;
use tree_sitter::Node;

use super::{
    member_keyed, member_name, node_line, split_instance_key, split_static_key, ApiChange,
    Matcher, RawMatch, VisitCtx,
};
use crate::names::node_text;

type Candidates = HashMap<String, Vec<(String, ApiChange)>>;

/// Member-access scan shared by the protected/public families; they differ
/// only in rule id, message noun, and whether `$this->` receivers count.
fn visit_member_access(
    candidates: &Candidates,
    matches: &mut Vec<RawMatch>,
    node: &Node<'_>,
    ctx: &VisitCtx<'_>,
    this_only: bool,
    noun: &str,
) {
    if node.kind() != "member_access_expression" {
        return;
    }
    // A member *call* wraps member_access differently; calls are the method
    // matchers' business.
    let Some(property) = member_name(node, ctx.source) else {
        return;
    };
    let Some(entries) = candidates.get(property) else {
        return;
    };

    let receiver_is_this = node
        .child_by_field_name("object")
        .map(|object| {
            object.kind() == "variable_name" && node_text(&object, ctx.source) == "$this"
        })
        .unwrap_or(false);
    if this_only != receiver_is_this {
        return;
    }

    for (class, entry) in entries {
        matches.push(entry.raw_match(
            node_line(node),
            Some(Severity::Weak),
            format!("Access to {noun} property {class}->{property}"),
        ));
    }
}

pub struct PropertyProtectedMatcher {
    candidates: Candidates,
    matches: Vec<RawMatch>,
}

impl PropertyProtectedMatcher {
    pub fn new(payload: &Value) -> Self {
        Self {
            candidates: member_keyed(payload, split_instance_key),
            matches: Vec::new(),
        }
    }
}

impl Matcher for PropertyProtectedMatcher {
    fn rule_id(&self) -> &'static str {
        "PropertyProtectedMatcher"
    }

    fn visit(&mut self, node: &Node<'_>, ctx: &VisitCtx<'_>) {
        visit_member_access(
            &self.candidates,
            &mut self.matches,
            node,
            ctx,
            true,
            "now-protected",
        );
    }

    fn take_matches(&mut self) -> Vec<RawMatch> {
        std::mem::take(&mut self.matches)
    }
}

pub struct PropertyPublicMatcher {
    candidates: Candidates,
    matches: Vec<RawMatch>,
}

impl PropertyPublicMatcher {
    pub fn new(payload: &Value) -> Self {
        Self {
            candidates: member_keyed(payload, split_instance_key),
            matches: Vec::new(),
        }
    }
}

impl Matcher for PropertyPublicMatcher {
    fn rule_id(&self) -> &'static str {
        "PropertyPublicMatcher"
    }

    fn visit(&mut self, node: &Node<'_>, ctx: &VisitCtx<'_>) {
        visit_member_access(
            &self.candidates,
            &mut self.matches,
            node,
            ctx,
            false,
            "deprecated public",
        );
    }

    fn take_matches(&mut self) -> Vec<RawMatch> {
        std::mem::take(&mut self.matches)
    }
}

pub struct PropertyExistsStaticMatcher {
    candidates: Candidates,
    matches: Vec<RawMatch>,
}

impl PropertyExistsStaticMatcher {
    pub fn new(payload: &Value) -> Self {
        Self {
            candidates: member_keyed(payload, split_static_key),
            matches: Vec::new(),
        }
    }
}

impl Matcher for PropertyExistsStaticMatcher {
    fn rule_id(&self) -> &'static str {
        "PropertyExistsStaticMatcher"
    }

    fn visit(&mut self, node: &Node<'_>, ctx: &VisitCtx<'_>) {
        if node.kind() != "scoped_property_access_expression" {
            return;
        }
        let Some(property) = node
            .child_by_field_name("name")
            .map(|name| node_text(&name, ctx.source))
            .map(|text| text.trim_start_matches('$').to_string())
        else {
            return;
        };
        let Some(entries) = self.candidates.get(&property) else {
            return;
        };

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
            self.matches.push(entry.raw_match(
                node_line(node),
                Some(severity),
                format!("Static access to instance property {class}::${property}"),
            ));
        }
    }

    fn take_matches(&mut self) -> Vec<RawMatch> {
        std::mem::take(&mut self.matches)
    }
}
