//! Doc-comment annotations on methods and properties.
//!
//! A doc comment containing a configured annotation counts when the next
//! named sibling is the member kind the rule family covers. The annotation
//! is a literal marker the framework used to act on, so hits are strong.

use std::collections::HashMap;

use common::Severity;
use serde_json::Value;
use tree_sitter::Node;

use super::{contains_annotation, name_keyed, node_line, ApiChange, Matcher, RawMatch, VisitCtx};
use crate::names::node_text;

/// Shared engine for the two annotation rule families.
struct AnnotationScan {
    /// annotation (with leading `@`) → entry.
    candidates: HashMap<String, ApiChange>,
    matches: Vec<RawMatch>,
}

impl AnnotationScan {
    fn new(payload: &Value) -> Self {
        Self {
            candidates: name_keyed(payload),
            matches: Vec::new(),
        }
    }

    fn visit(&mut self, node: &Node<'_>, ctx: &VisitCtx<'_>, member_kind: &str, noun: &str) {
        if node.kind() != "comment" {
            return;
        }
        let text = node_text(node, ctx.source);
        if !text.starts_with("/**") {
            return;
        }
        let Some(member) = node.next_named_sibling() else {
            return;
        };
        if member.kind() != member_kind {
            return;
        }

        for (annotation, entry) in &self.candidates {
            if contains_annotation(text, annotation) {
                self.matches.push(entry.raw_match(
                    node_line(&member),
                    Some(Severity::Strong),
                    format!("Use of deprecated annotation {annotation} on a {noun}"),
                ));
            }
        }
    }
}

pub struct MethodAnnotationMatcher {
    scan: AnnotationScan,
}

impl MethodAnnotationMatcher {
    pub fn new(payload: &Value) -> Self {
        Self {
            scan: AnnotationScan::new(payload),
        }
    }
}

impl Matcher for MethodAnnotationMatcher {
    fn rule_id(&self) -> &'static str {
        "MethodAnnotationMatcher"
    }

    fn visit(&mut self, node: &Node<'_>, ctx: &VisitCtx<'_>) {
        self.scan.visit(node, ctx, "method_declaration", "method");
    }

    fn take_matches(&mut self) -> Vec<RawMatch> {
        std::mem::take(&mut self.scan.matches)
    }
}

pub struct PropertyAnnotationMatcher {
    scan: AnnotationScan,
}

impl PropertyAnnotationMatcher {
    pub fn new(payload: &Value) -> Self {
        Self {
            scan: AnnotationScan::new(payload),
        }
    }
}

impl Matcher for PropertyAnnotationMatcher {
    fn rule_id(&self) -> &'static str {
        "PropertyAnnotationMatcher"
    }

    fn visit(&mut self, node: &Node<'_>, ctx: &VisitCtx<'_>) {
        self.scan.visit(node, ctx, "property_declaration", "property");
    }

    fn take_matches(&mut self) -> Vec<RawMatch> {
        std::mem::take(&mut self.scan.matches)
    }
}
