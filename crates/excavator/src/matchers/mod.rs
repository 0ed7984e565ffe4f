//! The matcher battery: one self-contained visitor per rule family.
//!
//! Every matcher implements the same contract: it is constructed fresh per
//! file from its cached JSON payload, inspects nodes handed to it by the
//! shared pass-2 walk, and accumulates [`RawMatch`] values. A "no match"
//! outcome is simply silence — `visit` never errors, so one rule can never
//! poison another rule's findings or a later node's.
//!
//! Matchers are mutually independent and order-insensitive; the scanner
//! collects their output in registration order and stamps file identity and
//! rule id onto each raw match.
//!
//! Configuration is validated lazily: a malformed entry payload or an
//! unsplittable target key disables only the checks it would have fed,
//! never the matcher's construction.

pub mod annotation;
pub mod arrays;
pub mod class_constant;
pub mod class_name;
pub mod constant;
pub mod constructor_argument;
pub mod function_call;
pub mod interface_method;
pub mod method_argument;
pub mod method_argument_static;
pub mod method_call;
pub mod method_call_static;
pub mod property;

use std::collections::HashMap;

use common::record::docs_from_raw;
use common::Severity;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tree_sitter::Node;

use crate::names::{node_text, NameContext};

/// Read-only per-file context handed to every `visit` call.
pub struct VisitCtx<'a> {
    pub source: &'a [u8],
    pub names: &'a NameContext,
}

/// A finding before the scanner stamps file identity and rule id onto it.
///
/// `severity: None` means the rule left the classification unspecified; the
/// scanner defaults it to [`Severity::Strong`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMatch {
    pub line: u32,
    pub message: String,
    pub severity: Option<Severity>,
    pub docs: Vec<String>,
}

/// One deprecation/removal rule as a reusable tree visitor.
pub trait Matcher {
    /// Stable rule identifier, e.g. `"MethodCallStaticMatcher"`.
    fn rule_id(&self) -> &'static str;

    /// Inspects one node; appends to the internal result list on a
    /// confirmed match.
    fn visit(&mut self, node: &Node<'_>, ctx: &VisitCtx<'_>);

    /// Drains the accumulated matches for the current file.
    fn take_matches(&mut self) -> Vec<RawMatch>;
}

/// One configured API change: the payload attached to a single target key.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiChange {
    /// Calls with fewer arguments than this are considered a different API.
    pub number_of_mandatory_arguments: usize,

    /// Calls with more arguments than this are a different API (or, for the
    /// argument matchers, the finding itself). `None` = unlimited.
    pub maximum_number_of_arguments: Option<usize>,

    /// 1-based argument positions that the new API ignores.
    pub unused_argument_numbers: Vec<usize>,

    /// Explicit severity override for this entry.
    pub indicator: Option<Severity>,

    /// Message override; a per-family message is generated otherwise.
    pub message: Option<String>,

    /// Documentation references; non-string entries are dropped on parse.
    #[serde(deserialize_with = "docs_field")]
    pub docs: Vec<String>,
}

fn docs_field<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    Ok(docs_from_raw(&raw))
}

impl ApiChange {
    /// Builds the raw match for a confirmed site, applying the entry's
    /// message and severity overrides.
    pub(crate) fn raw_match(
        &self,
        line: u32,
        intrinsic: Option<Severity>,
        default_message: String,
    ) -> RawMatch {
        RawMatch {
            line,
            message: self.message.clone().unwrap_or(default_message),
            severity: self.indicator.or(intrinsic),
            docs: self.docs.clone(),
        }
    }

    /// Whether an observed argument count could belong to the configured
    /// API. Argument unpacking defeats static counting, so it always
    /// passes.
    pub(crate) fn arg_count_plausible(&self, count: usize, unpacking: bool) -> bool {
        if unpacking {
            return true;
        }
        count >= self.number_of_mandatory_arguments
            && count <= self.maximum_number_of_arguments.unwrap_or(usize::MAX)
    }
}

/// Parses a rule payload object into `(target key, entry)` pairs.
///
/// Non-object payloads yield nothing; entries that fail to deserialize are
/// skipped individually.
pub(crate) fn parse_entries(payload: &Value) -> Vec<(String, ApiChange)> {
    let Some(object) = payload.as_object() else {
        return Vec::new();
    };
    object
        .iter()
        .filter_map(|(key, value)| {
            serde_json::from_value::<ApiChange>(value.clone())
                .ok()
                .map(|entry| (key.clone(), entry))
        })
        .collect()
}

/// Splits `"Vendor\\Pkg\\Klass->member"` into `(fqcn, member)`.
pub(crate) fn split_instance_key(key: &str) -> Option<(String, String)> {
    let (class, member) = key.split_once("->")?;
    if class.is_empty() || member.is_empty() {
        return None;
    }
    Some((
        class.trim_start_matches('\\').to_string(),
        member.to_string(),
    ))
}

/// Splits `"Vendor\\Pkg\\Klass::member"` into `(fqcn, member)`.
pub(crate) fn split_static_key(key: &str) -> Option<(String, String)> {
    let (class, member) = key.split_once("::")?;
    if class.is_empty() || member.is_empty() {
        return None;
    }
    Some((
        class.trim_start_matches('\\').to_string(),
        member.to_string(),
    ))
}

/// Builds a member-name → candidate list index from a rule payload, using
/// the given key splitter.
pub(crate) fn member_keyed(
    payload: &Value,
    split: fn(&str) -> Option<(String, String)>,
) -> HashMap<String, Vec<(String, ApiChange)>> {
    let mut index: HashMap<String, Vec<(String, ApiChange)>> = HashMap::new();
    for (key, entry) in parse_entries(payload) {
        if let Some((class, member)) = split(&key) {
            index.entry(member).or_default().push((class, entry));
        }
    }
    index
}

/// Builds a plain key → entry index (class names, constants, array keys,
/// annotations).
pub(crate) fn name_keyed(payload: &Value) -> HashMap<String, ApiChange> {
    parse_entries(payload)
        .into_iter()
        .map(|(key, entry)| (key.trim_start_matches('\\').to_string(), entry))
        .collect()
}

/// 1-based line of a node.
pub(crate) fn node_line(node: &Node<'_>) -> u32 {
    node.start_position().row as u32 + 1
}

/// Text of a call's `name` field.
pub(crate) fn member_name<'a>(node: &Node<'_>, source: &'a [u8]) -> Option<&'a str> {
    node.child_by_field_name("name")
        .map(|name| node_text(&name, source))
        .filter(|text| !text.is_empty())
}

/// Counts the arguments of a call-like node.
///
/// Returns `(count, unpacking)`; `None` when the node carries no argument
/// list at all (e.g. `new Foo;`). `unpacking` is set when any argument uses
/// `...$args` spread, which defeats static counting.
pub(crate) fn call_argument_count(node: &Node<'_>, source: &[u8]) -> Option<(usize, bool)> {
    let arguments = node.child_by_field_name("arguments").or_else(|| {
        let mut cursor = node.walk();
        let found = node
            .named_children(&mut cursor)
            .find(|child| child.kind() == "arguments");
        found
    })?;

    let mut count = 0usize;
    let mut unpacking = false;
    let mut cursor = arguments.walk();
    for child in arguments.named_children(&mut cursor) {
        if child.kind() != "argument" {
            continue;
        }
        count += 1;
        if node_text(&child, source).starts_with("...")
            || child
                .named_child(0)
                .map(|inner| inner.kind() == "variadic_unpacking")
                .unwrap_or(false)
        {
            unpacking = true;
        }
    }
    Some((count, unpacking))
}

/// Extracts the literal text of a plain (non-interpolated) string node.
pub(crate) fn string_literal_text(node: &Node<'_>, source: &[u8]) -> Option<String> {
    if !matches!(node.kind(), "string" | "encapsed_string") {
        return None;
    }

    let mut content = String::new();
    let mut has_parts = false;
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "string_content" | "escape_sequence" => {
                has_parts = true;
                content.push_str(node_text(&child, source));
            }
            // Interpolation or embedded expressions: not a plain literal.
            _ => return None,
        }
    }

    if has_parts {
        return Some(content);
    }

    // Empty literal: strip the surrounding quotes.
    let text = node_text(node, source);
    if text.len() >= 2 {
        Some(text[1..text.len() - 1].to_string())
    } else {
        None
    }
}

/// Whether a doc comment contains the annotation as a whole word
/// (`@inject` must not match `@injectAll`).
pub(crate) fn contains_annotation(text: &str, annotation: &str) -> bool {
    let mut search = text;
    while let Some(pos) = search.find(annotation) {
        let after = &search[pos + annotation.len()..];
        let boundary = after
            .chars()
            .next()
            .map(|c| !c.is_ascii_alphanumeric() && c != '_')
            .unwrap_or(true);
        if boundary {
            return true;
        }
        search = &search[pos + annotation.len()..];
    }
    false
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::{Matcher, RawMatch, VisitCtx};
    use crate::names::NameContext;
    use crate::parser::ParserHost;
    use crate::traversal::walk;

    /// Parses a snippet, runs one matcher over the full tree, and drains
    /// its matches.
    pub(crate) fn collect_matches(matcher: &mut dyn Matcher, source: &str) -> Vec<RawMatch> {
        let mut host = ParserHost::new().unwrap();
        let tree = host.parse_source(source.as_bytes()).unwrap();
        let names = NameContext::collect(&tree, source.as_bytes());
        let ctx = VisitCtx {
            source: source.as_bytes(),
            names: &names,
        };
        walk(tree.root_node(), |node| matcher.visit(&node, &ctx));
        matcher.take_matches()
    }
}
