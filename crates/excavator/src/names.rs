//! Pass 1: namespace and import resolution.
//!
//! Collects `namespace` and `use` declarations from the tree once per file,
//! then resolves raw name text to fully-qualified form on demand during the
//! matcher pass. `self`, `static`, `parent` and `$variable` scopes have no
//! static resolution; callers inspect the node kind and degrade to weak
//! matching for those.

use std::collections::HashMap;

use tree_sitter::{Node, Tree};

use crate::traversal::walk;

/// Import spaces tracked separately, mirroring PHP's `use` / `use function`
/// / `use const` forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImportSpace {
    Class,
    Function,
    Constant,
}

/// Per-file resolution context: current namespace plus alias tables.
#[derive(Debug, Default, Clone)]
pub struct NameContext {
    namespace: Option<String>,
    class_aliases: HashMap<String, String>,
    function_aliases: HashMap<String, String>,
    constant_aliases: HashMap<String, String>,
}

impl NameContext {
    /// Walks the tree once and collects namespace/use declarations.
    pub fn collect(tree: &Tree, source: &[u8]) -> Self {
        let mut ctx = NameContext::default();
        walk(tree.root_node(), |node| match node.kind() {
            "namespace_definition" => {
                if ctx.namespace.is_none() {
                    if let Some(name) = node.child_by_field_name("name") {
                        ctx.namespace = Some(node_text(&name, source).to_string());
                    }
                }
            }
            "namespace_use_declaration" => ctx.collect_use_declaration(&node, source),
            _ => {}
        });
        ctx
    }

    /// The file's namespace, if it declares one.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Resolves raw class-name text to fully-qualified form.
    ///
    /// Leading `\` means already fully qualified; otherwise the first
    /// segment is expanded through the alias table, falling back to a
    /// current-namespace prefix.
    pub fn resolve_class(&self, raw: &str) -> String {
        self.resolve_in(raw, &self.class_aliases, true)
    }

    /// Resolves raw function-name text.
    ///
    /// Unqualified names that are not aliased fall back to the global
    /// function space (PHP runtime lookup order).
    pub fn resolve_function(&self, raw: &str) -> String {
        self.resolve_in(raw, &self.function_aliases, false)
    }

    /// Resolves raw constant-name text, with the same global fallback as
    /// functions.
    pub fn resolve_constant(&self, raw: &str) -> String {
        self.resolve_in(raw, &self.constant_aliases, false)
    }

    fn resolve_in(&self, raw: &str, aliases: &HashMap<String, String>, prefix_ns: bool) -> String {
        let raw = raw.trim();
        if let Some(stripped) = raw.strip_prefix('\\') {
            return stripped.to_string();
        }

        let (head, rest) = match raw.split_once('\\') {
            Some((head, rest)) => (head, Some(rest)),
            None => (raw, None),
        };

        // Qualified tails always resolve through the class alias table:
        // `use A\B; B\C::x()` refers to class space regardless of call form.
        let table = if rest.is_some() { &self.class_aliases } else { aliases };
        if let Some(full) = table.get(head) {
            return match rest {
                Some(rest) => format!("{full}\\{rest}"),
                None => full.clone(),
            };
        }

        if prefix_ns || rest.is_some() {
            if let Some(ns) = &self.namespace {
                return format!("{ns}\\{raw}");
            }
        }
        raw.to_string()
    }

    fn collect_use_declaration(&mut self, decl: &Node<'_>, source: &[u8]) {
        // `use function ...;` / `use const ...;` markers are anonymous
        // children of the declaration itself.
        let default_space = declared_space(decl).unwrap_or(ImportSpace::Class);

        // Group form (`use A\B\{C, D as E};`) carries the shared prefix as a
        // direct namespace_name child; simple clauses have none.
        let mut prefix: Option<String> = None;
        let mut cursor = decl.walk();
        for child in decl.named_children(&mut cursor) {
            if child.kind() == "namespace_name" {
                prefix = Some(node_text(&child, source).trim_start_matches('\\').to_string());
                break;
            }
        }

        let mut clauses = Vec::new();
        walk(*decl, |node| {
            if matches!(node.kind(), "namespace_use_clause" | "namespace_use_group_clause") {
                clauses.push(node);
            }
        });

        for clause in clauses {
            let space = declared_space(&clause).unwrap_or(default_space);
            let mut target: Option<String> = None;
            let mut alias: Option<String> = None;

            let mut cursor = clause.walk();
            for child in clause.named_children(&mut cursor) {
                match child.kind() {
                    "qualified_name" | "name" | "namespace_name" if target.is_none() => {
                        target =
                            Some(node_text(&child, source).trim_start_matches('\\').to_string());
                    }
                    "namespace_aliasing_clause" => {
                        let mut inner = child.walk();
                        let found = child
                            .named_children(&mut inner)
                            .find(|n| n.kind() == "name");
                        if let Some(name) = found {
                            alias = Some(node_text(&name, source).to_string());
                        }
                    }
                    _ => {}
                }
            }

            let Some(target) = target else { continue };
            // A declaration-level prefix only exists in the group form.
            let full = match &prefix {
                Some(prefix) => format!("{prefix}\\{target}"),
                None => target,
            };
            let alias = alias
                .unwrap_or_else(|| full.rsplit('\\').next().unwrap_or(&full).to_string());

            let table = match space {
                ImportSpace::Class => &mut self.class_aliases,
                ImportSpace::Function => &mut self.function_aliases,
                ImportSpace::Constant => &mut self.constant_aliases,
            };
            table.insert(alias, full);
        }
    }
}

/// Reads an optional `function`/`const` marker off a use declaration or
/// group clause.
fn declared_space(node: &Node<'_>) -> Option<ImportSpace> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function" => return Some(ImportSpace::Function),
            "const" => return Some(ImportSpace::Constant),
            // Stop before descending into the imported names themselves.
            "namespace_use_clause" | "namespace_use_group" | "qualified_name" | "name"
            | "namespace_name" => break,
            _ => {}
        }
    }
    None
}

/// UTF-8 text of a node, empty on invalid ranges.
pub(crate) fn node_text<'a>(node: &Node<'_>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParserHost;

    fn context_for(source: &str) -> NameContext {
        let mut host = ParserHost::new().unwrap();
        let tree = host.parse_source(source.as_bytes()).unwrap();
        NameContext::collect(&tree, source.as_bytes())
    }

    #[test]
    fn test_namespace_collected() {
        let ctx = context_for("<?php namespace Vendor\\Pkg; class A {}");
        assert_eq!(ctx.namespace(), Some("Vendor\\Pkg"));
    }

    #[test]
    fn test_fully_qualified_passthrough() {
        let ctx = context_for("<?php namespace Vendor\\Pkg;");
        assert_eq!(ctx.resolve_class("\\Core\\Utility"), "Core\\Utility");
    }

    #[test]
    fn test_use_alias_resolution() {
        let ctx = context_for("<?php use Core\\Utility\\MathUtility;");
        assert_eq!(
            ctx.resolve_class("MathUtility"),
            "Core\\Utility\\MathUtility"
        );
    }

    #[test]
    fn test_use_as_alias() {
        let ctx = context_for("<?php use Core\\Utility\\MathUtility as Math;");
        assert_eq!(ctx.resolve_class("Math"), "Core\\Utility\\MathUtility");
    }

    #[test]
    fn test_qualified_tail_through_alias() {
        let ctx = context_for("<?php use Core\\Utility;");
        assert_eq!(
            ctx.resolve_class("Utility\\MathUtility"),
            "Core\\Utility\\MathUtility"
        );
    }

    #[test]
    fn test_namespace_prefix_fallback() {
        let ctx = context_for("<?php namespace App\\Service;");
        assert_eq!(ctx.resolve_class("Helper"), "App\\Service\\Helper");
    }

    #[test]
    fn test_group_use() {
        let ctx = context_for("<?php use Core\\Utility\\{MathUtility, PathUtility as P};");
        assert_eq!(
            ctx.resolve_class("MathUtility"),
            "Core\\Utility\\MathUtility"
        );
        assert_eq!(ctx.resolve_class("P"), "Core\\Utility\\PathUtility");
    }

    #[test]
    fn test_function_global_fallback() {
        let ctx = context_for("<?php namespace App;");
        // Unqualified function names fall back to the global space.
        assert_eq!(ctx.resolve_function("strlen"), "strlen");
    }

    #[test]
    fn test_use_function_alias() {
        let ctx = context_for("<?php use function Core\\Utility\\debugBegin;");
        assert_eq!(
            ctx.resolve_function("debugBegin"),
            "Core\\Utility\\debugBegin"
        );
        // The class space is untouched by a function import.
        assert_eq!(ctx.resolve_class("debugBegin"), "debugBegin");
    }

    #[test]
    fn test_no_namespace_bare_class() {
        let ctx = context_for("<?php class A {}");
        assert_eq!(ctx.resolve_class("SomeClass"), "SomeClass");
    }
}
