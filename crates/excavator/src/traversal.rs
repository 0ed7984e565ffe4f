//! Single pre-order walk shared by every visitor.
//!
//! One traversal serves name resolution, statistics and the whole matcher
//! battery; matchers filter by `node.kind()` themselves. The cursor-based
//! loop avoids recursion so pathologically deep trees cannot overflow the
//! stack.

use tree_sitter::Node;

/// Visits every node of the tree (named and anonymous) in pre-order.
pub fn walk<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    loop {
        visit(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParserHost;

    #[test]
    fn test_visits_every_named_node_once() {
        let mut host = ParserHost::new().unwrap();
        let source = b"<?php function foo() { return 1; }";
        let tree = host.parse_source(source).unwrap();

        let mut kinds = Vec::new();
        walk(tree.root_node(), |node| {
            if node.is_named() {
                kinds.push(node.kind());
            }
        });

        assert_eq!(kinds[0], "program");
        assert!(kinds.contains(&"function_definition"));
        assert!(kinds.contains(&"return_statement"));
    }

    #[test]
    fn test_preorder_parent_before_child() {
        let mut host = ParserHost::new().unwrap();
        let tree = host.parse_source(b"<?php if (true) { echo 1; }").unwrap();

        let mut seen_if = false;
        let mut echo_after_if = false;
        walk(tree.root_node(), |node| {
            match node.kind() {
                "if_statement" => seen_if = true,
                "echo_statement" => echo_after_if = seen_if,
                _ => {}
            }
        });
        assert!(echo_after_if);
    }
}
