//! Pass 1: per-file code statistics and the ignore decision.
//!
//! A file is exempted from matching as a whole — there is no per-matcher
//! ignoring. The decision is made once, before any matcher runs:
//!
//! - an explicit `@relicIgnoreFile` annotation anywhere in the file, or a
//!   `@generated` marker (vendored/generated code convention), or
//! - a tree with no declarations and no executable statements at all
//!   (e.g. a file holding only a namespace declaration, or plain text).
//!
//! Single lines can be exempted with a trailing `@relicIgnoreLine` comment;
//! the scanner drops raw matches on those lines after the matcher pass.

use std::collections::HashSet;
use std::sync::OnceLock;

use aho_corasick::AhoCorasick;
use tree_sitter::Tree;

use crate::names::node_text;
use crate::traversal::walk;

/// Whole-file exemption markers, scanned over the raw bytes in one pass.
/// String literals can false-positive here; that errs on the side of
/// scanning less, never on reporting wrong findings.
const FILE_MARKERS: &[&str] = &["@relicIgnoreFile", "@generated"];

/// Per-line exemption marker, looked up inside comment nodes only.
const LINE_MARKER: &str = "@relicIgnoreLine";

/// Statement kinds that count as executable code.
const EXECUTABLE_KINDS: &[&str] = &[
    "expression_statement",
    "echo_statement",
    "if_statement",
    "switch_statement",
    "while_statement",
    "do_statement",
    "for_statement",
    "foreach_statement",
    "return_statement",
    "try_statement",
    "unset_statement",
    "global_declaration",
];

/// Declaration kinds. Files consisting only of declarations are still
/// scanned: `extends`/`implements` of a removed class must be reported.
const DECLARATION_KINDS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "trait_declaration",
    "enum_declaration",
    "function_definition",
    "const_declaration",
];

fn file_markers() -> &'static AhoCorasick {
    static MARKERS: OnceLock<AhoCorasick> = OnceLock::new();
    MARKERS.get_or_init(|| {
        AhoCorasick::new(FILE_MARKERS)
            .expect("marker automaton build failed — the patterns are hardcoded literals")
    })
}

/// Counts and flags computed in pass 1, consumed by the scanner before and
/// after the matcher pass.
#[derive(Debug, Default, Clone)]
pub struct FileStatistics {
    file_ignored: bool,
    ignored_lines: HashSet<u32>,
    declaration_count: usize,
    executable_count: usize,
}

impl FileStatistics {
    /// Walks the tree once and scans the raw bytes once.
    pub fn collect(tree: &Tree, source: &[u8]) -> Self {
        let mut stats = FileStatistics {
            file_ignored: file_markers().is_match(source),
            ..Default::default()
        };

        walk(tree.root_node(), |node| {
            let kind = node.kind();
            if kind == "comment" {
                if node_text(&node, source).contains(LINE_MARKER) {
                    stats
                        .ignored_lines
                        .insert(node.start_position().row as u32 + 1);
                }
            } else if EXECUTABLE_KINDS.contains(&kind) {
                stats.executable_count += 1;
            } else if DECLARATION_KINDS.contains(&kind) {
                stats.declaration_count += 1;
            }
        });

        if stats.declaration_count == 0 && stats.executable_count == 0 {
            stats.file_ignored = true;
        }
        stats
    }

    /// The single file-level exemption decision.
    pub fn is_file_ignored(&self) -> bool {
        self.file_ignored
    }

    /// Whether matches on this 1-based line are suppressed.
    pub fn is_line_ignored(&self, line: u32) -> bool {
        self.ignored_lines.contains(&line)
    }

    /// Number of declaration nodes seen.
    pub fn declaration_count(&self) -> usize {
        self.declaration_count
    }

    /// Number of executable statement nodes seen.
    pub fn executable_count(&self) -> usize {
        self.executable_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParserHost;

    fn stats_for(source: &str) -> FileStatistics {
        let mut host = ParserHost::new().unwrap();
        let tree = host.parse_source(source.as_bytes()).unwrap();
        FileStatistics::collect(&tree, source.as_bytes())
    }

    #[test]
    fn test_namespace_only_file_is_ignored() {
        let stats = stats_for("<?php\nnamespace Vendor\\Pkg;\n");
        assert!(stats.is_file_ignored());
    }

    #[test]
    fn test_plain_text_is_ignored() {
        let stats = stats_for("no php here at all\n");
        assert!(stats.is_file_ignored());
    }

    #[test]
    fn test_class_declaration_is_scanned() {
        let stats = stats_for("<?php class A extends B {}");
        assert!(!stats.is_file_ignored());
        assert_eq!(stats.declaration_count(), 1);
    }

    #[test]
    fn test_executable_code_is_scanned() {
        let stats = stats_for("<?php echo 'hi';");
        assert!(!stats.is_file_ignored());
        assert!(stats.executable_count() >= 1);
    }

    #[test]
    fn test_ignore_file_marker_wins_over_code() {
        let stats = stats_for("<?php\n// @relicIgnoreFile\necho 'hi';\n");
        assert!(stats.is_file_ignored());
    }

    #[test]
    fn test_generated_marker_ignored() {
        let stats = stats_for("<?php\n/** @generated by the build */\necho 'hi';\n");
        assert!(stats.is_file_ignored());
    }

    #[test]
    fn test_ignore_line_marker() {
        let stats = stats_for("<?php\necho 'a';\necho 'b'; // @relicIgnoreLine\necho 'c';\n");
        assert!(!stats.is_file_ignored());
        assert!(!stats.is_line_ignored(2));
        assert!(stats.is_line_ignored(3));
        assert!(!stats.is_line_ignored(4));
    }
}
