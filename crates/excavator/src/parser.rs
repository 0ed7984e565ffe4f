//! Tree-sitter based PHP parsing over memory-mapped file buffers.
//!
//! Parse failures are per-file soft failures: tree-sitter recovers from most
//! syntax errors, but a tree containing ERROR nodes means the resolved names
//! and matched shapes inside it cannot be trusted, so the whole file is
//! rejected and reported through the parse-error notification instead.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use tree_sitter::{Parser, Tree};

use crate::ExcavatorError;

/// A per-file soft parse failure. Never propagated as a hard error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub message: String,
}

/// Read-only file buffer backing one parse.
///
/// **Memory model**: one mmap per file, zero copies. Empty files get no map
/// (mapping a zero-length file fails on some platforms).
#[derive(Debug)]
pub enum FileBuffer {
    Mapped(Mmap),
    Empty,
}

impl FileBuffer {
    pub fn bytes(&self) -> &[u8] {
        match self {
            FileBuffer::Mapped(map) => &map[..],
            FileBuffer::Empty => b"",
        }
    }
}

/// Maps a file read-only.
///
/// # Errors
/// - `IoError`: file not found, permission denied, mmap failure.
/// - `ByteRangeOverflow`: file larger than 4GB (tree-sitter u32 limit).
pub fn map_file(path: &Path) -> Result<FileBuffer, ExcavatorError> {
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    if len > u32::MAX as u64 {
        return Err(ExcavatorError::ByteRangeOverflow);
    }
    if len == 0 {
        return Ok(FileBuffer::Empty);
    }
    // SAFETY: mmap is read-only; the file handle outlives the map.
    let map = unsafe { Mmap::map(&file)? };
    Ok(FileBuffer::Mapped(map))
}

/// Owns the tree-sitter parser configured with the PHP grammar.
pub struct ParserHost {
    parser: Parser,
}

impl ParserHost {
    /// Creates a parser host with the PHP grammar loaded.
    ///
    /// # Errors
    /// Returns `ExcavatorError::GrammarLoad` if tree-sitter rejects the
    /// grammar (ABI mismatch).
    pub fn new() -> Result<Self, ExcavatorError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_php::LANGUAGE_PHP.into())
            .map_err(|e| ExcavatorError::GrammarLoad(format!("failed to load PHP grammar: {e}")))?;
        Ok(Self { parser })
    }

    /// Parses a source buffer into a syntax tree.
    ///
    /// Returns `Err(ParseFailure)` when tree-sitter yields no tree at all or
    /// when the tree contains an ERROR node. The failure message carries the
    /// first offending line for the notification callback.
    pub fn parse_source(&mut self, source: &[u8]) -> Result<Tree, ParseFailure> {
        let tree = self.parser.parse(source, None).ok_or_else(|| ParseFailure {
            message: "parser produced no syntax tree".to_string(),
        })?;

        let root = tree.root_node();
        if root.has_error() {
            let line = first_error_line(root).unwrap_or(0);
            return Err(ParseFailure {
                message: format!("syntax error near line {line}"),
            });
        }
        Ok(tree)
    }
}

/// Finds the 1-based line of the first ERROR or missing node.
fn first_error_line(root: tree_sitter::Node<'_>) -> Option<u32> {
    let mut result = None;
    crate::traversal::walk(root, |node| {
        if result.is_none() && (node.is_error() || node.is_missing()) {
            result = Some(node.start_position().row as u32 + 1);
        }
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_source() {
        let mut host = ParserHost::new().unwrap();
        let tree = host.parse_source(b"<?php echo 1;").unwrap();
        assert_eq!(tree.root_node().kind(), "program");
    }

    #[test]
    fn test_parse_failure_reports_line() {
        let mut host = ParserHost::new().unwrap();
        let err = host
            .parse_source(b"<?php\nclass Foo {\n    public function {\n}\n")
            .unwrap_err();
        assert!(err.message.contains("syntax error"), "{}", err.message);
    }

    #[test]
    fn test_plain_text_is_not_an_error() {
        // Content outside PHP tags parses as a text node, not an error.
        let mut host = ParserHost::new().unwrap();
        assert!(host.parse_source(b"just some text").is_ok());
    }

    #[test]
    fn test_map_missing_file() {
        let err = map_file(Path::new("/does/not/exist.php")).unwrap_err();
        assert!(matches!(err, ExcavatorError::IoError(_)));
    }

    #[test]
    fn test_map_empty_file() {
        let path = std::env::temp_dir().join("excavator_empty_map.php");
        std::fs::write(&path, b"").unwrap();
        let buffer = map_file(&path).unwrap();
        assert!(buffer.bytes().is_empty());
        std::fs::remove_file(path).ok();
    }
}
