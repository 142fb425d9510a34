//! Position conversion utilities.
//!
//! tree-sitter reports columns in bytes; diagnostics count characters.

use crate::ast::{Position, Span};
use tree_sitter::Node;

/// Convert a byte column on a line into a character column.
///
/// # Arguments
/// * `source` - The source string
/// * `byte` - Absolute byte offset of the position
/// * `byte_column` - Byte offset of the position within its line
pub fn char_column(source: &str, byte: usize, byte_column: usize) -> usize {
    let byte = byte.min(source.len());
    let line_start = byte.saturating_sub(byte_column);
    source
        .get(line_start..byte)
        .map(|prefix| prefix.chars().count())
        .unwrap_or(byte_column)
}

/// Span covered by a tree-sitter node
pub fn span_of(source: &str, node: Node<'_>) -> Span {
    let start = node.start_position();
    let end = node.end_position();
    Span {
        start: Position {
            byte: node.start_byte(),
            line: start.row,
            col: char_column(source, node.start_byte(), start.column),
        },
        end: Position {
            byte: node.end_byte(),
            line: end.row,
            col: char_column(source, node.end_byte(), end.column),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii() {
        let source = "hello world";
        assert_eq!(char_column(source, 0, 0), 0);
        assert_eq!(char_column(source, 5, 5), 5);
        assert_eq!(char_column(source, 11, 11), 11);
    }

    #[test]
    fn test_second_line() {
        let source = "x = 1\ny = 2";
        // "y" starts at byte 6, column 0 of line 1
        assert_eq!(char_column(source, 6, 0), 0);
        assert_eq!(char_column(source, 10, 4), 4);
    }

    #[test]
    fn test_multibyte() {
        let source = "café = 1";
        // é is 2 bytes but 1 character
        assert_eq!(char_column(source, 3, 3), 3); // before é
        assert_eq!(char_column(source, 5, 5), 4); // after é
    }

    #[test]
    fn test_emoji() {
        let source = "s = '👋' + x";
        // 👋 is 4 bytes; x sits at byte 13, character 10
        assert_eq!(char_column(source, 13, 13), 10);
    }

    #[test]
    fn test_out_of_bounds() {
        let source = "hello";
        assert_eq!(char_column(source, 100, 100), 5); // clamped to length
    }
}
