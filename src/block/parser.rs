//! The block assembler.
//!
//! Drives the raw-block lexer in a loop, applies the merge rules after
//! every step, and keeps the row counter in sync with consumed newlines.
//! The produced `State` carries raw blocks in document order plus the
//! finalized link reference definitions.

use memchr::memchr_iter;

use crate::cursor::Cursor;
use crate::error::ParseError;

use super::lexer::{self, Lexed};
use super::raw::State;

/// Run the block pass over the whole input.
pub fn assemble(input: &str) -> Result<State<'_>, ParseError> {
    let mut cursor = Cursor::new(input);
    let mut state = State::new();
    let mut row = 1usize;

    while !cursor.at_end() {
        let step_start = cursor.checkpoint();
        match lexer::lex(&mut cursor, state.in_paragraph()) {
            Some(Lexed::Block(block)) => state.push(block, row),
            Some(Lexed::LinkDef { label, def }) => state.link_defs.insert(label, def),
            None => return Err(ParseError::Lex { row }),
        }

        let consumed = cursor.slice_from(step_start);
        if consumed.is_empty() {
            // A lexer alternative claimed success without consuming input;
            // surface it instead of spinning.
            return Err(ParseError::Lex { row });
        }
        row += memchr_iter(b'\n', consumed.as_bytes()).count();
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::raw::RawBlock;
    use std::borrow::Cow;

    fn raw_blocks(input: &str) -> Vec<RawBlock<'_>> {
        assemble(input).unwrap().raw_blocks
    }

    fn body(s: &str) -> RawBlock<'_> {
        RawBlock::Body(Cow::Borrowed(s))
    }

    #[test]
    fn test_empty_input() {
        assert!(raw_blocks("").is_empty());
    }

    #[test]
    fn test_paragraph_lines_merge() {
        assert_eq!(
            raw_blocks("Line 1\nLine 2\nLine 3\n"),
            vec![body("Line 1\nLine 2\nLine 3")]
        );
    }

    #[test]
    fn test_blank_line_splits_paragraphs() {
        assert_eq!(
            raw_blocks("a\n\nb\n"),
            vec![body("a"), RawBlock::BlankLine, body("b")]
        );
    }

    #[test]
    fn test_blank_lines_collapse() {
        assert_eq!(
            raw_blocks("a\n\n\n\nb\n"),
            vec![body("a"), RawBlock::BlankLine, body("b")]
        );
    }

    #[test]
    fn test_lazy_blockquote_continuation() {
        assert_eq!(
            raw_blocks("> a\nb\n"),
            vec![RawBlock::BlockQuote(Cow::Borrowed("a\nb"))]
        );
    }

    #[test]
    fn test_consecutive_blockquotes_merge() {
        assert_eq!(
            raw_blocks("> a\n> b\n"),
            vec![RawBlock::BlockQuote(Cow::Borrowed("a\nb"))]
        );
    }

    #[test]
    fn test_adjacent_fences_merge() {
        assert_eq!(
            raw_blocks("```\na\n```\n```\nb\n```\n"),
            vec![RawBlock::CodeBlock {
                body: Cow::Borrowed("a\nb"),
                language: None
            }]
        );
    }

    #[test]
    fn test_fences_with_blank_between_stay_separate() {
        let blocks = raw_blocks("```\na\n```\n\n```\nb\n```\n");
        assert_eq!(blocks.len(), 3);
        assert!(matches!(blocks[1], RawBlock::BlankLine));
    }

    #[test]
    fn test_indented_code_lines_merge() {
        assert_eq!(
            raw_blocks("    a\n    b\n"),
            vec![RawBlock::IndentedCodeBlock(Cow::Borrowed("a\nb"))]
        );
    }

    #[test]
    fn test_link_defs_collected_not_pushed() {
        let state = assemble("[x]: /u\n[y]: /v 'title'\n").unwrap();
        assert!(state.raw_blocks.is_empty());
        assert_eq!(state.link_defs.len(), 2);
        assert_eq!(state.link_defs.lookup("x").unwrap().destination, "/u");
        assert_eq!(
            state.link_defs.lookup("y").unwrap().title.as_deref(),
            Some("title")
        );
    }

    #[test]
    fn test_duplicate_link_def_first_wins() {
        let state = assemble("[x]: /first\n[x]: /second\n").unwrap();
        assert_eq!(state.link_defs.lookup("x").unwrap().destination, "/first");
    }

    #[test]
    fn test_ordered_list_after_paragraph_needs_start_one() {
        assert_eq!(
            raw_blocks("paragraph\n2. item\n"),
            vec![body("paragraph\n2. item")]
        );
        assert_eq!(
            raw_blocks("paragraph\n1. item\n"),
            vec![
                body("paragraph"),
                RawBlock::OrderedList {
                    start: 1,
                    items: vec!["item"]
                }
            ]
        );
    }

    #[test]
    fn test_rows_track_newlines() {
        let state = assemble("a\n\n# h\n\n> q\n").unwrap();
        // Rows: body at 1, blank at 2, heading at 3, blank at 4, quote at 5.
        assert_eq!(state.rows, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_mixed_document() {
        let blocks = raw_blocks("# Title\n\ntext\nmore\n\n---\n");
        assert_eq!(blocks.len(), 5);
        assert!(matches!(
            blocks[0],
            RawBlock::Heading {
                level: 1,
                text: "Title"
            }
        ));
        assert_eq!(blocks[2], body("text\nmore"));
        assert!(matches!(blocks[4], RawBlock::ThematicBreak));
    }
}
