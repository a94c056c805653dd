//! Raw blocks and assembler state.
//!
//! A raw block is the intermediate form between the line lexer and the
//! tree mapper: structure is decided, inline content is still unparsed
//! text. Raw blocks borrow from the input where they can; bodies become
//! owned only when a merge splices lines together.

use std::borrow::Cow;

use crate::ast::{Alignment, TaskState};
use crate::html::HtmlNode;
use crate::link_ref::LinkRefStore;

/// One item of a raw unordered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawListItem<'a> {
    pub task: TaskState,
    pub body: &'a str,
}

/// A block whose inline content has not been tokenized yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawBlock<'a> {
    /// One or more blank lines, collapsed to one.
    BlankLine,
    /// ATX heading; `level` is validated during tree mapping.
    Heading { level: u8, text: &'a str },
    /// Paragraph content; consecutive lines merge joined by `\n`.
    Body(Cow<'a, str>),
    /// Blockquote interior, markers stripped, lines joined by `\n`.
    BlockQuote(Cow<'a, str>),
    /// Fenced code block.
    CodeBlock {
        body: Cow<'a, str>,
        language: Option<&'a str>,
    },
    /// Four-space or tab indented code, one line at a time.
    IndentedCodeBlock(Cow<'a, str>),
    ThematicBreak,
    UnorderedList(Vec<RawListItem<'a>>),
    OrderedList { start: u32, items: Vec<&'a str> },
    /// A raw HTML block.
    Html(HtmlNode),
    /// Table header cells with alignment; body rows are not captured.
    Table { columns: Vec<(Alignment, &'a str)> },
}

/// Assembler state: collected definitions plus the raw block stack.
#[derive(Debug, Default)]
pub struct State<'a> {
    pub link_defs: LinkRefStore,
    /// Raw blocks in document order; the merge rules only ever touch the
    /// last entry.
    pub raw_blocks: Vec<RawBlock<'a>>,
    /// Starting row (1-based) of each raw block, parallel to `raw_blocks`.
    pub rows: Vec<usize>,
}

impl<'a> State<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently pushed raw block.
    pub fn top(&self) -> Option<&RawBlock<'a>> {
        self.raw_blocks.last()
    }

    /// Whether the assembler is in paragraph context.
    pub fn in_paragraph(&self) -> bool {
        matches!(self.top(), Some(RawBlock::Body(_)))
    }

    /// Push a freshly lexed raw block, applying the merge rules:
    ///
    /// - `Body` after `Body` joins with `\n`
    /// - `Body` after `BlockQuote` is absorbed (lazy continuation)
    /// - fenced `CodeBlock` after fenced `CodeBlock` concatenates bodies,
    ///   dropping the second language tag
    /// - `IndentedCodeBlock` after `IndentedCodeBlock` concatenates
    /// - `BlockQuote` after `BlockQuote` concatenates
    /// - `BlankLine` after `BlankLine` collapses
    ///
    /// A `BlankLine` on top blocks every merge, so anything pushed after
    /// one starts a new block.
    pub fn push(&mut self, block: RawBlock<'a>, row: usize) {
        match (self.raw_blocks.last_mut(), block) {
            (Some(RawBlock::Body(top)), RawBlock::Body(text)) => {
                let top = top.to_mut();
                top.push('\n');
                top.push_str(&text);
            }
            (Some(RawBlock::BlockQuote(top)), RawBlock::Body(text)) => {
                let top = top.to_mut();
                top.push('\n');
                top.push_str(&text);
            }
            (Some(RawBlock::BlockQuote(top)), RawBlock::BlockQuote(text)) => {
                let top = top.to_mut();
                top.push('\n');
                top.push_str(&text);
            }
            (
                Some(RawBlock::CodeBlock { body: top, .. }),
                RawBlock::CodeBlock { body, .. },
            ) => {
                let top = top.to_mut();
                top.push('\n');
                top.push_str(&body);
            }
            (
                Some(RawBlock::IndentedCodeBlock(top)),
                RawBlock::IndentedCodeBlock(body),
            ) => {
                let top = top.to_mut();
                top.push('\n');
                top.push_str(&body);
            }
            (Some(RawBlock::BlankLine), RawBlock::BlankLine) => {}
            (_, block) => {
                self.raw_blocks.push(block);
                self.rows.push(row);
            }
        }
    }
}
