//! The tree mapper.
//!
//! Walks the raw blocks produced by the block assembler, runs the inline
//! tokenizer over every body that carries inlines, and emits the final
//! block tree. Blockquote interiors re-enter the block assembler, so the
//! whole mapping is depth-guarded.

use crate::ast::{Block, HeadingLevel, ListItem, TableColumn};
use crate::block::assemble;
use crate::block::raw::{RawBlock, State};
use crate::error::ParseError;
use crate::inline::InlineParser;
use crate::Options;

/// Map a whole document: block pass, then inline pass.
pub fn map_document(input: &str, options: &Options) -> Result<Vec<Block>, ParseError> {
    map_at_depth(input, options, 0, 1)
}

fn map_at_depth(
    input: &str,
    options: &Options,
    depth: usize,
    base_row: usize,
) -> Result<Vec<Block>, ParseError> {
    if depth > options.max_nesting {
        return Err(ParseError::NestingLimit {
            row: base_row,
            limit: options.max_nesting,
        });
    }

    let State {
        link_defs,
        raw_blocks,
        rows,
    } = assemble(input)?;
    let inline = InlineParser::new(&link_defs, options.max_nesting);

    let mut blocks = Vec::new();
    for (raw, row) in raw_blocks.into_iter().zip(rows) {
        match raw {
            RawBlock::BlankLine => {}
            RawBlock::Body(text) => {
                let content = inline.parse(&text, row)?;
                if !content.is_empty() {
                    blocks.push(Block::Paragraph(content));
                }
            }
            RawBlock::Heading { level, text } => {
                let level = HeadingLevel::try_from(level)
                    .map_err(|level| ParseError::HeadingLevel { row, level })?;
                blocks.push(Block::Heading {
                    level,
                    content: inline.parse(text, row)?,
                });
            }
            RawBlock::BlockQuote(text) => {
                blocks.push(Block::BlockQuote(map_at_depth(
                    &text,
                    options,
                    depth + 1,
                    row,
                )?));
            }
            RawBlock::CodeBlock { body, language } => {
                blocks.push(Block::CodeBlock {
                    body: body.into_owned(),
                    language: language.map(str::to_string),
                });
            }
            RawBlock::IndentedCodeBlock(body) => {
                blocks.push(Block::CodeBlock {
                    body: body.into_owned(),
                    language: None,
                });
            }
            RawBlock::ThematicBreak => blocks.push(Block::ThematicBreak),
            RawBlock::UnorderedList(items) => {
                let items = items
                    .into_iter()
                    .map(|item| {
                        Ok(ListItem {
                            task: item.task,
                            content: inline.parse(item.body, row)?,
                        })
                    })
                    .collect::<Result<Vec<_>, ParseError>>()?;
                blocks.push(Block::UnorderedList(items));
            }
            RawBlock::OrderedList { start, items } => {
                let items = items
                    .into_iter()
                    .map(|body| inline.parse(body, row))
                    .collect::<Result<Vec<_>, ParseError>>()?;
                blocks.push(Block::OrderedList { start, items });
            }
            RawBlock::Html(node) => blocks.push(Block::Html(node)),
            RawBlock::Table { columns } => {
                let columns = columns
                    .into_iter()
                    .map(|(alignment, header)| {
                        Ok(TableColumn {
                            alignment,
                            header: inline.parse(header, row)?,
                        })
                    })
                    .collect::<Result<Vec<_>, ParseError>>()?;
                blocks.push(Block::Table {
                    columns,
                    rows: Vec::new(),
                });
            }
        }
    }

    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Inline;

    fn map(input: &str) -> Vec<Block> {
        map_document(input, &Options::default()).unwrap()
    }

    fn text(s: &str) -> Inline {
        Inline::Text(s.into())
    }

    #[test]
    fn test_empty_paragraph_dropped() {
        // A paragraph body of only an escape-less empty string vanishes.
        assert!(map("").is_empty());
        assert!(map("\n\n").is_empty());
    }

    #[test]
    fn test_blockquote_recursion() {
        let blocks = map("> # Inner\n> text\n");
        assert_eq!(blocks.len(), 1);
        match &blocks[0] {
            Block::BlockQuote(inner) => {
                assert_eq!(inner.len(), 2);
                assert!(matches!(inner[0], Block::Heading { .. }));
                assert_eq!(inner[1], Block::Paragraph(vec![text("text")]));
            }
            other => panic!("expected blockquote, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_blockquotes() {
        let blocks = map("> > deep\n");
        match &blocks[0] {
            Block::BlockQuote(inner) => match &inner[0] {
                Block::BlockQuote(deepest) => {
                    assert_eq!(deepest[0], Block::Paragraph(vec![text("deep")]));
                }
                other => panic!("expected nested quote, got {other:?}"),
            },
            other => panic!("expected blockquote, got {other:?}"),
        }
    }

    #[test]
    fn test_nesting_limit_on_hostile_quotes() {
        let hostile: String = "> ".repeat(300).trim_end().to_string() + "x\n";
        let options = Options::default();
        let err = map_document(&hostile, &options).unwrap_err();
        assert!(matches!(err, ParseError::NestingLimit { .. }));
    }

    #[test]
    fn test_indented_code_has_no_language() {
        let blocks = map("    let x = 1;\n");
        assert_eq!(
            blocks,
            vec![Block::CodeBlock {
                body: "let x = 1;".into(),
                language: None
            }]
        );
    }

    #[test]
    fn test_link_defs_scoped_to_their_assembly() {
        // A definition inside a blockquote resolves references in the
        // quote's own re-parse.
        let blocks = map("> [x]\n> \n> [x]: /u\n");
        match &blocks[0] {
            Block::BlockQuote(inner) => match &inner[0] {
                Block::Paragraph(content) => {
                    assert!(matches!(content[0], Inline::Link { .. }));
                }
                other => panic!("expected paragraph, got {other:?}"),
            },
            other => panic!("expected blockquote, got {other:?}"),
        }
    }

    #[test]
    fn test_table_maps_header_cells() {
        let blocks = map("| *a* | b |\n|:--|--:|\n");
        match &blocks[0] {
            Block::Table { columns, rows } => {
                assert!(rows.is_empty());
                assert_eq!(columns.len(), 2);
                assert_eq!(
                    columns[0].header,
                    vec![Inline::Emphasis(vec![text("a")])]
                );
            }
            other => panic!("expected table, got {other:?}"),
        }
    }
}
