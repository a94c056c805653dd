//! Data-driven block-shape tests.
//!
//! Cases live in `tests/cases.json`; each one pairs a Markdown snippet
//! with the expected top-level block kinds.

use serde::Deserialize;
use std::fs;
use tidemark::{parse, Block};

#[derive(Debug, Deserialize)]
struct Case {
    name: String,
    markdown: String,
    kinds: Vec<String>,
}

fn load_cases() -> Vec<Case> {
    let json = fs::read_to_string("tests/cases.json").expect("failed to read tests/cases.json");
    serde_json::from_str(&json).expect("failed to parse tests/cases.json")
}

fn kind(block: &Block) -> &'static str {
    match block {
        Block::Heading { .. } => "heading",
        Block::Paragraph(_) => "paragraph",
        Block::BlockQuote(_) => "blockquote",
        Block::CodeBlock { .. } => "code-block",
        Block::ThematicBreak => "thematic-break",
        Block::UnorderedList(_) => "unordered-list",
        Block::OrderedList { .. } => "ordered-list",
        Block::Table { .. } => "table",
        Block::Html(_) => "html",
    }
}

#[test]
fn corpus_block_shapes() {
    let mut failures = Vec::new();

    for case in load_cases() {
        let blocks = match parse(&case.markdown) {
            Ok(blocks) => blocks,
            Err(errors) => {
                failures.push(format!("{}: parse failed: {errors:?}", case.name));
                continue;
            }
        };
        let kinds: Vec<&str> = blocks.iter().map(kind).collect();
        if kinds != case.kinds {
            failures.push(format!(
                "{}: expected {:?}, got {:?}",
                case.name, case.kinds, kinds
            ));
        }
    }

    assert!(
        failures.is_empty(),
        "{} corpus case(s) failed:\n{}",
        failures.len(),
        failures.join("\n")
    );
}
