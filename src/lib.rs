//! tidemark: a CommonMark-compatible Markdown front end.
//!
//! The parser converts a Markdown source string into a typed tree of
//! blocks and inlines in two passes: the block pass scans raw blocks and
//! collects link reference definitions, then the inline pass resolves
//! emphasis, links, images, and code spans against the finished
//! definition table. Forward references work because the passes are
//! strictly ordered.
//!
//! # Design principles
//! - Byte-level scanning, no regexes
//! - Zero-copy raw blocks; only the final tree owns its strings
//! - Errors are values; adversarial input fails with an error, not a panic
//!
//! # Example
//! ```
//! use tidemark::{parse, Block};
//!
//! let blocks = parse("# Hello\n\nSome *emphasis*.\n").unwrap();
//! assert_eq!(blocks.len(), 2);
//! assert!(matches!(blocks[0], Block::Heading { .. }));
//! assert!(matches!(blocks[1], Block::Paragraph(_)));
//! ```

pub mod ast;
mod block;
pub mod cursor;
pub mod error;
pub mod html;
mod inline;
pub mod limits;
pub mod link_ref;
mod tree;
pub mod url;

pub use ast::{
    Alignment, Block, HeadingLevel, Inline, ListItem, TableColumn, TaskState,
};
pub use error::{error_to_string, ParseError};
pub use html::HtmlNode;

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct Options {
    /// Maximum recursion depth for nested blockquotes and link text.
    pub max_nesting: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_nesting: limits::MAX_NESTING_DEPTH,
        }
    }
}

/// Parse a Markdown document into a block tree.
///
/// Returns either the complete tree or a non-empty list of errors; a
/// partial tree is never returned.
pub fn parse(input: &str) -> Result<Vec<Block>, Vec<ParseError>> {
    parse_with_options(input, &Options::default())
}

/// Parse with explicit [`Options`].
pub fn parse_with_options(input: &str, options: &Options) -> Result<Vec<Block>, Vec<ParseError>> {
    tree::map_document(input, options).map_err(|err| vec![err])
}
