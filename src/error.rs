//! Parse error taxonomy.
//!
//! All errors are values; the parser never panics on well-formed-but-
//! adversarial input. Rows are 1-based line numbers. Rows reported for
//! inline errors are advisory: inline content is re-parsed from sliced
//! substrings, so the row refers to the block that carried the content.

use thiserror::Error;

/// An error produced while parsing a Markdown document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No raw-block alternative matched and input was not at its end.
    #[error("no block construct matched")]
    Lex { row: usize },

    /// A heading outside the 1..=6 level range was committed and reached
    /// the tree mapper.
    #[error("heading level {level} is out of range 1-6")]
    HeadingLevel { row: usize, level: u8 },

    /// Inline tokenization failed irrecoverably.
    #[error("{message}")]
    Inline { row: usize, message: String },

    /// The configured recursion limit was exceeded.
    #[error("nesting exceeds the configured limit of {limit}")]
    NestingLimit { row: usize, limit: usize },
}

impl ParseError {
    /// The 1-based row the error is attributed to.
    pub fn row(&self) -> usize {
        match self {
            ParseError::Lex { row }
            | ParseError::HeadingLevel { row, .. }
            | ParseError::Inline { row, .. }
            | ParseError::NestingLimit { row, .. } => *row,
        }
    }
}

/// Render an error the way the command-line front end reports it.
///
/// # Example
/// ```
/// use tidemark::{error_to_string, ParseError};
///
/// let err = ParseError::Lex { row: 3 };
/// assert_eq!(error_to_string(&err), "Problem at row 3\nno block construct matched");
/// ```
pub fn error_to_string(err: &ParseError) -> String {
    format!("Problem at row {}\n{}", err.row(), err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_extraction() {
        assert_eq!(ParseError::Lex { row: 7 }.row(), 7);
        assert_eq!(ParseError::HeadingLevel { row: 2, level: 9 }.row(), 2);
        assert_eq!(
            ParseError::NestingLimit { row: 1, limit: 128 }.row(),
            1
        );
    }

    #[test]
    fn test_error_to_string_format() {
        let err = ParseError::HeadingLevel { row: 4, level: 7 };
        let rendered = error_to_string(&err);
        assert!(rendered.starts_with("Problem at row 4\n"));
        assert!(rendered.contains("heading level 7"));
    }

    #[test]
    fn test_inline_error_message_passthrough() {
        let err = ParseError::Inline {
            row: 1,
            message: "bracket stack overflow".into(),
        };
        assert_eq!(
            error_to_string(&err),
            "Problem at row 1\nbracket stack overflow"
        );
    }
}
