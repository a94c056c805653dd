//! Raw HTML subparser.
//!
//! Recognizes HTML elements, comments, CDATA sections, processing
//! instructions, and declarations, in both block position (a line opening
//! with `<`) and inline position (inside paragraph text). Nodes carry the
//! raw source text; no attribute model is built.

use crate::cursor::Cursor;

/// A recognized raw HTML construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlNode {
    /// An element tag, or in block position the element together with the
    /// lines that follow it up to a blank line.
    Element(String),
    /// `<!-- ... -->`
    Comment(String),
    /// `<![CDATA[ ... ]]>`
    CData(String),
    /// `<? ... ?>`
    ProcessingInstruction(String),
    /// `<! ... >`
    Declaration(String),
}

impl HtmlNode {
    /// The raw source text of the construct.
    pub fn raw(&self) -> &str {
        match self {
            HtmlNode::Element(raw)
            | HtmlNode::Comment(raw)
            | HtmlNode::CData(raw)
            | HtmlNode::ProcessingInstruction(raw)
            | HtmlNode::Declaration(raw) => raw,
        }
    }
}

/// Try to parse an HTML block at the cursor. On success the cursor sits
/// just past the block's trailing newline (or at end of input); on failure
/// the cursor is untouched.
pub fn parse_block(cursor: &mut Cursor<'_>) -> Option<HtmlNode> {
    let checkpoint = cursor.checkpoint();
    if !cursor.at(b'<') {
        return None;
    }

    let rest = cursor.rest();
    let node = if rest.starts_with("<!--") {
        consume_through(cursor, 4, "-->").map(HtmlNode::Comment)
    } else if rest.starts_with("<![CDATA[") {
        consume_through(cursor, 9, "]]>").map(HtmlNode::CData)
    } else if rest.starts_with("<?") {
        consume_through(cursor, 2, "?>").map(HtmlNode::ProcessingInstruction)
    } else if rest.starts_with("<!") {
        consume_declaration(cursor)
    } else {
        return match consume_element_block(cursor) {
            Some(node) => Some(node),
            None => {
                cursor.rewind(checkpoint);
                None
            }
        };
    };

    match node {
        Some(node) => {
            // Land just past the construct's line ending.
            cursor.chomp_while(crate::cursor::is_space_or_tab);
            cursor.eat(b'\n');
            Some(node)
        }
        None => {
            cursor.rewind(checkpoint);
            None
        }
    }
}

/// Consume from the cursor through the given terminator, which may lie on
/// a later line. Returns the raw text including the terminator.
fn consume_through(cursor: &mut Cursor<'_>, prefix_len: usize, terminator: &str) -> Option<String> {
    let start = cursor.checkpoint();
    let rest = cursor.rest();
    let body_at = prefix_len;
    let end = rest[body_at..].find(terminator)? + body_at + terminator.len();
    cursor.advance(end);
    Some(cursor.slice_from(start).to_string())
}

/// `<!LETTER ... >` on a single logical run, terminated by `>`.
fn consume_declaration(cursor: &mut Cursor<'_>) -> Option<HtmlNode> {
    let rest = cursor.rest();
    let bytes = rest.as_bytes();
    if bytes.get(2).is_none_or(|b| !b.is_ascii_alphabetic()) {
        return None;
    }
    let start = cursor.checkpoint();
    let end = rest.find('>')? + 1;
    cursor.advance(end);
    Some(HtmlNode::Declaration(cursor.slice_from(start).to_string()))
}

/// An element in block position: the tag line and every following line up
/// to a blank line. The blank line itself is left for the blank-line rule.
fn consume_element_block(cursor: &mut Cursor<'_>) -> Option<HtmlNode> {
    let bytes = cursor.rest().as_bytes();
    let mut i = 1;
    if bytes.get(i) == Some(&b'/') {
        i += 1;
    }
    if bytes.get(i).is_none_or(|b| !b.is_ascii_alphabetic()) {
        return None;
    }

    let start = cursor.checkpoint();
    while !cursor.at_end() {
        let line_start = cursor.checkpoint();
        let line = cursor.consume_line();
        if line.trim().is_empty() {
            cursor.rewind(line_start);
            break;
        }
    }

    let raw = cursor.slice_from(start);
    let raw = raw.strip_suffix('\n').unwrap_or(raw);
    Some(HtmlNode::Element(raw.to_string()))
}

/// Try to parse an inline HTML construct at `start` inside `text`.
/// Returns the node and the offset one past its end.
pub fn parse_inline(text: &str, start: usize) -> Option<(HtmlNode, usize)> {
    let rest = &text[start..];
    if !rest.starts_with('<') {
        return None;
    }

    if rest.starts_with("<!--") {
        let end = parse_comment_end(rest)?;
        return Some((HtmlNode::Comment(rest[..end].to_string()), start + end));
    }
    if rest.starts_with("<![CDATA[") {
        let end = rest[9..].find("]]>")? + 9 + 3;
        return Some((HtmlNode::CData(rest[..end].to_string()), start + end));
    }
    if rest.starts_with("<?") {
        let end = rest[2..].find("?>")? + 2 + 2;
        return Some((
            HtmlNode::ProcessingInstruction(rest[..end].to_string()),
            start + end,
        ));
    }
    if rest.starts_with("<!") {
        let bytes = rest.as_bytes();
        if bytes.get(2).is_none_or(|b| !b.is_ascii_alphabetic()) {
            return None;
        }
        let end = rest.find('>')? + 1;
        return Some((HtmlNode::Declaration(rest[..end].to_string()), start + end));
    }

    let end = parse_tag_end(rest.as_bytes())?;
    Some((HtmlNode::Element(rest[..end].to_string()), start + end))
}

/// Comment terminator per CommonMark: `<!-->` and `<!--->` are complete
/// comments; otherwise scan for `-->`.
fn parse_comment_end(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    match bytes.get(4) {
        None => None,
        Some(b'>') => Some(5),
        Some(b'-') if bytes.get(5) == Some(&b'>') => Some(6),
        Some(_) => rest[4..].find("-->").map(|i| i + 4 + 3),
    }
}

/// Length of a well-formed open, close, or self-closing tag starting at
/// `<`, or `None`.
fn parse_tag_end(bytes: &[u8]) -> Option<usize> {
    let len = bytes.len();
    let mut i = 1;

    let closing = bytes.get(i) == Some(&b'/');
    if closing {
        i += 1;
    }

    if bytes.get(i).is_none_or(|b| !b.is_ascii_alphabetic()) {
        return None;
    }
    i += 1;
    while i < len && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-') {
        i += 1;
    }

    if closing {
        while i < len && is_tag_whitespace(bytes[i]) {
            i += 1;
        }
        return (bytes.get(i) == Some(&b'>')).then_some(i + 1);
    }

    // Attribute list.
    loop {
        let had_whitespace = {
            let before = i;
            while i < len && is_tag_whitespace(bytes[i]) {
                i += 1;
            }
            i > before
        };

        match bytes.get(i) {
            Some(b'>') => return Some(i + 1),
            Some(b'/') => {
                return (bytes.get(i + 1) == Some(&b'>')).then_some(i + 2);
            }
            Some(&b) if had_whitespace && is_attr_name_start(b) => {
                i += 1;
                while i < len && is_attr_name_char(bytes[i]) {
                    i += 1;
                }
                i = parse_attr_value(bytes, i)?;
            }
            _ => return None,
        }
    }
}

/// Optional `= value` following an attribute name. Returns the offset after
/// the attribute (or the name itself when no value is present).
fn parse_attr_value(bytes: &[u8], mut i: usize) -> Option<usize> {
    let len = bytes.len();
    let after_name = i;
    while i < len && is_tag_whitespace(bytes[i]) {
        i += 1;
    }
    if bytes.get(i) != Some(&b'=') {
        return Some(after_name);
    }
    i += 1;
    while i < len && is_tag_whitespace(bytes[i]) {
        i += 1;
    }

    match bytes.get(i) {
        Some(&quote) if quote == b'"' || quote == b'\'' => {
            i += 1;
            while i < len && bytes[i] != quote {
                i += 1;
            }
            (i < len).then_some(i + 1)
        }
        Some(_) => {
            let start = i;
            while i < len
                && !is_tag_whitespace(bytes[i])
                && !matches!(bytes[i], b'"' | b'\'' | b'=' | b'<' | b'>' | b'`')
            {
                i += 1;
            }
            (i > start).then_some(i)
        }
        None => None,
    }
}

#[inline]
fn is_tag_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0c)
}

#[inline]
fn is_attr_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b':'
}

#[inline]
fn is_attr_name_char(b: u8) -> bool {
    is_attr_name_start(b) || b.is_ascii_digit() || b == b'.' || b == b'-'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_simple_tag() {
        let (node, end) = parse_inline("<em>x", 0).unwrap();
        assert_eq!(node, HtmlNode::Element("<em>".into()));
        assert_eq!(end, 4);
    }

    #[test]
    fn test_inline_closing_tag() {
        let (node, end) = parse_inline("</div >", 0).unwrap();
        assert_eq!(node, HtmlNode::Element("</div >".into()));
        assert_eq!(end, 7);
    }

    #[test]
    fn test_inline_self_closing_with_attrs() {
        let input = "<img src=\"a.png\" alt='x' />";
        let (node, end) = parse_inline(input, 0).unwrap();
        assert_eq!(node, HtmlNode::Element(input.into()));
        assert_eq!(end, input.len());
    }

    #[test]
    fn test_inline_unquoted_attr() {
        assert!(parse_inline("<a href=foo>", 0).is_some());
        assert!(parse_inline("<a href=>", 0).is_none());
    }

    #[test]
    fn test_inline_tag_with_newline_in_attrs() {
        let input = "<a foo=\"bar\"\n_boolean />";
        assert!(parse_inline(input, 0).is_some());
    }

    #[test]
    fn test_inline_not_a_tag() {
        assert!(parse_inline("<3 hearts", 0).is_none());
        assert!(parse_inline("< space", 0).is_none());
    }

    #[test]
    fn test_inline_comment() {
        let (node, end) = parse_inline("<!-- hi --> x", 0).unwrap();
        assert_eq!(node, HtmlNode::Comment("<!-- hi -->".into()));
        assert_eq!(end, 11);
    }

    #[test]
    fn test_inline_empty_comments() {
        assert_eq!(parse_inline("<!-->", 0).unwrap().1, 5);
        assert_eq!(parse_inline("<!--->", 0).unwrap().1, 6);
    }

    #[test]
    fn test_inline_cdata_and_pi() {
        assert!(matches!(
            parse_inline("<![CDATA[x]]>", 0).unwrap().0,
            HtmlNode::CData(_)
        ));
        assert!(matches!(
            parse_inline("<?php echo ?>", 0).unwrap().0,
            HtmlNode::ProcessingInstruction(_)
        ));
    }

    #[test]
    fn test_inline_declaration() {
        assert!(matches!(
            parse_inline("<!DOCTYPE html>", 0).unwrap().0,
            HtmlNode::Declaration(_)
        ));
    }

    #[test]
    fn test_block_comment_multiline() {
        let mut cursor = Cursor::new("<!-- a\nb -->\nnext");
        let node = parse_block(&mut cursor).unwrap();
        assert_eq!(node, HtmlNode::Comment("<!-- a\nb -->".into()));
        assert_eq!(cursor.rest(), "next");
    }

    #[test]
    fn test_block_element_until_blank() {
        let mut cursor = Cursor::new("<div>\ncontent\n</div>\n\nafter");
        let node = parse_block(&mut cursor).unwrap();
        assert_eq!(node, HtmlNode::Element("<div>\ncontent\n</div>".into()));
    }

    #[test]
    fn test_block_failure_restores_cursor() {
        let mut cursor = Cursor::new("<!-- never closed");
        assert!(parse_block(&mut cursor).is_none());
        assert_eq!(cursor.offset(), 0);
    }
}
