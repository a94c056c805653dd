//! The raw-block lexer.
//!
//! Each call recognizes one line group and produces a raw block or a link
//! reference definition. Alternatives are tried in a fixed order and the
//! first success wins; alternatives that look ahead snapshot the cursor
//! and restore it on failure, so a miss never consumes input. On success
//! the cursor sits just past the consumed trailing newline.

use std::borrow::Cow;

use crate::cursor::{is_gfm_whitespace, is_space_or_tab, is_spacebar, Cursor};
use crate::html;
use crate::link_ref::{normalize_label, LinkRefDef};
use crate::url;

use super::lists;
use super::raw::RawBlock;
use super::table;

/// One successful lexer step.
#[derive(Debug)]
pub enum Lexed<'a> {
    Block(RawBlock<'a>),
    /// A link reference definition; it joins the definition table instead
    /// of the raw block list.
    LinkDef { label: String, def: LinkRefDef },
}

/// Lex the next raw block. Returns `None` only when no alternative
/// matched; the caller treats that as a lex error unless at end of input.
pub fn lex<'a>(cursor: &mut Cursor<'a>, in_paragraph: bool) -> Option<Lexed<'a>> {
    debug_assert!(!cursor.at_end());

    // An angle bracket that opens an autolink or an email must stay in the
    // paragraph so the inline pass sees it; otherwise it would be eaten as
    // a raw HTML block.
    if autolink_guard(cursor) {
        return lex_paragraph_line(cursor).map(Lexed::Block);
    }

    if let Some((label, def)) = lex_link_def(cursor) {
        return Some(Lexed::LinkDef { label, def });
    }
    if let Some(block) = lex_blank_line(cursor) {
        return Some(Lexed::Block(block));
    }
    if let Some(block) = lex_blockquote(cursor) {
        return Some(Lexed::Block(block));
    }
    if let Some(block) = lex_fenced_code(cursor) {
        return Some(Lexed::Block(block));
    }
    if !in_paragraph {
        // In paragraph context an indented line is a lazy continuation.
        if let Some(block) = lex_indented_code(cursor) {
            return Some(Lexed::Block(block));
        }
    }
    if let Some(block) = lex_thematic_break(cursor) {
        return Some(Lexed::Block(block));
    }
    if let Some(block) = lists::lex_unordered(cursor) {
        return Some(Lexed::Block(block));
    }
    if let Some(block) = lists::lex_ordered(cursor, in_paragraph) {
        return Some(Lexed::Block(block));
    }
    if let Some(block) = lex_atx_heading(cursor) {
        return Some(Lexed::Block(block));
    }
    if let Some(block) = table::lex_table(cursor) {
        return Some(Lexed::Block(block));
    }
    if cursor.at(b'<') {
        if let Some(node) = html::parse_block(cursor) {
            return Some(Lexed::Block(RawBlock::Html(node)));
        }
    }

    lex_paragraph_line(cursor).map(Lexed::Block)
}

/// `<` followed by a space, `>`, or an alpha run followed by one of
/// `:` `@` `\` `+` `.` marks a line the HTML parser must not claim.
fn autolink_guard(cursor: &Cursor<'_>) -> bool {
    if !cursor.at(b'<') {
        return false;
    }
    match cursor.peek_ahead(1) {
        Some(b' ') | Some(b'>') => true,
        Some(b) if b.is_ascii_alphabetic() => {
            let mut n = 2;
            while let Some(b) = cursor.peek_ahead(n) {
                if b.is_ascii_alphabetic() {
                    n += 1;
                } else {
                    return matches!(b, b':' | b'@' | b'\\' | b'+' | b'.');
                }
            }
            false
        }
        _ => false,
    }
}

/// A run of spaces and tabs up to the end of the line.
fn lex_blank_line<'a>(cursor: &mut Cursor<'a>) -> Option<RawBlock<'a>> {
    let checkpoint = cursor.checkpoint();
    cursor.chomp_while(is_space_or_tab);
    if cursor.eat(b'\n') || cursor.at_end() {
        Some(RawBlock::BlankLine)
    } else {
        cursor.rewind(checkpoint);
        None
    }
}

/// `>` after at most three spaces; one space after the marker is eaten.
fn lex_blockquote<'a>(cursor: &mut Cursor<'a>) -> Option<RawBlock<'a>> {
    let checkpoint = cursor.checkpoint();
    if cursor.chomp_while(is_spacebar).len() > 3 || !cursor.eat(b'>') {
        cursor.rewind(checkpoint);
        return None;
    }
    cursor.eat(b' ');
    let line = cursor.consume_line();
    Some(RawBlock::BlockQuote(Cow::Borrowed(line)))
}

/// Fenced code block: at least three backticks or tildes at the start of
/// the line, optional info string, body up to a closing fence of the same
/// character and at least the opening length (or end of input).
fn lex_fenced_code<'a>(cursor: &mut Cursor<'a>) -> Option<RawBlock<'a>> {
    let checkpoint = cursor.checkpoint();
    let fence_char = match cursor.peek() {
        Some(b @ (b'`' | b'~')) => b,
        _ => return None,
    };
    let fence_len = cursor.chomp_run(fence_char);
    if fence_len < 3 {
        cursor.rewind(checkpoint);
        return None;
    }

    let info = cursor.consume_line().trim_matches([' ', '\t']);
    let language = info.split_ascii_whitespace().next();

    let body_start = cursor.checkpoint();
    let body_end = loop {
        if cursor.at_end() {
            break cursor.checkpoint();
        }
        let line_start = cursor.checkpoint();
        let line = cursor.consume_line();
        if is_closing_fence(line, fence_char, fence_len) {
            break line_start;
        }
    };

    let body = cursor.slice_between(body_start, body_end);
    let body = body.strip_suffix('\n').unwrap_or(body);
    Some(RawBlock::CodeBlock {
        body: Cow::Borrowed(body),
        language,
    })
}

fn is_closing_fence(line: &str, fence_char: u8, fence_len: usize) -> bool {
    let bytes = line.as_bytes();
    let run = bytes.iter().take_while(|&&b| b == fence_char).count();
    run >= fence_len && bytes[run..].iter().all(|&b| is_space_or_tab(b))
}

/// Exactly four spaces or a single tab, then one line of code. Indented
/// lines that are all whitespace never reach this point; the blank-line
/// rule claims them first.
fn lex_indented_code<'a>(cursor: &mut Cursor<'a>) -> Option<RawBlock<'a>> {
    if cursor.rest().starts_with("    ") {
        cursor.advance(4);
    } else if !cursor.eat(b'\t') {
        return None;
    }
    let line = cursor.consume_line();
    Some(RawBlock::IndentedCodeBlock(Cow::Borrowed(line)))
}

/// Three or more of the same marker (`-`, `*`, `_`) after at most three
/// spaces, then nothing but spaces and tabs.
fn lex_thematic_break<'a>(cursor: &mut Cursor<'a>) -> Option<RawBlock<'a>> {
    let checkpoint = cursor.checkpoint();
    if cursor.chomp_while(is_spacebar).len() > 3 {
        cursor.rewind(checkpoint);
        return None;
    }
    let marker = match cursor.peek() {
        Some(b @ (b'-' | b'*' | b'_')) => b,
        _ => {
            cursor.rewind(checkpoint);
            return None;
        }
    };
    if cursor.chomp_run(marker) < 3 {
        cursor.rewind(checkpoint);
        return None;
    }
    cursor.chomp_while(is_space_or_tab);
    if cursor.eat(b'\n') || cursor.at_end() {
        Some(RawBlock::ThematicBreak)
    } else {
        cursor.rewind(checkpoint);
        None
    }
}

/// `#` one to six times, a space (or line end), then the heading text with
/// any closing hash run stripped.
fn lex_atx_heading<'a>(cursor: &mut Cursor<'a>) -> Option<RawBlock<'a>> {
    let checkpoint = cursor.checkpoint();
    let level = cursor.chomp_run(b'#');
    if level == 0 || level > 6 {
        cursor.rewind(checkpoint);
        return None;
    }
    match cursor.peek() {
        None => {}
        Some(b' ' | b'\t' | b'\n') => {}
        Some(_) => {
            cursor.rewind(checkpoint);
            return None;
        }
    }
    cursor.chomp_while(is_space_or_tab);
    let text = trim_heading_text(cursor.consume_line());
    Some(RawBlock::Heading {
        level: level as u8,
        text,
    })
}

/// Strip trailing whitespace and a trailing closing-hash run (with the
/// whitespace before it). Hashes glued to the text stay.
fn trim_heading_text(text: &str) -> &str {
    let text = text.trim_end_matches([' ', '\t']);
    let without_hashes = text.trim_end_matches('#');
    if without_hashes.len() == text.len() {
        return text;
    }
    if without_hashes.is_empty() {
        return "";
    }
    let trimmed = without_hashes.trim_end_matches([' ', '\t']);
    if trimmed.len() == without_hashes.len() {
        // `# foo#` keeps its hashes.
        text
    } else {
        trimmed
    }
}

/// `[label]: destination "title"`. The destination may sit on the next
/// line; a successful match feeds the definition table and produces no
/// raw block.
fn lex_link_def<'a>(cursor: &mut Cursor<'a>) -> Option<(String, LinkRefDef)> {
    let checkpoint = cursor.checkpoint();

    if cursor.chomp_while(is_spacebar).len() > 3 || !cursor.eat(b'[') {
        cursor.rewind(checkpoint);
        return None;
    }
    let label = cursor.chomp_until_or_end(b']');
    if label.trim().is_empty() || label.contains('\n') || !cursor.eat(b']') || !cursor.eat(b':') {
        cursor.rewind(checkpoint);
        return None;
    }

    // Optional single line ending between the colon and the destination.
    cursor.chomp_while(is_space_or_tab);
    if cursor.eat(b'\n') {
        cursor.chomp_while(is_space_or_tab);
    }

    let destination = match cursor.peek() {
        Some(b'<') => {
            cursor.bump();
            let dest = cursor.chomp_until_or_end(b'>');
            if dest.contains('\n') || !cursor.eat(b'>') {
                cursor.rewind(checkpoint);
                return None;
            }
            url::percent_encode(dest)
        }
        Some(b) if !is_gfm_whitespace(b) => {
            cursor.chomp_while(|b| !is_gfm_whitespace(b)).to_string()
        }
        _ => {
            cursor.rewind(checkpoint);
            return None;
        }
    };

    cursor.chomp_while(is_space_or_tab);
    let title = match cursor.peek() {
        Some(quote @ (b'"' | b'\'')) => {
            cursor.bump();
            let title = cursor.chomp_until_or_end(quote);
            if !cursor.eat(quote) {
                cursor.rewind(checkpoint);
                return None;
            }
            Some(title.to_string())
        }
        _ => None,
    };

    // Only trailing whitespace may follow on the line.
    cursor.chomp_while(is_space_or_tab);
    if !cursor.eat(b'\n') && !cursor.at_end() {
        cursor.rewind(checkpoint);
        return None;
    }

    Some((
        normalize_label(label),
        LinkRefDef { destination, title },
    ))
}

/// The fallback: one verbatim line with trailing whitespace stripped.
fn lex_paragraph_line<'a>(cursor: &mut Cursor<'a>) -> Option<RawBlock<'a>> {
    if cursor.at_end() || cursor.at(b'\n') {
        return None;
    }
    let line = cursor.consume_line().trim_end_matches([' ', '\t']);
    Some(RawBlock::Body(Cow::Borrowed(line)))
}
