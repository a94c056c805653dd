//! Link, image, and autolink resolution.
//!
//! Implements the CommonMark bracket algorithm: `[` and `![` openers go
//! on a stack, and every `]` tries to finish a construct in one of three
//! shapes - inline `](dest "title")`, reference `][label]` / `[]`, or
//! shortcut `[label]`. A successful link deactivates the earlier plain
//! `[` openers so links never nest; images leave the stack alone.

use crate::limits;
use crate::link_ref::LinkRefStore;

use super::marks::{flags, Mark};

/// A resolved link or image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    /// Start of the construct (`[`, or the `!` for images).
    pub start: u32,
    /// First byte of the bracketed text.
    pub text_start: u32,
    /// The `]` closing the bracketed text.
    pub text_end: u32,
    /// One past the end of the whole construct.
    pub end: u32,
    pub destination: String,
    pub title: Option<String>,
    pub is_image: bool,
}

/// A resolved autolink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Autolink {
    /// The `<`.
    pub start: u32,
    /// One past the `>`.
    pub end: u32,
    pub content_start: u32,
    pub content_end: u32,
    pub is_email: bool,
}

/// The bracket stack grew past [`limits::MAX_BRACKET_DEPTH`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketOverflow;

#[derive(Debug)]
struct Opener {
    pos: u32,
    is_image: bool,
    active: bool,
}

/// Resolve links and images over the collected marks. With `allow_links`
/// false (inside a link's own text) only images may resolve; would-be
/// links fall back to literal brackets.
pub fn resolve_links(
    text: &str,
    marks: &[Mark],
    defs: &LinkRefStore,
    allow_links: bool,
) -> Result<Vec<ResolvedLink>, BracketOverflow> {
    let mut stack: Vec<Opener> = Vec::new();
    let mut links = Vec::new();
    // Marks below this offset were consumed by an earlier construct.
    let mut skip_until = 0u32;

    for mark in marks {
        if mark.pos < skip_until || mark.in_code() || mark.is_resolved() {
            continue;
        }
        match mark.ch {
            b'[' => {
                stack.push(Opener {
                    pos: mark.pos,
                    is_image: mark.flags & flags::IMAGE != 0,
                    active: true,
                });
                if stack.len() > limits::MAX_BRACKET_DEPTH {
                    return Err(BracketOverflow);
                }
            }
            b']' => {
                let Some(opener) = stack.pop() else { continue };
                if !opener.active {
                    continue;
                }
                let Some((destination, title, end)) =
                    try_finish(text, defs, opener.pos, mark.pos)
                else {
                    continue;
                };
                if !opener.is_image && !allow_links {
                    continue;
                }

                if !opener.is_image {
                    for earlier in stack.iter_mut() {
                        if !earlier.is_image {
                            earlier.active = false;
                        }
                    }
                }
                links.push(ResolvedLink {
                    start: if opener.is_image {
                        opener.pos - 1
                    } else {
                        opener.pos
                    },
                    text_start: opener.pos + 1,
                    text_end: mark.pos,
                    end: end as u32,
                    destination,
                    title,
                    is_image: opener.is_image,
                });
                skip_until = end as u32;
            }
            _ => {}
        }
    }

    Ok(links)
}

/// Try the three closing shapes at a `]`. Returns destination, title, and
/// the offset one past the construct.
fn try_finish(
    text: &str,
    defs: &LinkRefStore,
    open_pos: u32,
    close_pos: u32,
) -> Option<(String, Option<String>, usize)> {
    let after = close_pos as usize + 1;
    let bracket_text = &text[open_pos as usize + 1..close_pos as usize];

    match text.as_bytes().get(after) {
        Some(b'(') => parse_inline_form(text, after + 1),
        Some(b'[') => {
            let label_end = scan_label(text, after + 1)?;
            let label = &text[after + 1..label_end];
            let label = if label.is_empty() { bracket_text } else { label };
            let def = defs.lookup(label)?;
            Some((
                def.destination.clone(),
                def.title.clone(),
                label_end + 1,
            ))
        }
        _ => {
            let def = defs.lookup(bracket_text)?;
            Some((def.destination.clone(), def.title.clone(), after))
        }
    }
}

/// `dest "title")` with the cursor just past the opening parenthesis.
fn parse_inline_form(text: &str, start: usize) -> Option<(String, Option<String>, usize)> {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut pos = start;

    while pos < len && matches!(bytes[pos], b' ' | b'\t' | b'\n') {
        pos += 1;
    }
    if pos >= len {
        return None;
    }

    let destination = if bytes[pos] == b'<' {
        pos += 1;
        let dest_start = pos;
        while pos < len && !matches!(bytes[pos], b'>' | b'\n' | b'<') {
            if bytes[pos] == b'\\' && pos + 1 < len {
                pos += 2;
            } else {
                pos += 1;
            }
        }
        if pos >= len || bytes[pos] != b'>' {
            return None;
        }
        let dest = &text[dest_start..pos];
        pos += 1;
        unescape(dest)
    } else {
        let dest_start = pos;
        let mut paren_depth = 0u32;
        while pos < len {
            match bytes[pos] {
                b'(' => {
                    paren_depth += 1;
                    if paren_depth > limits::MAX_LINK_PAREN_DEPTH as u32 {
                        return None;
                    }
                    pos += 1;
                }
                b')' => {
                    if paren_depth == 0 {
                        break;
                    }
                    paren_depth -= 1;
                    pos += 1;
                }
                b' ' | b'\t' | b'\n' => break,
                b'\\' if pos + 1 < len => pos += 2,
                _ => pos += 1,
            }
        }
        unescape(&text[dest_start..pos])
    };

    while pos < len && matches!(bytes[pos], b' ' | b'\t' | b'\n') {
        pos += 1;
    }
    if pos >= len {
        return None;
    }

    let title = match bytes[pos] {
        b')' => None,
        b'"' | b'\'' | b'(' => {
            let closer = if bytes[pos] == b'(' { b')' } else { bytes[pos] };
            pos += 1;
            let title_start = pos;
            while pos < len && bytes[pos] != closer {
                if bytes[pos] == b'\\' && pos + 1 < len {
                    pos += 2;
                } else {
                    pos += 1;
                }
            }
            if pos >= len {
                return None;
            }
            let title = unescape(&text[title_start..pos]);
            pos += 1;
            while pos < len && matches!(bytes[pos], b' ' | b'\t' | b'\n') {
                pos += 1;
            }
            if pos >= len || bytes[pos] != b')' {
                return None;
            }
            Some(title)
        }
        _ => return None,
    };

    Some((destination, title, pos + 1))
}

/// Find the `]` ending a reference label. Labels cannot contain unescaped
/// brackets.
fn scan_label(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut pos = start;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b']' => return Some(pos),
            b'[' => return None,
            _ => pos += 1,
        }
    }
    None
}

/// Remove backslashes that escape ASCII punctuation.
fn unescape(s: &str) -> String {
    if !s.contains('\\') {
        return s.to_string();
    }
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && bytes.get(i + 1).is_some_and(u8::is_ascii_punctuation) {
            i += 1;
        }
        let ch_len = next_char_len(s, i);
        out.push_str(&s[i..i + ch_len]);
        i += ch_len;
    }
    out
}

fn next_char_len(s: &str, i: usize) -> usize {
    s[i..].chars().next().map_or(1, char::len_utf8)
}

/// Try to parse an autolink at `<`.
pub fn try_parse_autolink(text: &str, start: usize) -> Option<Autolink> {
    let bytes = text.as_bytes();
    let len = bytes.len();
    if bytes.get(start) != Some(&b'<') {
        return None;
    }

    let content_start = start + 1;
    let mut pos = content_start;
    while pos < len && !matches!(bytes[pos], b'>' | b' ' | b'\n' | b'<') {
        pos += 1;
    }
    if pos >= len || bytes[pos] != b'>' {
        return None;
    }

    let content = &bytes[content_start..pos];
    let is_email = if is_uri_autolink(content) {
        false
    } else if is_email_autolink(content) {
        true
    } else {
        return None;
    };

    Some(Autolink {
        start: start as u32,
        end: (pos + 1) as u32,
        content_start: content_start as u32,
        content_end: pos as u32,
        is_email,
    })
}

/// Scheme of 2-32 chars starting with a letter, a colon, and a non-empty
/// remainder.
fn is_uri_autolink(content: &[u8]) -> bool {
    if content.len() < 4 {
        return false;
    }
    if !content[0].is_ascii_alphabetic() {
        return false;
    }
    let mut pos = 1;
    while pos < content.len() && pos < 32 {
        let b = content[pos];
        if b == b':' {
            break;
        }
        if !b.is_ascii_alphanumeric() && b != b'+' && b != b'-' && b != b'.' {
            return false;
        }
        pos += 1;
    }
    pos >= 2 && pos < content.len() && content[pos] == b':' && pos + 1 < content.len()
}

/// `local@domain` with a dotted domain.
fn is_email_autolink(content: &[u8]) -> bool {
    let Some(at_pos) = content.iter().position(|&b| b == b'@') else {
        return false;
    };
    if at_pos == 0 || at_pos + 1 >= content.len() {
        return false;
    }
    let local = &content[..at_pos];
    let domain = &content[at_pos + 1..];

    local.iter().all(|&b| {
        b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_' | b'+')
    }) && domain
        .iter()
        .all(|&b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-'))
        && domain.contains(&b'.')
}
