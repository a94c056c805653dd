//! Ordered and unordered list recognition.
//!
//! A list is lexed as one raw block: the opener marker decides the
//! flavor, and item parsing repeats until a line no longer carries a
//! matching marker. Unordered items may carry a task checkbox.

use crate::ast::TaskState;
use crate::cursor::{is_spacebar, Cursor};
use crate::limits;

use super::raw::{RawBlock, RawListItem};

/// Try to lex an unordered list: `-`, `*`, or `+` followed by at least one
/// space. Subsequent items must repeat the same bullet character.
pub fn lex_unordered<'a>(cursor: &mut Cursor<'a>) -> Option<RawBlock<'a>> {
    let checkpoint = cursor.checkpoint();
    let bullet = match cursor.peek() {
        Some(b @ (b'-' | b'*' | b'+')) => b,
        _ => return None,
    };
    cursor.bump();

    if cursor.chomp_while(is_spacebar).is_empty() {
        cursor.rewind(checkpoint);
        return None;
    }

    let mut items = vec![item_from_body(cursor.consume_line())];
    while let Some(item) = lex_unordered_item(cursor, bullet) {
        items.push(item);
    }
    Some(RawBlock::UnorderedList(items))
}

/// A subsequent item of the same flavor; an empty body (immediate newline)
/// is allowed here.
fn lex_unordered_item<'a>(cursor: &mut Cursor<'a>, bullet: u8) -> Option<RawListItem<'a>> {
    let checkpoint = cursor.checkpoint();
    if !cursor.eat(bullet) {
        return None;
    }
    if cursor.chomp_while(is_spacebar).is_empty() && !cursor.at(b'\n') && !cursor.at_end() {
        cursor.rewind(checkpoint);
        return None;
    }
    Some(item_from_body(cursor.consume_line()))
}

/// Split a task checkbox off the front of an item body.
fn item_from_body(body: &str) -> RawListItem<'_> {
    let (task, rest) = task_marker(body);
    RawListItem {
        task,
        body: rest.trim_end_matches([' ', '\t']),
    }
}

/// `[ ]` is incomplete, `[x]` / `[X]` is complete; the checkbox must be
/// followed by whitespace or the end of the item body.
fn task_marker(body: &str) -> (TaskState, &str) {
    let bytes = body.as_bytes();
    if bytes.len() < 3 || bytes[0] != b'[' || bytes[2] != b']' {
        return (TaskState::None, body);
    }
    let state = match bytes[1] {
        b' ' => TaskState::Incomplete,
        b'x' | b'X' => TaskState::Complete,
        _ => return (TaskState::None, body),
    };
    match bytes.get(3) {
        None => (state, ""),
        Some(b' ' | b'\t') => (state, body[4..].trim_start_matches([' ', '\t'])),
        Some(_) => (TaskState::None, body),
    }
}

/// Try to lex an ordered list: up to nine digits, `.` or `)`, then at
/// least one space. In paragraph context the starting index must be
/// exactly 1, otherwise the marker is handed back to other parsers.
pub fn lex_ordered<'a>(cursor: &mut Cursor<'a>, in_paragraph: bool) -> Option<RawBlock<'a>> {
    let checkpoint = cursor.checkpoint();
    let (start, delimiter) = match lex_ordered_marker(cursor) {
        Some(marker) => marker,
        None => {
            cursor.rewind(checkpoint);
            return None;
        }
    };

    if cursor.chomp_while(is_spacebar).is_empty() {
        cursor.rewind(checkpoint);
        return None;
    }

    if in_paragraph && start != 1 {
        cursor.rewind(checkpoint);
        return None;
    }

    let mut items = vec![trim_item(cursor.consume_line())];
    while let Some(body) = lex_ordered_item(cursor, delimiter) {
        items.push(body);
    }
    Some(RawBlock::OrderedList { start, items })
}

/// Digits plus delimiter, without the required trailing space.
fn lex_ordered_marker(cursor: &mut Cursor<'_>) -> Option<(u32, u8)> {
    let digits = cursor.chomp_while(|b| b.is_ascii_digit());
    if digits.is_empty() || digits.len() > limits::MAX_LIST_MARKER_DIGITS {
        return None;
    }
    let delimiter = match cursor.peek() {
        Some(b @ (b'.' | b')')) => b,
        _ => return None,
    };
    cursor.bump();
    // Nine digits max, so the value always fits.
    Some((digits.parse().ok()?, delimiter))
}

fn lex_ordered_item<'a>(cursor: &mut Cursor<'a>, delimiter: u8) -> Option<&'a str> {
    let checkpoint = cursor.checkpoint();
    match lex_ordered_marker(cursor) {
        Some((_, d)) if d == delimiter => {}
        _ => {
            cursor.rewind(checkpoint);
            return None;
        }
    }
    if cursor.chomp_while(is_spacebar).is_empty() && !cursor.at(b'\n') && !cursor.at_end() {
        cursor.rewind(checkpoint);
        return None;
    }
    Some(trim_item(cursor.consume_line()))
}

fn trim_item(body: &str) -> &str {
    body.trim_end_matches([' ', '\t'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unordered(input: &str) -> Option<RawBlock<'_>> {
        lex_unordered(&mut Cursor::new(input))
    }

    fn ordered(input: &str, in_paragraph: bool) -> Option<RawBlock<'_>> {
        lex_ordered(&mut Cursor::new(input), in_paragraph)
    }

    fn items(block: RawBlock<'_>) -> Vec<RawListItem<'_>> {
        match block {
            RawBlock::UnorderedList(items) => items,
            other => panic!("expected unordered list, got {other:?}"),
        }
    }

    #[test]
    fn test_unordered_single_item() {
        let items = items(unordered("- item\n").unwrap());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].body, "item");
        assert_eq!(items[0].task, TaskState::None);
    }

    #[test]
    fn test_unordered_multiple_items() {
        let items = items(unordered("- a\n- b\n- c\n").unwrap());
        assert_eq!(
            items.iter().map(|i| i.body).collect::<Vec<_>>(),
            ["a", "b", "c"]
        );
    }

    #[test]
    fn test_unordered_stops_at_other_bullet() {
        let mut cursor = Cursor::new("- a\n* b\n");
        let items = items(lex_unordered(&mut cursor).unwrap());
        assert_eq!(items.len(), 1);
        assert_eq!(cursor.rest(), "* b\n");
    }

    #[test]
    fn test_unordered_requires_space() {
        assert!(unordered("-item\n").is_none());
    }

    #[test]
    fn test_unordered_empty_subsequent_item() {
        let items = items(unordered("- a\n-\n").unwrap());
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].body, "");
    }

    #[test]
    fn test_task_markers() {
        let items = items(unordered("- [ ] todo\n- [x] done\n- [X] also\n").unwrap());
        assert_eq!(items[0].task, TaskState::Incomplete);
        assert_eq!(items[0].body, "todo");
        assert_eq!(items[1].task, TaskState::Complete);
        assert_eq!(items[1].body, "done");
        assert_eq!(items[2].task, TaskState::Complete);
    }

    #[test]
    fn test_task_marker_needs_following_space() {
        let items = items(unordered("- [ ]no space\n").unwrap());
        assert_eq!(items[0].task, TaskState::None);
        assert_eq!(items[0].body, "[ ]no space");
    }

    #[test]
    fn test_not_a_task_marker() {
        let items = items(unordered("- [a] nope\n").unwrap());
        assert_eq!(items[0].task, TaskState::None);
    }

    #[test]
    fn test_ordered_basic() {
        match ordered("1. a\n2. b\n", false).unwrap() {
            RawBlock::OrderedList { start, items } => {
                assert_eq!(start, 1);
                assert_eq!(items, ["a", "b"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_ordered_custom_start() {
        match ordered("5. a\n6. b\n", false).unwrap() {
            RawBlock::OrderedList { start, items } => {
                assert_eq!(start, 5);
                assert_eq!(items.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_ordered_paren_delimiter() {
        assert!(ordered("1) a\n", false).is_some());
    }

    #[test]
    fn test_ordered_delimiter_must_match() {
        let mut cursor = Cursor::new("1. a\n2) b\n");
        match lex_ordered(&mut cursor, false).unwrap() {
            RawBlock::OrderedList { items, .. } => assert_eq!(items.len(), 1),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(cursor.rest(), "2) b\n");
    }

    #[test]
    fn test_ordered_in_paragraph_must_start_at_one() {
        let mut cursor = Cursor::new("2. item\n");
        assert!(lex_ordered(&mut cursor, true).is_none());
        assert_eq!(cursor.offset(), 0);
        assert!(ordered("1. item\n", true).is_some());
    }

    #[test]
    fn test_ordered_too_many_digits() {
        assert!(ordered("1234567890. a\n", false).is_none());
    }

    #[test]
    fn test_ordered_requires_space() {
        let mut cursor = Cursor::new("1.no\n");
        assert!(lex_ordered(&mut cursor, false).is_none());
        assert_eq!(cursor.offset(), 0);
    }
}
