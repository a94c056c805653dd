//! Table header recognition.
//!
//! Only the header row and its alignment row are parsed; body rows are
//! deferred and the produced table carries none. Both lines must agree on
//! the column count, otherwise the lines fall through to paragraph text.

use crate::ast::Alignment;
use crate::cursor::Cursor;
use crate::limits;

use super::raw::RawBlock;

/// Try to lex a table header: a cell row followed by an alignment row.
pub fn lex_table<'a>(cursor: &mut Cursor<'a>) -> Option<RawBlock<'a>> {
    let checkpoint = cursor.checkpoint();

    let header = cursor.consume_line();
    if !header.contains('|') {
        cursor.rewind(checkpoint);
        return None;
    }
    let delimiter = cursor.consume_line();

    let cells = split_row(header);
    let alignments: Option<Vec<Alignment>> = split_row(delimiter)
        .iter()
        .map(|cell| parse_alignment(cell))
        .collect();

    match alignments {
        Some(alignments)
            if !cells.is_empty()
                && cells.len() == alignments.len()
                && cells.len() <= limits::MAX_TABLE_COLUMNS =>
        {
            let columns = alignments.into_iter().zip(cells).collect();
            Some(RawBlock::Table { columns })
        }
        _ => {
            cursor.rewind(checkpoint);
            None
        }
    }
}

/// Split a row on unescaped pipes, dropping the optional outer pipes and
/// trimming each cell.
fn split_row(row: &str) -> Vec<&str> {
    let row = row.trim_matches([' ', '\t']);
    let row = row.strip_prefix('|').unwrap_or(row);
    let row = row.strip_suffix('|').unwrap_or(row);

    let bytes = row.as_bytes();
    let mut cells = Vec::new();
    let mut cell_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'|' => {
                cells.push(row[cell_start..i].trim_matches([' ', '\t']));
                i += 1;
                cell_start = i;
            }
            _ => i += 1,
        }
    }
    cells.push(row[cell_start..].trim_matches([' ', '\t']));
    cells
}

/// `---` / `:--` / `:-:` / `--:`, at least one dash.
fn parse_alignment(cell: &str) -> Option<Alignment> {
    let left = cell.starts_with(':');
    let right = cell.ends_with(':') && cell.len() > 1;
    let dashes = &cell[usize::from(left)..cell.len() - usize::from(right)];
    if dashes.is_empty() || !dashes.bytes().all(|b| b == b'-') {
        return None;
    }
    Some(match (left, right) {
        (false, false) => Alignment::None,
        (true, false) => Alignment::Left,
        (false, true) => Alignment::Right,
        (true, true) => Alignment::Center,
    })
}
