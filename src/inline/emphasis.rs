//! Emphasis and strong emphasis resolution.
//!
//! Delimiter runs are walked left to right. Each potential closer scans
//! back for the nearest compatible opener; if both sides have at least
//! two delimiters remaining the pair consumes two and forms strong
//! emphasis, otherwise one. When a single opener run pairs repeatedly
//! with a single closer run, the layers are reordered so strong wraps
//! emphasis.

use super::marks::Mark;

/// A matched opener/closer pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmphasisMatch {
    /// Start of the opener delimiter characters.
    pub opener_start: u32,
    /// End of the opener delimiter characters.
    pub opener_end: u32,
    /// Start of the closer delimiter characters.
    pub closer_start: u32,
    /// End of the closer delimiter characters.
    pub closer_end: u32,
    /// Characters consumed per side: 1 for emphasis, 2 for strong.
    pub count: u32,
    /// The delimiter character.
    pub ch: u8,
}

/// Resolve emphasis over the mark buffer. Marks flagged as resolved or
/// inside code spans never participate. Returned matches are properly
/// nested and sorted by opener position.
pub fn resolve_emphasis(marks: &mut [Mark]) -> Vec<EmphasisMatch> {
    let mut matches = Vec::new();
    // One opener stack per delimiter character.
    let mut stacks: [Vec<usize>; 2] = [Vec::new(), Vec::new()];

    for i in 0..marks.len() {
        let mark = marks[i];
        if (mark.ch != b'*' && mark.ch != b'_') || mark.is_resolved() || mark.in_code() {
            continue;
        }
        let which = usize::from(mark.ch == b'_');

        if mark.can_close() {
            close_repeatedly(marks, i, which, &mut stacks, &mut matches);
        }

        let mark = marks[i];
        if !mark.is_resolved() && mark.len() > 0 && mark.can_open() {
            stacks[which].push(i);
        }
    }

    matches.sort_by_key(|m| m.opener_start);
    reorder_concentric(&mut matches);
    matches
}

/// Keep pairing the closer at `i` against the nearest opener until either
/// side runs out.
fn close_repeatedly(
    marks: &mut [Mark],
    i: usize,
    which: usize,
    stacks: &mut [Vec<usize>; 2],
    matches: &mut Vec<EmphasisMatch>,
) {
    loop {
        if marks[i].is_resolved() || marks[i].len() == 0 {
            return;
        }

        // Nearest live opener of the same character.
        let opener_idx = loop {
            match stacks[which].last() {
                Some(&j) if marks[j].is_resolved() || marks[j].len() == 0 => {
                    stacks[which].pop();
                }
                Some(&j) => break j,
                None => return,
            }
        };

        let take = if marks[opener_idx].len() >= 2 && marks[i].len() >= 2 {
            2
        } else {
            1
        };

        matches.push(EmphasisMatch {
            opener_start: marks[opener_idx].end - take,
            opener_end: marks[opener_idx].end,
            closer_start: marks[i].pos,
            closer_end: marks[i].pos + take,
            count: take,
            ch: marks[i].ch,
        });

        // Openers left hanging between the pair can never match again.
        for stack in stacks.iter_mut() {
            while matches!(stack.last(), Some(&j) if j > opener_idx) {
                stack.pop();
            }
        }

        let opener = &mut marks[opener_idx];
        opener.end -= take;
        if opener.len() == 0 {
            opener.resolve();
            stacks[which].pop();
        }

        let closer = &mut marks[i];
        closer.pos += take;
        if closer.len() == 0 {
            closer.resolve();
            return;
        }
    }
}

/// Where one run pairs with one other run more than once, the matches are
/// concentric with no content between the layers; reorder them so the
/// 2-consuming (strong) layers sit outermost: `***foo***` becomes
/// strong-around-emphasis.
fn reorder_concentric(matches: &mut [EmphasisMatch]) {
    let mut start = 0;
    while start < matches.len() {
        let mut end = start + 1;
        while end < matches.len() && is_concentric(&matches[end - 1], &matches[end]) {
            end += 1;
        }
        if end - start > 1 {
            rebuild_chain(&mut matches[start..end]);
        }
        start = end;
    }
}

/// Concentric layers only arise when one maximal run pairs against one
/// other maximal run, so the characters must agree; `*__x__*` is adjacent
/// but not a chain.
fn is_concentric(outer: &EmphasisMatch, inner: &EmphasisMatch) -> bool {
    outer.ch == inner.ch
        && outer.opener_end == inner.opener_start
        && inner.closer_end == outer.closer_start
}

/// Reassign delimiter ranges across a concentric chain so the largest
/// counts come first (outermost). The chain's total extent is unchanged.
fn rebuild_chain(chain: &mut [EmphasisMatch]) {
    let opener_start = chain[0].opener_start;
    let closer_end = chain[0].closer_end;

    let mut counts: Vec<u32> = chain.iter().map(|m| m.count).collect();
    counts.sort_unstable_by(|a, b| b.cmp(a));

    let mut open_at = opener_start;
    let mut close_at = closer_end;
    for (m, count) in chain.iter_mut().zip(counts) {
        m.count = count;
        m.opener_start = open_at;
        m.opener_end = open_at + count;
        m.closer_start = close_at - count;
        m.closer_end = close_at;
        open_at += count;
        close_at -= count;
    }
}
