//! The inline tokenizer.
//!
//! Resolution runs in passes over a shared mark buffer:
//!
//! 1. Scanning: collect delimiter marks in one pass.
//! 2. Code spans: pair backtick runs (highest precedence).
//! 3. Autolinks and raw inline HTML on the remaining `<` marks.
//! 4. Links and images via the bracket stack, consulting the link
//!    reference definitions.
//! 5. Emphasis over the delimiters that survived.
//!
//! The resolved constructs are then replayed in position order to build
//! the inline tree. Link text re-enters the tokenizer recursively (in
//! no-link mode), so nesting is depth-guarded.

mod code_span;
mod emphasis;
mod links;
pub mod marks;

use crate::ast::Inline;
use crate::error::ParseError;
use crate::html::{self, HtmlNode};
use crate::link_ref::LinkRefStore;

use code_span::{resolve_code_spans, span_content};
use emphasis::resolve_emphasis;
use links::{resolve_links, try_parse_autolink, Autolink, ResolvedLink};
use marks::{collect_marks, Mark, MarkBuffer};

/// Inline tokenizer, bound to the document's definition table.
pub struct InlineParser<'d> {
    link_defs: &'d LinkRefStore,
    max_nesting: usize,
}

impl<'d> InlineParser<'d> {
    pub fn new(link_defs: &'d LinkRefStore, max_nesting: usize) -> Self {
        Self {
            link_defs,
            max_nesting,
        }
    }

    /// Tokenize one block body. `row` is attached to any error produced.
    pub fn parse(&self, text: &str, row: usize) -> Result<Vec<Inline>, ParseError> {
        self.parse_nested(text, row, 0, true)
    }

    fn parse_nested(
        &self,
        text: &str,
        row: usize,
        depth: usize,
        allow_links: bool,
    ) -> Result<Vec<Inline>, ParseError> {
        if depth > self.max_nesting {
            return Err(ParseError::NestingLimit {
                row,
                limit: self.max_nesting,
            });
        }

        let mut buffer = MarkBuffer::new();
        collect_marks(text, &mut buffer);
        if buffer.is_empty() {
            return Ok(if text.is_empty() {
                Vec::new()
            } else {
                vec![Inline::Text(text.to_string())]
            });
        }

        let code_spans = resolve_code_spans(buffer.marks_mut());
        let code_ranges: Vec<(u32, u32)> = code_spans
            .iter()
            .map(|cs| (cs.opener_pos, cs.closer_end))
            .collect();

        let (autolinks, html_spans) = find_angle_constructs(text, buffer.marks(), &code_ranges);
        let angle_ranges: Vec<(u32, u32)> = autolinks
            .iter()
            .map(|al| (al.start, al.end))
            .chain(html_spans.iter().map(|(_, s, e)| (*s, *e)))
            .collect();
        resolve_marks_in_ranges(buffer.marks_mut(), &angle_ranges);

        let resolved_links = resolve_links(text, buffer.marks(), self.link_defs, allow_links)
            .map_err(|_| ParseError::Inline {
                row,
                message: "too many open brackets".into(),
            })?;
        let link_ranges: Vec<(u32, u32)> =
            resolved_links.iter().map(|l| (l.start, l.end)).collect();
        resolve_marks_in_ranges(buffer.marks_mut(), &link_ranges);

        let emphasis_matches = resolve_emphasis(buffer.marks_mut());

        // Replay everything in position order.
        let mut events = Vec::new();
        for span in &code_spans {
            if pos_in_ranges(span.opener_pos, &link_ranges) {
                continue;
            }
            events.push(Event {
                pos: span.opener_pos,
                end: span.closer_end,
                kind: EventKind::Code(span_content(text, span)),
            });
        }
        for (i, al) in autolinks.iter().enumerate() {
            if pos_in_ranges(al.start, &link_ranges) {
                continue;
            }
            events.push(Event {
                pos: al.start,
                end: al.end,
                kind: EventKind::Autolink(i),
            });
        }
        for (i, (_, start, end)) in html_spans.iter().enumerate() {
            if pos_in_ranges(*start, &link_ranges) {
                continue;
            }
            events.push(Event {
                pos: *start,
                end: *end,
                kind: EventKind::Html(i),
            });
        }
        for (i, link) in resolved_links.iter().enumerate() {
            // A link nested inside another construct's range is rebuilt by
            // that construct's recursive parse.
            let contained = resolved_links
                .iter()
                .any(|outer| outer.start < link.start && link.end <= outer.end);
            if contained {
                continue;
            }
            events.push(Event {
                pos: link.start,
                end: link.end,
                kind: EventKind::Link(i),
            });
        }
        for m in &emphasis_matches {
            events.push(Event {
                pos: m.opener_start,
                end: m.opener_end,
                kind: EventKind::Open {
                    strong: m.count == 2,
                },
            });
            events.push(Event {
                pos: m.closer_start,
                end: m.closer_end,
                kind: EventKind::Close {
                    strong: m.count == 2,
                },
            });
        }
        for mark in buffer.marks() {
            if mark.is_resolved() || mark.in_code() {
                continue;
            }
            match mark.ch {
                b'\\' => {
                    let escaped = text.as_bytes()[mark.pos as usize + 1];
                    events.push(Event {
                        pos: mark.pos,
                        end: mark.end,
                        kind: if escaped == b'\n' {
                            EventKind::HardBreak
                        } else {
                            EventKind::Escape(escaped as char)
                        },
                    });
                }
                b'\n' => events.push(Event {
                    pos: mark.pos,
                    end: mark.end,
                    kind: EventKind::HardBreak,
                }),
                _ => {}
            }
        }
        events.sort_by_key(|e| e.pos);

        self.build_tree(text, events, &autolinks, &html_spans, &resolved_links, row, depth)
    }

    fn build_tree(
        &self,
        text: &str,
        events: Vec<Event>,
        autolinks: &[Autolink],
        html_spans: &[(HtmlNode, u32, u32)],
        resolved_links: &[ResolvedLink],
        row: usize,
        depth: usize,
    ) -> Result<Vec<Inline>, ParseError> {
        let mut tree = TreeBuilder::new();
        let mut last_end = 0u32;

        for event in events {
            // A construct that overlaps an earlier one (a code span
            // reaching past a link's closing parenthesis) lost the race;
            // its characters are already spoken for.
            if event.pos < last_end {
                continue;
            }
            tree.text(&text[last_end as usize..event.pos as usize]);
            match event.kind {
                EventKind::Code(content) => {
                    tree.push(Inline::CodeSpan(content));
                }
                EventKind::Autolink(i) => {
                    let al = &autolinks[i];
                    let uri = &text[al.content_start as usize..al.content_end as usize];
                    let destination = if al.is_email {
                        format!("mailto:{uri}")
                    } else {
                        uri.to_string()
                    };
                    tree.push(Inline::Link {
                        destination,
                        title: None,
                        content: vec![Inline::Text(uri.to_string())],
                    });
                }
                EventKind::Html(i) => {
                    tree.push(Inline::Html(html_spans[i].0.clone()));
                }
                EventKind::Link(i) => {
                    let link = &resolved_links[i];
                    let body = &text[link.text_start as usize..link.text_end as usize];
                    // Link text cannot hold further links; image alt can.
                    let content =
                        self.parse_nested(body, row, depth + 1, link.is_image)?;
                    tree.push(if link.is_image {
                        Inline::Image {
                            src: link.destination.clone(),
                            title: link.title.clone(),
                            alt: content,
                        }
                    } else {
                        Inline::Link {
                            destination: link.destination.clone(),
                            title: link.title.clone(),
                            content,
                        }
                    });
                }
                EventKind::Open { strong } => tree.open(strong),
                EventKind::Close { strong } => tree.close(strong),
                EventKind::Escape(ch) => tree.text_char(ch),
                EventKind::HardBreak => tree.push(Inline::HardLineBreak),
            }
            last_end = event.end;
        }

        tree.text(&text[last_end as usize..]);
        Ok(tree.finish())
    }
}

#[derive(Debug)]
struct Event {
    pos: u32,
    end: u32,
    kind: EventKind,
}

#[derive(Debug)]
enum EventKind {
    Code(String),
    Autolink(usize),
    Html(usize),
    Link(usize),
    Open { strong: bool },
    Close { strong: bool },
    Escape(char),
    HardBreak,
}

/// Frame-stack tree builder with text coalescence.
struct TreeBuilder {
    /// `frames[0]` is the root; inner frames are open emphasis spans.
    frames: Vec<(bool, Vec<Inline>)>,
    text_buf: String,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            frames: vec![(false, Vec::new())],
            text_buf: String::new(),
        }
    }

    fn text(&mut self, s: &str) {
        self.text_buf.push_str(s);
    }

    fn text_char(&mut self, ch: char) {
        self.text_buf.push(ch);
    }

    fn flush(&mut self) {
        if !self.text_buf.is_empty() {
            let text = std::mem::take(&mut self.text_buf);
            self.current().push(Inline::Text(text));
        }
    }

    fn current(&mut self) -> &mut Vec<Inline> {
        &mut self.frames.last_mut().expect("root frame").1
    }

    fn push(&mut self, inline: Inline) {
        self.flush();
        self.current().push(inline);
    }

    fn open(&mut self, strong: bool) {
        self.flush();
        self.frames.push((strong, Vec::new()));
    }

    fn close(&mut self, strong: bool) {
        self.flush();
        // The resolver emits balanced pairs; never pop the root frame.
        if self.frames.len() == 1 {
            return;
        }
        let (opened_strong, children) = self.frames.pop().expect("open frame");
        debug_assert_eq!(opened_strong, strong);
        let wrapped = if opened_strong {
            Inline::Strong(children)
        } else {
            Inline::Emphasis(children)
        };
        self.current().push(wrapped);
    }

    fn finish(mut self) -> Vec<Inline> {
        self.flush();
        debug_assert_eq!(self.frames.len(), 1, "unbalanced emphasis events");
        while self.frames.len() > 1 {
            let (strong, children) = self.frames.pop().expect("open frame");
            let wrapped = if strong {
                Inline::Strong(children)
            } else {
                Inline::Emphasis(children)
            };
            self.current().push(wrapped);
        }
        self.frames.pop().expect("root frame").1
    }
}

/// Autolinks and raw HTML found on unresolved `<` marks, left to right.
/// Code spans resolve first, so a candidate that would swallow one (a
/// backtick pair inside a quoted attribute, say) is rejected.
fn find_angle_constructs(
    text: &str,
    marks: &[Mark],
    code_ranges: &[(u32, u32)],
) -> (Vec<Autolink>, Vec<(HtmlNode, u32, u32)>) {
    let mut autolinks = Vec::new();
    let mut html_spans = Vec::new();
    let mut scan_end = 0usize;

    let clear_of_code = |start: u32, end: u32| {
        !code_ranges.iter().any(|&(s, e)| start < e && s < end)
    };

    for mark in marks {
        if mark.ch != b'<' || mark.in_code() || (mark.pos as usize) < scan_end {
            continue;
        }
        let pos = mark.pos as usize;
        if let Some(al) = try_parse_autolink(text, pos) {
            if clear_of_code(al.start, al.end) {
                scan_end = al.end as usize;
                autolinks.push(al);
            }
        } else if let Some((node, end)) = html::parse_inline(text, pos) {
            if clear_of_code(pos as u32, end as u32) {
                html_spans.push((node, pos as u32, end as u32));
                scan_end = end;
            }
        }
    }

    (autolinks, html_spans)
}

/// Flag every mark inside one of the (sorted or unsorted) ranges as
/// resolved so later passes skip it.
fn resolve_marks_in_ranges(marks: &mut [Mark], ranges: &[(u32, u32)]) {
    if ranges.is_empty() {
        return;
    }
    for mark in marks {
        if ranges.iter().any(|&(s, e)| mark.pos >= s && mark.pos < e) {
            mark.resolve();
        }
    }
}

fn pos_in_ranges(pos: u32, ranges: &[(u32, u32)]) -> bool {
    ranges.iter().any(|&(s, e)| pos >= s && pos < e)
}
