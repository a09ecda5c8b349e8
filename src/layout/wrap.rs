//! Greedy word wrap of colored segments into width-constrained lines.
//!
//! The wrapper walks each item's segments left to right, repeatedly taking
//! the longest prefix of the remaining text that still fits the line,
//! preferring to break just after the last whitespace that fits and falling
//! back to a hard break inside the word. Concatenating the placed chunks of
//! a segment always reconstructs its text exactly; separator gaps between
//! segments are expressed through positions, never inserted characters.

use crate::layout::metrics::TextMetrics;
use crate::layout::{Item, PlacedSegment, WrappedLine};

/// Outcome of searching for a break point within a width budget.
enum BreakPoint {
    /// The whole remaining text fits.
    All,
    /// Break after the whitespace ending at this byte offset.
    AfterSpace(usize),
    /// Hard break: the prefix up to this byte offset fits, the next char
    /// does not. Always > 0.
    Hard(usize),
    /// Not even the first character fits.
    Nothing,
}

/// Find where `text` must break so its prefix measures within `budget`.
///
/// Whitespace boundaries strictly before the overflowing character win over
/// mid-word breaks; fitting exactly at the boundary counts as fitting.
fn break_point(text: &str, budget: f32, font_px: f32, metrics: &dyn TextMetrics) -> BreakPoint {
    let mut last_fit_end = 0usize;
    let mut last_space_end: Option<usize> = None;

    for (byte_idx, ch) in text.char_indices() {
        let prefix_end = byte_idx + ch.len_utf8();
        let width = metrics.measure(&text[..prefix_end], font_px);
        if width > budget {
            if let Some(space_end) = last_space_end {
                return BreakPoint::AfterSpace(space_end);
            }
            if last_fit_end > 0 {
                return BreakPoint::Hard(last_fit_end);
            }
            return BreakPoint::Nothing;
        }
        last_fit_end = prefix_end;
        if ch.is_whitespace() {
            last_space_end = Some(prefix_end);
        }
    }

    BreakPoint::All
}

struct LineBuilder {
    lines: Vec<WrappedLine>,
    current: Vec<PlacedSegment>,
    cursor_x: f32,
    header: bool,
}

impl LineBuilder {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            current: Vec::new(),
            cursor_x: 0.0,
            header: false,
        }
    }

    fn line_is_empty(&self) -> bool {
        self.current.is_empty()
    }

    fn place(&mut self, text: &str, role: crate::layout::ColorRole, x: f32, width: f32) {
        self.current.push(PlacedSegment {
            text: text.to_string(),
            role,
            x,
            width,
        });
        self.cursor_x = x + width;
    }

    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let index = self.lines.len();
        self.lines.push(WrappedLine {
            index,
            segments: std::mem::take(&mut self.current),
            header: self.header,
        });
        self.cursor_x = 0.0;
    }
}

/// Wrap `items` into lines no wider than `max_width_px`.
///
/// Each item starts on a fresh line. Empty segments are skipped entirely and
/// never produce empty lines. The only case in which a produced line may
/// exceed the budget is when a single character is wider than the whole
/// line; exactly one character is then forced to guarantee progress.
pub fn wrap_items(
    items: &[Item],
    max_width_px: f32,
    font_px: f32,
    metrics: &dyn TextMetrics,
) -> Vec<WrappedLine> {
    let space_width = metrics.measure(" ", font_px);
    let mut builder = LineBuilder::new();

    for item in items {
        builder.header = item.header;

        for segment in &item.segments {
            if segment.text.is_empty() {
                continue;
            }
            let mut remaining = segment.text.as_str();

            while !remaining.is_empty() {
                let sep = if builder.line_is_empty() {
                    0.0
                } else {
                    space_width
                };
                let budget = max_width_px - builder.cursor_x - sep;

                let chunk_end = match break_point(remaining, budget, font_px, metrics) {
                    BreakPoint::All => remaining.len(),
                    BreakPoint::AfterSpace(end) | BreakPoint::Hard(end) => end,
                    BreakPoint::Nothing => {
                        if !builder.line_is_empty() {
                            // Retry on a fresh line before giving up.
                            builder.flush();
                            continue;
                        }
                        // Wider than the whole line: force one character.
                        remaining
                            .chars()
                            .next()
                            .map(|ch| ch.len_utf8())
                            .unwrap_or(remaining.len())
                    }
                };

                let chunk = &remaining[..chunk_end];
                let x = builder.cursor_x + sep;
                let width = metrics.measure(chunk, font_px);
                builder.place(chunk, segment.role, x, width);

                remaining = &remaining[chunk_end..];
                if !remaining.is_empty() {
                    builder.flush();
                }
            }
        }

        // Items never share lines; date headers and events start fresh.
        builder.flush();
    }

    builder.lines
}
