//! Soft-wrap layout and scrolling
//!
//! Splits every logical line into screen rows of the text width and keeps the
//! cursor's row inside the visible window.

use unicode_width::UnicodeWidthChar;

use super::document::{Cursor, Document};

/// Width of the line number gutter when shown
pub const GUTTER_WIDTH: usize = 5;
/// Rows below the text area: status line and hint/command line
pub const CHROME_ROWS: u16 = 2;

/// Screen columns a character occupies. Zero-width and control characters
/// still take one cell.
pub fn char_width(ch: char) -> usize {
    ch.width().unwrap_or(1).max(1)
}

/// One screen row's worth of a logical line, `[start, end)` in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapSegment {
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

impl WrapSegment {
    pub fn is_line_start(&self) -> bool {
        self.start == 0
    }
}

/// Split lines into segments of at most `width` display columns. A wide
/// character that would straddle the edge starts the next segment. Empty
/// lines get one zero-length segment.
pub fn wrap_lines(lines: &[String], width: usize) -> Vec<WrapSegment> {
    let width = width.max(1);
    let mut segments = Vec::with_capacity(lines.len());

    for (line, text) in lines.iter().enumerate() {
        let mut start = 0;
        let mut used = 0;
        let mut len = 0;
        for (i, ch) in text.chars().enumerate() {
            let w = char_width(ch);
            if used > 0 && used + w > width {
                segments.push(WrapSegment { line, start, end: i });
                start = i;
                used = 0;
            }
            used += w;
            len = i + 1;
        }
        segments.push(WrapSegment { line, start, end: len });
    }

    segments
}

/// Index of the segment holding the cursor.
///
/// A column on a wrap boundary belongs to the next segment unless it is the
/// end of the line.
pub fn cursor_segment(segments: &[WrapSegment], cursor: Cursor, line_len: usize) -> Option<usize> {
    segments.iter().position(|seg| {
        seg.line == cursor.row
            && ((seg.start <= cursor.col && cursor.col < seg.end)
                || (cursor.col == seg.end && seg.end == line_len))
    })
}

/// Wrap state for the editor viewport
#[derive(Debug)]
pub struct Layout {
    cols: u16,
    rows: u16,
    show_line_numbers: bool,
    segments: Vec<WrapSegment>,
    /// (revision, width) the segments were built for
    built_for: Option<(u64, usize)>,
    scroll: usize,
}

impl Layout {
    pub fn new(cols: u16, rows: u16, show_line_numbers: bool) -> Self {
        Self {
            cols,
            rows,
            show_line_numbers,
            segments: Vec::new(),
            built_for: None,
            scroll: 0,
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn show_line_numbers(&self) -> bool {
        self.show_line_numbers
    }

    pub fn set_line_numbers(&mut self, show: bool) {
        self.show_line_numbers = show;
    }

    pub fn gutter_width(&self) -> usize {
        if self.show_line_numbers {
            GUTTER_WIDTH
        } else {
            0
        }
    }

    /// Columns available for text: viewport minus gutter minus one
    pub fn text_width(&self) -> usize {
        (self.cols as usize)
            .saturating_sub(self.gutter_width() + 1)
            .max(1)
    }

    /// Rows available for text
    pub fn text_rows(&self) -> usize {
        self.rows.saturating_sub(CHROME_ROWS).max(1) as usize
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn segments(&self) -> &[WrapSegment] {
        &self.segments
    }

    /// Segments on screen, top to bottom
    pub fn visible(&self) -> &[WrapSegment] {
        let start = self.scroll.min(self.segments.len());
        let end = (start + self.text_rows()).min(self.segments.len());
        &self.segments[start..end]
    }

    /// Rewrap if the document or the width changed since the last build
    pub fn update(&mut self, doc: &Document) {
        let key = (doc.revision(), self.text_width());
        if self.built_for != Some(key) {
            self.segments = wrap_lines(doc.lines(), key.1);
            self.built_for = Some(key);
        }
    }

    /// Rewrap and scroll by the smallest amount that shows the cursor
    pub fn scroll_to_cursor(&mut self, doc: &Document) {
        self.update(doc);

        let rows = self.text_rows();
        let max_scroll = self.segments.len().saturating_sub(rows);
        self.scroll = self.scroll.min(max_scroll);

        let cursor = doc.cursor();
        let Some(index) = cursor_segment(&self.segments, cursor, doc.line_len(cursor.row)) else {
            return;
        };

        if index < self.scroll {
            self.scroll = index;
        } else if index >= self.scroll + rows {
            self.scroll = index + 1 - rows;
        }
    }

    /// Cursor position on screen as (row, col), gutter included
    pub fn screen_cursor(&self, doc: &Document) -> Option<(usize, usize)> {
        let cursor = doc.cursor();
        let index = cursor_segment(&self.segments, cursor, doc.line_len(cursor.row))?;
        let row = index.checked_sub(self.scroll)?;
        if row >= self.text_rows() {
            return None;
        }
        let seg = self.segments[index];
        let col: usize = doc
            .line(cursor.row)
            .chars()
            .skip(seg.start)
            .take(cursor.col - seg.start)
            .map(char_width)
            .sum();
        Some((row, col + self.gutter_width()))
    }
}
