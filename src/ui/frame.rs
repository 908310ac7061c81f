//! Off-screen frame
//!
//! The view composes a full frame of styled cells; the renderer diffs it
//! against the previous one and writes only the rows that changed.

use crate::config::Role;
use crate::core::term::{AnsiColor, AttrFlags};

/// Foreground color source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ink {
    /// A theme role
    Role(Role),
    /// A color set by the shell
    Ansi(AnsiColor),
}

/// Cell style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub fg: Ink,
    pub bg: Role,
    pub flags: AttrFlags,
}

impl Style {
    pub fn new(fg: Role, bg: Role) -> Self {
        Self {
            fg: Ink::Role(fg),
            bg,
            flags: AttrFlags::empty(),
        }
    }

    pub fn with(mut self, flags: AttrFlags) -> Self {
        self.flags |= flags;
        self
    }
}

impl Default for Style {
    fn default() -> Self {
        Style::new(Role::Foreground, Role::Background)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCell {
    pub ch: char,
    pub style: Style,
}

impl FrameCell {
    /// Placeholder covered by the wide character to its left
    pub const CONTINUATION: char = '\0';

    pub fn is_continuation(&self) -> bool {
        self.ch == Self::CONTINUATION
    }
}

impl Default for FrameCell {
    fn default() -> Self {
        Self {
            ch: ' ',
            style: Style::default(),
        }
    }
}

/// A grid of styled cells plus the hardware cursor position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    cols: u16,
    rows: u16,
    cells: Vec<FrameCell>,
    /// (col, row) of the visible cursor
    pub cursor: Option<(u16, u16)>,
}

impl Frame {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            cells: vec![FrameCell::default(); cols as usize * rows as usize],
            cursor: None,
        }
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn get(&self, x: u16, y: u16) -> Option<&FrameCell> {
        if x >= self.cols || y >= self.rows {
            return None;
        }
        self.cells.get(y as usize * self.cols as usize + x as usize)
    }

    /// Set one cell. Out of bounds writes are dropped.
    pub fn set(&mut self, x: u16, y: u16, ch: char, style: Style) {
        if x >= self.cols || y >= self.rows {
            return;
        }
        let index = y as usize * self.cols as usize + x as usize;
        self.cells[index] = FrameCell { ch, style };
    }

    /// Set a character that may span several columns. The covered cells
    /// become continuations. Returns the column after it; a wide character
    /// that does not fit at the right edge is dropped.
    pub fn set_wide(&mut self, x: u16, y: u16, ch: char, width: u16, style: Style) -> u16 {
        let width = width.max(1);
        if x.saturating_add(width) > self.cols {
            return self.cols;
        }
        self.set(x, y, ch, style);
        for dx in 1..width {
            self.set(x + dx, y, FrameCell::CONTINUATION, style);
        }
        x + width
    }

    /// Write text starting at `x`, clipped at the right edge. Returns the
    /// column after the last character written.
    pub fn put_str(&mut self, x: u16, y: u16, text: &str, style: Style) -> u16 {
        let mut col = x;
        for ch in text.chars() {
            if col >= self.cols {
                break;
            }
            self.set(col, y, ch, style);
            col += 1;
        }
        col
    }

    /// Blank a whole row in the given style
    pub fn fill_row(&mut self, y: u16, style: Style) {
        for x in 0..self.cols {
            self.set(x, y, ' ', style);
        }
    }

    pub fn row(&self, y: u16) -> &[FrameCell] {
        if y >= self.rows {
            return &[];
        }
        let start = y as usize * self.cols as usize;
        &self.cells[start..start + self.cols as usize]
    }

    /// Row contents with trailing spaces removed
    pub fn row_text(&self, y: u16) -> String {
        let text: String = self
            .row(y)
            .iter()
            .filter(|c| !c.is_continuation())
            .map(|c| c.ch)
            .collect();
        text.trim_end().to_string()
    }
}
