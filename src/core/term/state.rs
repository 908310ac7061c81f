//! Terminal screen state
//!
//! A fixed-size grid of cells plus a cursor. The grid never grows, never
//! resizes and keeps no scrollback: rows scrolled off the top are dropped.

use bitflags::bitflags;
use unicode_width::UnicodeWidthChar;

/// Screen grid driven by the ANSI parser
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerminalState {
    pub cols: u16,
    pub rows: u16,
    pub grid: Vec<Row>,
    pub cursor: CursorState,
    pub current_attrs: CellAttrs,
}

impl TerminalState {
    pub fn new(cols: u16, rows: u16) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Self {
            cols,
            rows,
            grid: (0..rows).map(|_| Row::new(cols, CellAttrs::default())).collect(),
            cursor: CursorState::default(),
            current_attrs: CellAttrs::default(),
        }
    }

    /// Cell at (row, col), if inside the grid
    pub fn cell(&self, row: u16, col: u16) -> Option<&Cell> {
        self.grid
            .get(row as usize)
            .and_then(|r| r.cells.get(col as usize))
    }

    /// Row contents as a string with trailing blanks trimmed
    pub fn row_text(&self, row: u16) -> String {
        self.grid
            .get(row as usize)
            .map(|r| {
                let text: String = r.cells.iter().map(|c| c.ch).collect();
                text.trim_end().to_string()
            })
            .unwrap_or_default()
    }

    /// Cursor position for display
    pub fn display_cursor(&self) -> (u16, u16) {
        (self.cursor.row, self.cursor.col)
    }

    /// Put a character at the current cursor position and advance, wrapping
    /// to the next row as soon as the last column is written
    pub fn put_char(&mut self, ch: char) {
        if ch.width() == Some(0) {
            return;
        }

        let row = self.cursor.row as usize;
        let col = self.cursor.col as usize;
        self.grid[row].cells[col] = Cell {
            ch,
            attrs: self.current_attrs,
        };
        self.cursor.col += 1;
        if self.cursor.col >= self.cols {
            self.cursor.col = 0;
            self.linefeed();
        }
    }

    /// Carriage return - move cursor to column 0
    pub fn carriage_return(&mut self) {
        self.cursor.col = 0;
    }

    /// Line feed - move cursor down, scroll if needed
    pub fn linefeed(&mut self) {
        if self.cursor.row + 1 >= self.rows {
            self.scroll_up();
        } else {
            self.cursor.row += 1;
        }
    }

    /// Backspace - move cursor left without erasing
    pub fn backspace(&mut self) {
        self.cursor.col = self.cursor.col.saturating_sub(1);
    }

    /// Drop the top row and append a blank one at the bottom
    pub fn scroll_up(&mut self) {
        self.grid.remove(0);
        self.grid.push(Row::new(self.cols, CellAttrs::default()));
        self.cursor.row = self.rows - 1;
    }

    /// Set cursor position (1-indexed parameters, clamped to the grid)
    pub fn cursor_position(&mut self, row: u16, col: u16) {
        self.cursor.row = row.saturating_sub(1).min(self.rows - 1);
        self.cursor.col = col.saturating_sub(1).min(self.cols - 1);
    }

    /// Clear every cell and home the cursor
    pub fn clear_screen(&mut self) {
        let attrs = self.current_attrs;
        for row in &mut self.grid {
            row.clear(attrs);
        }
        self.cursor.row = 0;
        self.cursor.col = 0;
    }

    /// Erase from the cursor to the end of its row with the current attribute
    pub fn erase_to_end_of_line(&mut self) {
        let attrs = self.current_attrs;
        let start = self.cursor.col as usize;
        let row = &mut self.grid[self.cursor.row as usize];
        for cell in row.cells.iter_mut().skip(start) {
            *cell = Cell::blank(attrs);
        }
    }
}

/// A single row
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(cols: u16, attrs: CellAttrs) -> Self {
        Self {
            cells: vec![Cell::blank(attrs); cols as usize],
        }
    }

    pub fn clear(&mut self, attrs: CellAttrs) {
        for cell in &mut self.cells {
            *cell = Cell::blank(attrs);
        }
    }
}

/// A single cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub attrs: CellAttrs,
}

impl Default for Cell {
    fn default() -> Self {
        Self::blank(CellAttrs::default())
    }
}

impl Cell {
    pub fn blank(attrs: CellAttrs) -> Self {
        Self { ch: ' ', attrs }
    }
}

/// Cell attributes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellAttrs {
    /// `None` is the default foreground
    pub fg: Option<AnsiColor>,
    pub flags: AttrFlags,
}

impl CellAttrs {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// The eight SGR 30–37 palette slots
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnsiColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl AnsiColor {
    /// Palette slot 0..=7
    pub fn from_slot(slot: u16) -> Option<Self> {
        Some(match slot {
            0 => AnsiColor::Black,
            1 => AnsiColor::Red,
            2 => AnsiColor::Green,
            3 => AnsiColor::Yellow,
            4 => AnsiColor::Blue,
            5 => AnsiColor::Magenta,
            6 => AnsiColor::Cyan,
            7 => AnsiColor::White,
            _ => return None,
        })
    }

    pub fn slot(self) -> u8 {
        self as u8
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct AttrFlags: u8 {
        const BOLD    = 0b0000_0001;
        const DIM     = 0b0000_0010;
        const ITALIC  = 0b0000_0100;
        const REVERSE = 0b0000_1000;
    }
}

/// Cursor state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CursorState {
    pub row: u16,
    /// Always less than `cols`
    pub col: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_char_wraps_past_last_column() {
        let mut state = TerminalState::new(3, 2);
        for ch in "abc".chars() {
            state.put_char(ch);
        }
        assert_eq!((state.cursor.row, state.cursor.col), (1, 0));
        assert_eq!(state.display_cursor(), (1, 0));

        state.put_char('d');
        assert_eq!(state.row_text(0), "abc");
        assert_eq!(state.row_text(1), "d");
        assert_eq!((state.cursor.row, state.cursor.col), (1, 1));
    }

    #[test]
    fn test_full_row_then_crlf_skips_a_row() {
        let mut state = TerminalState::new(3, 3);
        for ch in "abc".chars() {
            state.put_char(ch);
        }
        state.carriage_return();
        state.linefeed();
        state.put_char('d');
        assert_eq!(state.row_text(0), "abc");
        assert_eq!(state.row_text(1), "");
        assert_eq!(state.row_text(2), "d");
    }

    #[test]
    fn test_wrap_on_bottom_row_scrolls() {
        let mut state = TerminalState::new(2, 2);
        for ch in "abcd".chars() {
            state.put_char(ch);
        }
        assert_eq!(state.row_text(0), "cd");
        assert_eq!(state.row_text(1), "");
        assert_eq!((state.cursor.row, state.cursor.col), (1, 0));
    }

    #[test]
    fn test_linefeed_at_bottom_scrolls() {
        let mut state = TerminalState::new(4, 2);
        state.put_char('x');
        state.linefeed();
        state.linefeed();
        assert_eq!(state.row_text(0), "");
        assert_eq!(state.cursor.row, 1);
        assert_eq!(state.grid.len(), 2);
    }

    #[test]
    fn test_backspace_does_not_erase() {
        let mut state = TerminalState::new(4, 1);
        state.put_char('a');
        state.backspace();
        assert_eq!(state.cursor.col, 0);
        assert_eq!(state.cell(0, 0).map(|c| c.ch), Some('a'));
        state.backspace();
        assert_eq!(state.cursor.col, 0);
    }

    #[test]
    fn test_cursor_position_clamps() {
        let mut state = TerminalState::new(10, 5);
        state.cursor_position(99, 99);
        assert_eq!((state.cursor.row, state.cursor.col), (4, 9));
        state.cursor_position(0, 0);
        assert_eq!((state.cursor.row, state.cursor.col), (0, 0));
    }

    #[test]
    fn test_zero_width_char_dropped() {
        let mut state = TerminalState::new(4, 1);
        state.put_char('e');
        state.put_char('\u{301}');
        assert_eq!(state.cursor.col, 1);
    }
}
