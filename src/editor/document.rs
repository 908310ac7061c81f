//! Document buffer
//!
//! Lines of text plus the cursor. Columns count characters, not bytes.

/// Cursor position in the document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub row: usize,
    pub col: usize,
}

impl Cursor {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Immutable copy of the lines and cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    lines: Vec<String>,
    cursor: Cursor,
}

/// The text being edited
#[derive(Debug, Clone)]
pub struct Document {
    /// Never empty
    lines: Vec<String>,
    cursor: Cursor,
    modified: bool,
    /// Bumped on every change to the lines
    revision: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            cursor: Cursor::default(),
            modified: false,
            revision: 0,
        }
    }

    /// Split text on line feeds. A trailing line feed does not add a line.
    pub fn from_text(text: &str) -> Self {
        let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
        if lines.is_empty() {
            lines.push(String::new());
        }
        Self {
            lines,
            ..Self::new()
        }
    }

    /// Lines joined with a single line feed
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, row: usize) -> &str {
        self.lines.get(row).map(String::as_str).unwrap_or("")
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Length of a line in characters
    pub fn line_len(&self, row: usize) -> usize {
        self.line(row).chars().count()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Move the cursor, clamped to the document
    pub fn set_cursor(&mut self, row: usize, col: usize) {
        let row = row.min(self.lines.len() - 1);
        let col = col.min(self.line_len(row));
        self.cursor = Cursor { row, col };
    }

    /// Move by a column and line delta. Vertical moves keep the column,
    /// clamped to the target line.
    pub fn move_by(&mut self, dx: isize, dy: isize) {
        let row = self.cursor.row.saturating_add_signed(dy);
        let row = row.min(self.lines.len() - 1);
        let col = self.cursor.col.saturating_add_signed(dx);
        self.set_cursor(row, col);
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.modified = true;
        self.revision += 1;
    }

    /// Insert a character at the cursor and advance it
    pub fn insert_char(&mut self, ch: char) {
        let Cursor { row, col } = self.cursor;
        let at = byte_index(&self.lines[row], col);
        self.lines[row].insert(at, ch);
        self.cursor.col += 1;
        self.touch();
    }

    /// Delete the character under the cursor. No-op at end of line.
    pub fn delete_forward(&mut self) -> bool {
        let Cursor { row, col } = self.cursor;
        if col >= self.line_len(row) {
            return false;
        }
        let at = byte_index(&self.lines[row], col);
        self.lines[row].remove(at);
        self.touch();
        true
    }

    /// Delete left of the cursor, joining with the previous line at column 0.
    /// No-op at (0, 0).
    pub fn backspace(&mut self) -> bool {
        let Cursor { row, col } = self.cursor;
        if col > 0 {
            let at = byte_index(&self.lines[row], col - 1);
            self.lines[row].remove(at);
            self.cursor.col -= 1;
        } else if row > 0 {
            let line = self.lines.remove(row);
            let prev_len = self.line_len(row - 1);
            self.lines[row - 1].push_str(&line);
            self.cursor = Cursor::new(row - 1, prev_len);
        } else {
            return false;
        }
        self.touch();
        true
    }

    /// Split the line at the cursor; the cursor moves to the start of the new line
    pub fn split_line(&mut self) {
        let Cursor { row, col } = self.cursor;
        let at = byte_index(&self.lines[row], col);
        let tail = self.lines[row].split_off(at);
        self.lines.insert(row + 1, tail);
        self.cursor = Cursor::new(row + 1, 0);
        self.touch();
    }

    /// Insert an empty line below the cursor's line and move onto it
    pub fn open_line_below(&mut self) {
        let row = self.cursor.row + 1;
        self.lines.insert(row, String::new());
        self.cursor = Cursor::new(row, 0);
        self.touch();
    }

    /// Word left of the cursor: the run of alphanumerics and underscores
    pub fn current_word(&self) -> &str {
        let line = &self.lines[self.cursor.row];
        let end = byte_index(line, self.cursor.col);
        let start = line[..end]
            .char_indices()
            .rev()
            .take_while(|(_, c)| is_word_char(*c))
            .last()
            .map(|(i, _)| i)
            .unwrap_or(end);
        &line[start..end]
    }

    /// Replace the current word with `text`, cursor at the end of it
    pub fn replace_current_word(&mut self, text: &str) {
        let word_len = self.current_word().chars().count();
        let Cursor { row, col } = self.cursor;
        let start = byte_index(&self.lines[row], col - word_len);
        let end = byte_index(&self.lines[row], col);
        self.lines[row].replace_range(start..end, text);
        self.cursor.col = col - word_len + text.chars().count();
        self.touch();
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            lines: self.lines.clone(),
            cursor: self.cursor,
        }
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        self.lines = snapshot.lines;
        self.cursor = snapshot.cursor;
        self.touch();
    }
}

pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte offset of a character column, clamped to the line
fn byte_index(line: &str, col: usize) -> usize {
    line.char_indices()
        .nth(col)
        .map(|(i, _)| i)
        .unwrap_or(line.len())
}
