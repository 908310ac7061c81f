//! Terminal renderer using crossterm
//!
//! Writes composed frames to the console, redrawing only rows that differ
//! from the previous frame.

use std::io::{self, Write};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{
        Attribute, Color, ResetColor, SetAttribute,
        SetBackgroundColor, SetForegroundColor,
    },
    terminal::{
        self, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EnterAlternateScreen, LeaveAlternateScreen,
    },
};

use crate::config::Theme;
use crate::core::term::AttrFlags;

use super::frame::{Frame, Ink, Style};

/// Terminal renderer
pub struct Renderer {
    /// Whether the terminal has been initialized
    initialized: bool,
    /// Last frame written, for row diffing
    prev: Option<Frame>,
    /// Theme the previous frame was drawn with
    prev_theme: Option<Theme>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            initialized: false,
            prev: None,
            prev_theme: None,
        }
    }

    /// Initialize the terminal for rendering
    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            DisableLineWrap,
            Clear(ClearType::All),
            MoveTo(0, 0)
        )?;
        stdout.flush()?;

        self.initialized = true;
        self.prev = None;
        tracing::debug!("Renderer initialized");
        Ok(())
    }

    /// Cleanup the terminal
    pub fn cleanup(&mut self) -> io::Result<()> {
        if !self.initialized {
            return Ok(());
        }
        self.initialized = false;

        let mut stdout = io::stdout();

        // Reset all attributes first
        let _ = execute!(stdout, ResetColor, SetAttribute(Attribute::Reset));
        let _ = execute!(stdout, Show);
        let _ = execute!(stdout, EnableLineWrap);
        let _ = execute!(stdout, LeaveAlternateScreen);
        let _ = stdout.flush();

        // Disable raw mode - this is the most important part
        terminal::disable_raw_mode()?;

        Ok(())
    }

    /// Forget the previous frame so the next render redraws everything
    pub fn invalidate(&mut self) {
        self.prev = None;
    }

    /// Render a frame to the console
    pub fn render(&mut self, frame: &Frame, theme: &Theme) -> io::Result<()> {
        // Use a buffered writer for better performance
        let stdout = io::stdout();
        let mut stdout = io::BufWriter::with_capacity(65536, stdout.lock());

        // Begin synchronized update (reduces flicker)
        write!(stdout, "\x1b[?2026h")?;
        self.draw(&mut stdout, frame, theme)?;
        // End synchronized update
        write!(stdout, "\x1b[?2026l")?;

        stdout.flush()
    }

    /// Write the rows of `frame` that changed since the last call
    fn draw<W: Write>(&mut self, out: &mut W, frame: &Frame, theme: &Theme) -> io::Result<()> {
        queue!(out, Hide)?;

        let full = match &self.prev {
            Some(prev) => {
                prev.cols() != frame.cols()
                    || prev.rows() != frame.rows()
                    || self.prev_theme.as_ref() != Some(theme)
            }
            None => true,
        };
        if full {
            queue!(out, ResetColor, Clear(ClearType::All))?;
        }

        let mut line_buffer = String::with_capacity(256);
        for y in 0..frame.rows() {
            let row = frame.row(y);
            if !full {
                if let Some(prev) = &self.prev {
                    if prev.row(y) == row {
                        continue;
                    }
                }
            }

            queue!(out, MoveTo(0, y))?;
            line_buffer.clear();
            let mut current: Option<Style> = None;

            for cell in row {
                if cell.is_continuation() {
                    continue;
                }
                if current != Some(cell.style) {
                    if let Some(style) = current {
                        apply_style(out, &style, theme)?;
                        write!(out, "{}", line_buffer)?;
                        line_buffer.clear();
                    }
                    current = Some(cell.style);
                }
                line_buffer.push(cell.ch);
            }

            if let Some(style) = current {
                apply_style(out, &style, theme)?;
                write!(out, "{}", line_buffer)?;
                line_buffer.clear();
            }
        }

        queue!(out, ResetColor, SetAttribute(Attribute::Reset))?;

        if let Some((col, row)) = frame.cursor {
            queue!(out, MoveTo(col, row), Show)?;
        }

        self.prev = Some(frame.clone());
        if full {
            self.prev_theme = Some(theme.clone());
        }
        Ok(())
    }

    /// Get terminal size
    pub fn size() -> io::Result<(u16, u16)> {
        terminal::size()
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

fn ink_color(ink: Ink, theme: &Theme) -> Color {
    match ink {
        Ink::Role(role) => theme.get(role).to_crossterm(),
        Ink::Ansi(color) => Color::AnsiValue(color.slot()),
    }
}

/// Apply a cell style
fn apply_style<W: Write>(out: &mut W, style: &Style, theme: &Theme) -> io::Result<()> {
    // Reset first
    queue!(out, SetAttribute(Attribute::Reset))?;

    if style.flags.contains(AttrFlags::BOLD) {
        queue!(out, SetAttribute(Attribute::Bold))?;
    }
    if style.flags.contains(AttrFlags::DIM) {
        queue!(out, SetAttribute(Attribute::Dim))?;
    }
    if style.flags.contains(AttrFlags::ITALIC) {
        queue!(out, SetAttribute(Attribute::Italic))?;
    }
    if style.flags.contains(AttrFlags::REVERSE) {
        queue!(out, SetAttribute(Attribute::Reverse))?;
    }

    queue!(
        out,
        SetForegroundColor(ink_color(style.fg, theme)),
        SetBackgroundColor(theme.get(style.bg).to_crossterm())
    )
}
