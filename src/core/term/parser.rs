//! ANSI sequence parser
//!
//! Decodes a PTY byte stream into [`TerminalState`] updates. Only CSI
//! sequences reach the grid; OSC strings, charset selection and other escape
//! families are consumed without effect. All state lives in the parser, so a
//! stream may be split into chunks at any byte boundary.

use super::state::{AnsiColor, AttrFlags, TerminalState};

/// Longest CSI body kept before the sequence is abandoned
const MAX_CSI_LEN: usize = 64;

/// Parser state machine
#[derive(Debug, Default)]
pub struct AnsiParser {
    state: ParserState,
    /// Parameter and intermediate bytes of a partially received CSI sequence
    csi: Vec<u8>,
    /// Bytes of a partially received UTF-8 character
    utf8: Vec<u8>,
    utf8_len: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum ParserState {
    #[default]
    Ground,
    Escape,
    EscapeIntermediate,
    Csi,
    CsiIgnore,
    /// OSC, DCS, SOS, PM and APC bodies
    String,
    StringEscape,
}

impl AnsiParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes
    pub fn feed(&mut self, bytes: &[u8], state: &mut TerminalState) {
        for &byte in bytes {
            self.advance(byte, state);
        }
    }

    /// Feed a single byte
    pub fn advance(&mut self, byte: u8, state: &mut TerminalState) {
        match self.state {
            ParserState::String => return self.string(byte),
            ParserState::StringEscape => return self.string_escape(byte, state),
            _ => {}
        }

        // C0 controls execute in every other state
        if byte < 0x20 {
            return self.control(byte, state);
        }

        match self.state {
            ParserState::Ground => self.ground(byte, state),
            ParserState::Escape => self.escape(byte),
            ParserState::EscapeIntermediate => self.escape_intermediate(byte),
            ParserState::Csi => self.csi_byte(byte, state),
            ParserState::CsiIgnore => self.csi_ignore(byte),
            ParserState::String | ParserState::StringEscape => {}
        }
    }

    fn control(&mut self, byte: u8, state: &mut TerminalState) {
        match byte {
            0x1B => self.enter_escape(),
            0x08 => state.backspace(),
            0x0A => state.linefeed(),
            0x0D => state.carriage_return(),
            // CAN and SUB abort a sequence in progress
            0x18 | 0x1A => self.state = ParserState::Ground,
            // BEL and the remaining controls do nothing to the grid
            _ => {}
        }
    }

    fn enter_escape(&mut self) {
        self.state = ParserState::Escape;
        self.csi.clear();
        self.utf8.clear();
    }

    fn ground(&mut self, byte: u8, state: &mut TerminalState) {
        match byte {
            0x20..=0x7E => {
                self.utf8.clear();
                state.put_char(byte as char);
            }
            0x7F => {}
            _ => self.utf8_byte(byte, state),
        }
    }

    fn utf8_byte(&mut self, byte: u8, state: &mut TerminalState) {
        let lead_len = match byte {
            0xC0..=0xDF => Some(2),
            0xE0..=0xEF => Some(3),
            0xF0..=0xF7 => Some(4),
            _ => None,
        };

        if let Some(len) = lead_len {
            self.utf8.clear();
            self.utf8.push(byte);
            self.utf8_len = len;
            return;
        }

        // Continuation byte without a lead byte is invalid
        if self.utf8.is_empty() {
            return;
        }

        self.utf8.push(byte);
        if self.utf8.len() < self.utf8_len {
            return;
        }

        if let Ok(s) = std::str::from_utf8(&self.utf8) {
            for ch in s.chars() {
                state.put_char(ch);
            }
        }
        self.utf8.clear();
    }

    fn escape(&mut self, byte: u8) {
        self.state = match byte {
            b'[' => ParserState::Csi,
            b']' | b'P' | b'X' | b'^' | b'_' => ParserState::String,
            // Charset selection and other intermediates: ESC ( B, ESC # 8, ...
            0x20..=0x2F => ParserState::EscapeIntermediate,
            _ => ParserState::Ground,
        };
    }

    fn escape_intermediate(&mut self, byte: u8) {
        if !(0x20..=0x2F).contains(&byte) {
            self.state = ParserState::Ground;
        }
    }

    fn csi_byte(&mut self, byte: u8, state: &mut TerminalState) {
        match byte {
            0x20..=0x3F => {
                if self.csi.len() >= MAX_CSI_LEN {
                    tracing::debug!("CSI sequence too long, ignoring");
                    self.csi.clear();
                    self.state = ParserState::CsiIgnore;
                } else {
                    self.csi.push(byte);
                }
            }
            0x40..=0x7E => {
                self.execute_csi(byte, state);
                self.csi.clear();
                self.state = ParserState::Ground;
            }
            _ => {
                self.csi.clear();
                self.state = ParserState::Ground;
            }
        }
    }

    fn csi_ignore(&mut self, byte: u8) {
        if (0x40..=0x7E).contains(&byte) || byte >= 0x7F {
            self.state = ParserState::Ground;
        }
    }

    fn string(&mut self, byte: u8) {
        match byte {
            0x07 => self.state = ParserState::Ground,
            0x1B => self.state = ParserState::StringEscape,
            _ => {}
        }
    }

    fn string_escape(&mut self, byte: u8, state: &mut TerminalState) {
        if byte == b'\\' {
            self.state = ParserState::Ground;
        } else {
            // Not ST: the string ended and a new escape sequence began
            self.enter_escape();
            self.advance(byte, state);
        }
    }

    fn execute_csi(&self, final_byte: u8, state: &mut TerminalState) {
        let has_private = self
            .csi
            .iter()
            .any(|b| matches!(b, b'?' | b'>' | b'=' | b'<'));
        let has_intermediate = self.csi.iter().any(|b| (0x20..=0x2F).contains(b));

        if has_private || has_intermediate {
            tracing::debug!(
                "Ignoring CSI: body={:?}, final={:?}",
                String::from_utf8_lossy(&self.csi),
                final_byte as char
            );
            return;
        }

        let params = parse_params(&self.csi);
        let first = params.first().copied().flatten();

        match final_byte {
            b'm' => execute_sgr(&params, state),
            b'H' | b'f' => {
                let row = first.unwrap_or(1);
                let col = params.get(1).copied().flatten().unwrap_or(1);
                state.cursor_position(row, col);
            }
            b'J' => match first.unwrap_or(0) {
                2 => state.clear_screen(),
                mode => tracing::debug!("Unsupported erase in display mode {}", mode),
            },
            b'K' => match first.unwrap_or(0) {
                0 => state.erase_to_end_of_line(),
                mode => tracing::debug!("Unsupported erase in line mode {}", mode),
            },
            _ => {
                tracing::debug!(
                    "Unknown CSI: params={:?}, final={:?}",
                    params,
                    final_byte as char
                );
            }
        }
    }
}

/// Split a CSI body on `;`.
///
/// An empty field is `None`; a field with any non-digit is `Some(0)`.
fn parse_params(body: &[u8]) -> Vec<Option<u16>> {
    if body.is_empty() {
        return Vec::new();
    }

    body.split(|&b| b == b';')
        .map(|field| {
            if field.is_empty() {
                None
            } else if field.iter().all(u8::is_ascii_digit) {
                Some(field.iter().fold(0u16, |acc, &d| {
                    acc.saturating_mul(10).saturating_add((d - b'0') as u16)
                }))
            } else {
                Some(0)
            }
        })
        .collect()
}

fn execute_sgr(params: &[Option<u16>], state: &mut TerminalState) {
    if params.is_empty() {
        state.current_attrs.reset();
        return;
    }

    let mut iter = params.iter().map(|p| p.unwrap_or(0));

    while let Some(param) = iter.next() {
        match param {
            0 => state.current_attrs.reset(),
            1 => state.current_attrs.flags |= AttrFlags::BOLD,
            30..=37 => state.current_attrs.fg = AnsiColor::from_slot(param - 30),
            // Extended colors: skip their arguments so they are not read as codes
            38 | 48 => match iter.next() {
                Some(5) => {
                    iter.next();
                }
                Some(2) => {
                    iter.next();
                    iter.next();
                    iter.next();
                }
                _ => {}
            },
            // Backgrounds and every other rendition are parsed but ignored
            _ => {}
        }
    }
}
