//! Editor input events
//!
//! Backend-neutral keys. The UI layer translates crossterm events into these;
//! the mode state machine consumes them.

/// A single key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Printable character
    Char(char),
    Enter,
    Tab,
    Backspace,
    Delete,
    Esc,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    /// Raw control byte, e.g. Ctrl+W is `Byte(23)`
    Byte(u8),
}

/// Ctrl-W: leaves TERMINAL mode
pub const TERMINAL_EXIT: u8 = 23;

impl Key {
    /// Bytes sent to the PTY for this key
    pub fn pty_bytes(self) -> Vec<u8> {
        match self {
            Key::Up => b"\x1b[A".to_vec(),
            Key::Down => b"\x1b[B".to_vec(),
            Key::Right => b"\x1b[C".to_vec(),
            Key::Left => b"\x1b[D".to_vec(),
            Key::Home => b"\x1b[H".to_vec(),
            Key::End => b"\x1b[F".to_vec(),
            Key::PageUp => b"\x1b[5~".to_vec(),
            Key::PageDown => b"\x1b[6~".to_vec(),
            Key::Delete => b"\x1b[3~".to_vec(),
            Key::Insert => b"\x1b[2~".to_vec(),
            Key::Backspace => vec![0x08],
            Key::Enter => vec![0x0A],
            Key::Tab => vec![0x09],
            Key::Esc => vec![0x1B],
            Key::Byte(b) => vec![b],
            Key::Char(ch) => {
                let mut buf = [0u8; 4];
                ch.encode_utf8(&mut buf).as_bytes().to_vec()
            }
        }
    }
}

/// One event delivered to the editor per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key(Key),
    /// New viewport size in (cols, rows)
    Resize(u16, u16),
}
