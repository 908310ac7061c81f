//! Key mapping for terminal input
//!
//! Converts crossterm key events into editor [`Key`]s.

use bitflags::bitflags;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::input::Key;

bitflags! {
    /// Modifier keys
    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
    }
}

impl From<KeyModifiers> for Modifiers {
    fn from(mods: KeyModifiers) -> Self {
        let mut result = Modifiers::empty();
        if mods.contains(KeyModifiers::SHIFT) {
            result |= Modifiers::SHIFT;
        }
        if mods.contains(KeyModifiers::CONTROL) {
            result |= Modifiers::CTRL;
        }
        if mods.contains(KeyModifiers::ALT) {
            result |= Modifiers::ALT;
        }
        result
    }
}

/// Key mapper for converting key events to editor keys
pub struct KeyMapper;

impl KeyMapper {
    /// Map a crossterm KeyEvent. Keys the editor has no use for map to `None`.
    pub fn map(event: &KeyEvent) -> Option<Key> {
        let mods = Modifiers::from(event.modifiers);

        match event.code {
            KeyCode::Char(ch) => Self::map_char(ch, mods),
            KeyCode::Enter => Some(Key::Enter),
            KeyCode::Tab => Some(Key::Tab),
            KeyCode::Backspace => Some(Key::Backspace),
            KeyCode::Delete => Some(Key::Delete),
            KeyCode::Esc => Some(Key::Esc),
            KeyCode::Up => Some(Key::Up),
            KeyCode::Down => Some(Key::Down),
            KeyCode::Left => Some(Key::Left),
            KeyCode::Right => Some(Key::Right),
            KeyCode::Home => Some(Key::Home),
            KeyCode::End => Some(Key::End),
            KeyCode::PageUp => Some(Key::PageUp),
            KeyCode::PageDown => Some(Key::PageDown),
            KeyCode::Insert => Some(Key::Insert),
            _ => None,
        }
    }

    fn map_char(ch: char, mods: Modifiers) -> Option<Key> {
        // Ctrl + letter = control character
        if mods.contains(Modifiers::CTRL) && !mods.contains(Modifiers::ALT) {
            if ch.is_ascii_lowercase() {
                return Some(Key::Byte((ch as u8) - b'a' + 1));
            } else if ch.is_ascii_uppercase() {
                return Some(Key::Byte((ch as u8) - b'A' + 1));
            }
            let code = match ch {
                '@' | '`' | ' ' => 0x00,
                '[' => 0x1B,
                '\\' => 0x1C,
                ']' => 0x1D,
                '^' | '~' => 0x1E,
                '_' | '?' => 0x1F,
                _ => return None,
            };
            return Some(Key::Byte(code));
        }

        if mods.contains(Modifiers::ALT) {
            return None;
        }

        Some(Key::Char(ch))
    }
}
