//! Configuration menu
//!
//! A list of toggles and theme colors. Color entries open a hex input; the
//! value is applied only if it parses as `#RGB` or `#RRGGBB`.

use crate::config::{Color, Role, Theme};
use crate::input::Key;

/// What a menu entry controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    LineNumbers,
    Color(Role),
}

/// Menu entries in display order
pub const MENU_OPTIONS: [(&str, MenuOption); 7] = [
    ("Line Numbers", MenuOption::LineNumbers),
    ("Foreground", MenuOption::Color(Role::Foreground)),
    ("Background", MenuOption::Color(Role::Background)),
    ("Keyword Color", MenuOption::Color(Role::Keyword)),
    ("String Color", MenuOption::Color(Role::String)),
    ("Comment Color", MenuOption::Color(Role::Comment)),
    ("Def/Class Color", MenuOption::Color(Role::Definition)),
];

/// Result of one key in the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOutcome {
    Stay,
    Close,
    ToggleLineNumbers,
    SetColor(Role, Color),
}

/// Menu state: selection plus the hex being typed, if any
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigMenu {
    pub selected: usize,
    pub input: Option<String>,
}

impl ConfigMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_option(&self) -> MenuOption {
        MENU_OPTIONS[self.selected].1
    }

    pub fn handle(&mut self, key: Key, theme: &Theme) -> MenuOutcome {
        if self.input.is_some() {
            return self.handle_input(key);
        }

        let len = MENU_OPTIONS.len();
        match key {
            Key::Esc | Key::Char('q') => MenuOutcome::Close,
            Key::Char('j') | Key::Down => {
                self.selected = (self.selected + 1) % len;
                MenuOutcome::Stay
            }
            Key::Char('k') | Key::Up => {
                self.selected = (self.selected + len - 1) % len;
                MenuOutcome::Stay
            }
            Key::Enter | Key::Char(' ') => match self.selected_option() {
                MenuOption::LineNumbers => MenuOutcome::ToggleLineNumbers,
                MenuOption::Color(role) => {
                    self.input = Some(theme.get(role).to_hex());
                    MenuOutcome::Stay
                }
            },
            _ => MenuOutcome::Stay,
        }
    }

    fn handle_input(&mut self, key: Key) -> MenuOutcome {
        let Some(input) = self.input.as_mut() else {
            return MenuOutcome::Stay;
        };

        match key {
            Key::Esc => {
                self.input = None;
                MenuOutcome::Stay
            }
            Key::Backspace => {
                input.pop();
                MenuOutcome::Stay
            }
            Key::Char(ch) if !ch.is_control() => {
                input.push(ch);
                MenuOutcome::Stay
            }
            Key::Enter => {
                let text = self.input.take().unwrap_or_default();
                match (self.selected_option(), parse_hex_input(&text)) {
                    (MenuOption::Color(role), Some(color)) => MenuOutcome::SetColor(role, color),
                    _ => {
                        tracing::debug!("Discarding color input {:?}", text);
                        MenuOutcome::Stay
                    }
                }
            }
            _ => MenuOutcome::Stay,
        }
    }
}

/// A committed value starts with `#` and is 4 or 7 characters long
fn parse_hex_input(text: &str) -> Option<Color> {
    if !text.starts_with('#') || !matches!(text.chars().count(), 4 | 7) {
        return None;
    }
    Color::from_hex(text)
}
