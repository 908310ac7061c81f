//! Frame composition
//!
//! Builds a [`Frame`] from the editor state, or from the shell's cell grid in
//! TERMINAL mode. Nothing here touches the terminal.

use std::time::Instant;

use crate::config::Role;
use crate::core::term::{AttrFlags, TerminalState};
use crate::editor::config_menu::{ConfigMenu, MenuOption, MENU_OPTIONS};
use crate::editor::layout::char_width;
use crate::editor::{Editor, Mode};

use super::frame::{Frame, Ink, Style};
use super::highlight::highlight;

const HINTS: &str = " [i] Insert  [:] Command  [h/j/k/l] Move  [u] Undo  [r] Redo ";
const TERMINAL_HINTS: &str = " [Ctrl-W] Back to editor ";
const POPUP_MAX_ITEMS: usize = 10;
const MENU_WIDTH: u16 = 50;

/// Compose the full screen
pub fn compose(editor: &mut Editor, terminal: Option<&TerminalState>, now: Instant) -> Frame {
    let cols = editor.layout.cols();
    let rows = editor.layout.rows();
    let mut frame = Frame::new(cols, rows);

    if let (Mode::Terminal, Some(state)) = (editor.mode(), terminal) {
        draw_terminal(&mut frame, state);
        draw_status(&mut frame, editor);
        let hint_y = rows.saturating_sub(1);
        frame.put_str(0, hint_y, TERMINAL_HINTS, Style::default().with(AttrFlags::DIM));
        return frame;
    }

    let cursor = draw_text(&mut frame, editor);
    draw_status(&mut frame, editor);
    draw_notifications(&mut frame, editor, now);

    if let Some((x, y)) = cursor {
        draw_ghost(&mut frame, editor, x, y);
        if *editor.mode() == Mode::Autocomplete {
            draw_popup(&mut frame, editor, x, y);
        }
    }

    let hint_y = rows.saturating_sub(1);
    match editor.mode() {
        Mode::Command(text) => {
            let line = format!(":{}", text);
            frame.put_str(0, hint_y, &line, Style::default().with(AttrFlags::BOLD));
            frame.cursor = Some((line.chars().count() as u16, hint_y));
        }
        Mode::Config(menu) => {
            draw_config_menu(&mut frame, editor, menu);
            frame.cursor = None;
        }
        _ => {
            let width = (cols as usize).saturating_sub(1);
            let hints: String = HINTS.chars().take(width).collect();
            frame.put_str(0, hint_y, &hints, Style::default().with(AttrFlags::DIM));
            frame.cursor = cursor;
        }
    }

    frame
}

/// Text area with gutter. Returns the cursor's (col, row) if it is on screen.
fn draw_text(frame: &mut Frame, editor: &Editor) -> Option<(u16, u16)> {
    let gutter = editor.layout.gutter_width() as u16;
    let gutter_style = Style::new(Role::Gutter, Role::Background).with(AttrFlags::DIM);
    let mut cached: Option<(usize, Vec<Role>)> = None;

    for (y, seg) in editor.layout.visible().iter().enumerate() {
        let y = y as u16;
        if gutter > 0 && seg.is_line_start() {
            frame.put_str(0, y, &format!("{:4} ", seg.line + 1), gutter_style);
        }

        let line = editor.doc.line(seg.line);
        if cached.as_ref().map(|(l, _)| *l) != Some(seg.line) {
            cached = Some((seg.line, highlight(line)));
        }
        let roles = cached.as_ref().map(|(_, r)| r.as_slice()).unwrap_or(&[]);

        let mut x = gutter;
        for (i, ch) in line.chars().skip(seg.start).take(seg.end - seg.start).enumerate() {
            let role = roles.get(seg.start + i).copied().unwrap_or(Role::Foreground);
            let mut style = Style::new(role, Role::Background);
            if role == Role::Definition {
                style = style.with(AttrFlags::BOLD);
            }
            x = frame.set_wide(x, y, ch, char_width(ch) as u16, style);
        }
    }

    editor
        .layout
        .screen_cursor(&editor.doc)
        .map(|(row, col)| (col as u16, row as u16))
}

fn mode_role(mode: &Mode) -> Role {
    match mode {
        Mode::Normal => Role::StatusAccent,
        Mode::Insert | Mode::Autocomplete => Role::StatusInfo,
        Mode::Command(_) => Role::StatusError,
        Mode::Config(_) => Role::Keyword,
        Mode::Terminal => Role::String,
    }
}

fn draw_status(frame: &mut Frame, editor: &Editor) {
    let cols = frame.cols();
    let y = frame.rows().saturating_sub(2);
    let base = Style::new(Role::Foreground, Role::StatusBackground);
    frame.fill_row(y, base);

    let mode = editor.mode();
    let mode_str = format!(" {} ", mode.name());
    let accent = Style::new(Role::Background, mode_role(mode)).with(AttrFlags::BOLD);
    let end = frame.put_str(0, y, &mode_str, accent);

    let name = editor
        .filename()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "[No Name]".to_string());
    let marker = if editor.doc.is_modified() { " [+]" } else { "" };
    frame.put_str(end + 1, y, &format!(" {}{} ", name, marker), base);

    let cursor = editor.doc.cursor();
    let pos = format!(" LOC: {}:{} ", cursor.row + 1, cursor.col + 1);
    let x = cols.saturating_sub(pos.chars().count() as u16 + 1);
    let pos_style = Style::new(Role::Background, Role::StatusAccent).with(AttrFlags::BOLD);
    frame.put_str(x, y, &pos, pos_style);
}

fn draw_notifications(frame: &mut Frame, editor: &mut Editor, now: Instant) {
    let cols = frame.cols();
    let rows = frame.rows();
    let style = Style::new(Role::StatusInfo, Role::StatusBackground).with(AttrFlags::BOLD);

    for (i, note) in editor.notifications(now).iter().enumerate() {
        let Some(y) = rows.checked_sub(4 + i as u16) else {
            break;
        };
        let msg = format!(" {} ", note.message);
        let x = cols.saturating_sub(msg.chars().count() as u16 + 2);
        frame.put_str(x, y, &msg, style);
    }
}

/// The untyped rest of the active suggestion, drawn at the cursor
fn draw_ghost(frame: &mut Frame, editor: &Editor, x: u16, y: u16) {
    let suggestion = match editor.mode() {
        Mode::Insert => editor.autocomplete.first(),
        Mode::Autocomplete => editor.autocomplete.selected_suggestion(),
        _ => None,
    };
    let Some(suggestion) = suggestion else {
        return;
    };

    let word = editor.doc.current_word();
    let Some(ghost) = suggestion.strip_prefix(word) else {
        return;
    };
    if ghost.is_empty() || x as usize + ghost.chars().count() >= frame.cols() as usize {
        return;
    }

    let style = Style::new(Role::Ghost, Role::Background).with(AttrFlags::DIM | AttrFlags::ITALIC);
    frame.put_str(x, y, ghost, style);
}

/// Suggestion list below the cursor, or above it when there is no room
fn draw_popup(frame: &mut Frame, editor: &Editor, x: u16, y: u16) {
    let items = editor.autocomplete.suggestions();
    if items.is_empty() {
        return;
    }

    let cols = frame.cols() as usize;
    let text_bottom = frame.rows().saturating_sub(2) as usize;
    let count = items.len().min(POPUP_MAX_ITEMS);
    let visible = &items[..count];
    let width = visible.iter().map(|s| s.chars().count()).max().unwrap_or(0) + 4;

    let (x, y) = (x as usize, y as usize);
    let px = if x + width >= cols {
        cols.saturating_sub(width + 1)
    } else {
        x
    };
    let py = if y + count + 1 >= text_bottom {
        y.saturating_sub(count)
    } else {
        y + 1
    };

    let normal = Style::new(Role::Foreground, Role::Popup);
    let selected = Style::new(Role::Background, Role::PopupSelected).with(AttrFlags::BOLD);
    for (i, item) in visible.iter().enumerate() {
        let row = py + i;
        if row >= text_bottom {
            break;
        }
        let label = format!(" {:<w$}", item, w = width - 1);
        let label: String = label.chars().take(cols.saturating_sub(px + 1)).collect();
        let style = if i == editor.autocomplete.selected() { selected } else { normal };
        frame.put_str(px as u16, row as u16, &label, style);
    }
}

fn draw_config_menu(frame: &mut Frame, editor: &Editor, menu: &ConfigMenu) {
    let height = MENU_OPTIONS.len() as u16 + 6;
    let x0 = frame.cols().saturating_sub(MENU_WIDTH) / 2;
    let y0 = frame.rows().saturating_sub(height) / 2;
    let plain = Style::default();

    for dy in 0..height {
        for dx in 0..MENU_WIDTH {
            let ch = if dy == 0 || dy == height - 1 {
                '-'
            } else if dx == 0 || dx == MENU_WIDTH - 1 {
                '|'
            } else {
                ' '
            };
            frame.set(x0 + dx, y0 + dy, ch, plain);
        }
    }

    frame.put_str(x0 + 2, y0 + 1, " Configuration Menu ", plain.with(AttrFlags::BOLD));
    frame.put_str(x0 + 2, y0 + 2, " (j/k: navigate, Enter: edit) ", plain.with(AttrFlags::DIM));

    for (i, (name, option)) in MENU_OPTIONS.iter().enumerate() {
        let y = y0 + 4 + i as u16;
        let is_selected = i == menu.selected;
        let value_style = if is_selected {
            plain.with(AttrFlags::REVERSE)
        } else {
            plain
        };
        let x = frame.put_str(x0 + 2, y, &format!("{}: ", name), plain);

        match option {
            MenuOption::LineNumbers => {
                let value = if editor.layout.show_line_numbers() { "[X]" } else { "[ ]" };
                frame.put_str(x, y, value, value_style);
            }
            MenuOption::Color(role) => {
                let value = match (&menu.input, is_selected) {
                    (Some(input), true) => format!("{}_", input),
                    _ => editor.theme.get(*role).to_hex(),
                };
                frame.put_str(x, y, &value, value_style);
                frame.put_str(x + 10, y, "  ", Style::new(Role::Foreground, *role));
            }
        }
    }

    if menu.input.is_some() {
        frame.put_str(
            x0 + 2,
            y0 + height - 2,
            " Typing hex... (e.g. #FF0000) ",
            plain.with(AttrFlags::DIM),
        );
    }
}

fn draw_terminal(frame: &mut Frame, state: &TerminalState) {
    for (y, row) in state.grid.iter().enumerate() {
        for (x, cell) in row.cells.iter().enumerate() {
            let fg = match cell.attrs.fg {
                Some(color) => Ink::Ansi(color),
                None => Ink::Role(Role::Foreground),
            };
            let style = Style {
                fg,
                bg: Role::Background,
                flags: cell.attrs.flags,
            };
            frame.set(x as u16, y as u16, cell.ch, style);
        }
    }

    let (row, col) = state.display_cursor();
    frame.cursor = Some((col, row));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    use crate::config::Theme;
    use crate::core::term::{AnsiColor, AnsiParser};
    use crate::editor::autocomplete::{Autocomplete, BufferWords};
    use crate::editor::document::Document;
    use crate::editor::layout::Layout;
    use crate::input::{InputEvent, Key};

    fn editor(text: &str, cols: u16, rows: u16) -> Editor {
        Editor::new(
            Document::from_text(text),
            Some(PathBuf::from("demo.py")),
            Layout::new(cols, rows, true),
            Theme::default(),
            Autocomplete::new(Arc::new(BufferWords)),
        )
    }

    fn press(editor: &mut Editor, keys: &str) {
        for ch in keys.chars() {
            editor.handle(InputEvent::Key(Key::Char(ch)));
        }
    }

    #[test]
    fn test_gutter_text_and_status() {
        let mut ed = editor("def f():\n    return 1", 40, 6);
        let frame = compose(&mut ed, None, Instant::now());

        assert_eq!(frame.row_text(0), "   1 def f():");
        assert_eq!(frame.row_text(1), "   2     return 1");
        assert!(frame.row_text(4).starts_with(" NORMAL   demo.py "));
        assert!(frame.row_text(4).ends_with("LOC: 1:1"));
        assert!(frame.row_text(5).starts_with(" [i] Insert"));
        assert_eq!(frame.cursor, Some((5, 0)));

        let def = frame.get(5, 0).unwrap();
        assert_eq!(def.style.fg, Ink::Role(Role::Definition));
        assert!(def.style.flags.contains(AttrFlags::BOLD));
    }

    #[test]
    fn test_wrapped_line_has_blank_gutter() {
        let mut ed = editor(&"x".repeat(20), 16, 6);
        let frame = compose(&mut ed, None, Instant::now());
        assert_eq!(frame.row_text(0), format!("   1 {}", "x".repeat(10)));
        assert_eq!(frame.row_text(1), format!("     {}", "x".repeat(10)));
    }

    #[test]
    fn test_wide_text_wraps_by_columns() {
        let mut ed = editor("日本語日本語", 14, 6);
        let frame = compose(&mut ed, None, Instant::now());
        assert_eq!(frame.row_text(0), "   1 日本語日");
        assert_eq!(frame.row_text(1), "     本語");
        assert_eq!(frame.get(5, 0).map(|c| c.ch), Some('日'));
        assert!(frame.get(6, 0).is_some_and(|c| c.is_continuation()));
    }

    #[test]
    fn test_command_line_and_cursor() {
        let mut ed = editor("", 30, 5);
        press(&mut ed, ":wq");
        let frame = compose(&mut ed, None, Instant::now());
        assert_eq!(frame.row_text(4), ":wq");
        assert_eq!(frame.cursor, Some((3, 4)));
        assert!(frame.row_text(3).starts_with(" COMMAND "));
    }

    #[test]
    fn test_modified_marker() {
        let mut ed = editor("", 30, 5);
        press(&mut ed, "ia");
        let frame = compose(&mut ed, None, Instant::now());
        assert!(frame.row_text(3).contains("demo.py [+]"));
    }

    #[test]
    fn test_ghost_text_after_cursor() {
        let mut ed = editor("print\n\n", 30, 6);
        ed.doc.set_cursor(1, 0);
        press(&mut ed, "ipr");
        let frame = compose(&mut ed, None, Instant::now());
        assert_eq!(frame.row_text(1), "   2 print");
        let ghost = frame.get(7, 1).unwrap();
        assert_eq!(ghost.style.fg, Ink::Role(Role::Ghost));
        assert_eq!(frame.cursor, Some((7, 1)));
    }

    #[test]
    fn test_popup_lists_suggestions() {
        let mut ed = editor("apple apricot\n\n", 30, 10);
        ed.doc.set_cursor(1, 0);
        press(&mut ed, "iap");
        ed.handle(InputEvent::Key(Key::Tab));
        assert_eq!(*ed.mode(), Mode::Autocomplete);

        let frame = compose(&mut ed, None, Instant::now());
        assert!(frame.row_text(2).contains(" apple"));
        assert!(frame.row_text(3).contains(" apricot"));
        assert_eq!(frame.get(7, 2).unwrap().style.bg, Role::PopupSelected);
    }

    #[test]
    fn test_notification_shown() {
        let mut ed = editor("", 40, 8);
        ed.saved();
        let frame = compose(&mut ed, None, Instant::now());
        assert!(frame.row_text(4).ends_with("File Saved"));
    }

    #[test]
    fn test_config_menu_box() {
        let mut ed = editor("", 60, 20);
        press(&mut ed, ":config");
        ed.handle(InputEvent::Key(Key::Enter));
        let frame = compose(&mut ed, None, Instant::now());
        let text: Vec<String> = (0..20).map(|y| frame.row_text(y)).collect();
        assert!(text.iter().any(|l| l.contains("Configuration Menu")));
        assert!(text.iter().any(|l| l.contains("Line Numbers: [X]")));
        assert!(text.iter().any(|l| l.contains("Foreground: #c0caf5")));
        assert_eq!(frame.cursor, None);
    }

    #[test]
    fn test_terminal_grid() {
        let mut ed = editor("", 20, 6);
        press(&mut ed, ":term");
        ed.handle(InputEvent::Key(Key::Enter));
        assert_eq!(*ed.mode(), Mode::Terminal);

        let mut state = TerminalState::new(20, 4);
        AnsiParser::new().feed(b"$ \x1b[31mls\x1b[0m", &mut state);
        let frame = compose(&mut ed, Some(&state), Instant::now());

        assert_eq!(frame.row_text(0), "$ ls");
        assert_eq!(frame.get(2, 0).unwrap().style.fg, Ink::Ansi(AnsiColor::Red));
        assert_eq!(frame.cursor, Some((4, 0)));
        assert!(frame.row_text(4).starts_with(" TERMINAL "));
        assert_eq!(frame.row_text(5), TERMINAL_HINTS.trim_end());
    }
}
