//! Modal editor
//!
//! Every input event goes through [`Editor::handle`], which runs the active
//! mode's handler and returns the next mode plus any effects the application
//! must carry out (saving, quitting, talking to the PTY).
//!
//! - **document**: lines and cursor
//! - **history**: snapshot undo/redo
//! - **layout**: soft wrap and scroll
//! - **autocomplete**: completion providers and suggestion state
//! - **config_menu**: the CONFIG mode menu
//! - **file**: load and save

pub mod autocomplete;
pub mod config_menu;
pub mod document;
pub mod file;
pub mod history;
pub mod layout;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::Theme;
use crate::input::{InputEvent, Key, TERMINAL_EXIT};

use self::autocomplete::Autocomplete;
use self::config_menu::{ConfigMenu, MenuOutcome};
use self::document::Document;
use self::history::History;
use self::layout::Layout;

/// How long a notification stays on screen
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Spaces inserted by Tab when there is nothing to complete
const TAB_WIDTH: usize = 4;

/// Active mode and its transient state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Insert,
    /// Command line text typed after `:`
    Command(String),
    Config(ConfigMenu),
    /// Suggestion popup over INSERT
    Autocomplete,
    /// Keys go to the shell
    Terminal,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Insert => "INSERT",
            Mode::Command(_) => "COMMAND",
            Mode::Config(_) => "CONFIG",
            Mode::Autocomplete => "AUTOCOMPLETE",
            Mode::Terminal => "TERMINAL",
        }
    }
}

/// Work the application must do on the editor's behalf
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Save,
    Quit,
    /// Attach to the shell session, spawning one if needed
    OpenTerminal,
    WritePty(Vec<u8>),
}

/// A transient message
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub posted: Instant,
}

pub struct Editor {
    pub doc: Document,
    pub layout: Layout,
    pub autocomplete: Autocomplete,
    pub theme: Theme,
    history: History,
    mode: Mode,
    filename: Option<PathBuf>,
    notifications: Vec<Notification>,
}

impl Editor {
    pub fn new(
        doc: Document,
        filename: Option<PathBuf>,
        layout: Layout,
        theme: Theme,
        autocomplete: Autocomplete,
    ) -> Self {
        let mut editor = Self {
            doc,
            layout,
            autocomplete,
            theme,
            history: History::new(),
            mode: Mode::Normal,
            filename,
            notifications: Vec::new(),
        };
        editor.layout.scroll_to_cursor(&editor.doc);
        editor
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Run one input event through the active mode
    pub fn handle(&mut self, event: InputEvent) -> Vec<Effect> {
        let effects = match event {
            InputEvent::Resize(cols, rows) => {
                self.layout.resize(cols, rows);
                Vec::new()
            }
            InputEvent::Key(key) => {
                let mode = std::mem::replace(&mut self.mode, Mode::Normal);
                let (next, effects) = match mode {
                    Mode::Normal => self.normal(key),
                    Mode::Insert => self.insert(key),
                    Mode::Command(text) => self.command(text, key),
                    Mode::Config(menu) => self.config(menu, key),
                    Mode::Autocomplete => self.autocomplete(key),
                    Mode::Terminal => self.terminal(key),
                };
                self.mode = next;
                effects
            }
        };

        self.layout.scroll_to_cursor(&self.doc);
        effects
    }

    /// The shell session ended or could not start
    pub fn terminal_closed(&mut self) {
        if self.mode == Mode::Terminal {
            self.mode = Mode::Normal;
        }
    }

    /// Apply finished background completions. Returns true if anything changed.
    pub fn poll_completions(&mut self) -> bool {
        if !matches!(self.mode, Mode::Insert | Mode::Autocomplete) {
            return false;
        }
        let word = self.doc.current_word().to_string();
        self.autocomplete.poll(&word)
    }

    /// Called once a save succeeded
    pub fn saved(&mut self) {
        self.doc.mark_saved();
        self.notify("File Saved");
    }

    pub fn notify(&mut self, message: &str) {
        self.notifications.push(Notification {
            message: message.to_string(),
            posted: Instant::now(),
        });
    }

    /// Notifications younger than the TTL, oldest first
    pub fn notifications(&mut self, now: Instant) -> &[Notification] {
        self.notifications
            .retain(|n| now.saturating_duration_since(n.posted) < NOTIFICATION_TTL);
        &self.notifications
    }

    pub fn has_notifications(&self) -> bool {
        !self.notifications.is_empty()
    }

    /// Apply an edit, recording an undo frame only if it changed the document
    fn edit(&mut self, f: impl FnOnce(&mut Document) -> bool) {
        let before = self.doc.snapshot();
        if f(&mut self.doc) {
            self.history.record(before);
        }
    }

    fn move_cursor(&mut self, key: Key) {
        let (dx, dy) = match key {
            Key::Char('h') | Key::Left => (-1, 0),
            Key::Char('j') | Key::Down => (0, 1),
            Key::Char('k') | Key::Up => (0, -1),
            Key::Char('l') | Key::Right => (1, 0),
            _ => return,
        };
        self.doc.move_by(dx, dy);
    }

    fn normal(&mut self, key: Key) -> (Mode, Vec<Effect>) {
        match key {
            Key::Char('i') => (Mode::Insert, Vec::new()),
            Key::Char(':') => (Mode::Command(String::new()), Vec::new()),
            Key::Char('x') => {
                self.edit(Document::delete_forward);
                (Mode::Normal, Vec::new())
            }
            Key::Char('o') => {
                self.edit(|doc| {
                    doc.open_line_below();
                    true
                });
                (Mode::Insert, Vec::new())
            }
            _ => {
                self.move_cursor(key);
                (Mode::Normal, Vec::new())
            }
        }
    }

    fn insert(&mut self, key: Key) -> (Mode, Vec<Effect>) {
        let mode = self.insert_key(key);
        if mode == Mode::Insert {
            self.refresh_suggestions();
        }
        (mode, Vec::new())
    }

    fn insert_key(&mut self, key: Key) -> Mode {
        match key {
            Key::Esc => {
                self.autocomplete.clear();
                return Mode::Normal;
            }
            Key::Tab => return self.tab(),
            Key::Backspace => self.edit(Document::backspace),
            Key::Delete => self.edit(Document::delete_forward),
            Key::Enter => self.edit(|doc| {
                doc.split_line();
                true
            }),
            Key::Right if self.autocomplete.has_suggestions() => {
                if let Some(first) = self.autocomplete.first().map(str::to_string) {
                    self.accept(&first);
                }
            }
            Key::Left | Key::Right | Key::Up | Key::Down => self.move_cursor(key),
            Key::Char(ch) if !ch.is_control() => self.edit(|doc| {
                doc.insert_char(ch);
                true
            }),
            _ => {}
        }
        Mode::Insert
    }

    /// Complete the word before the cursor, or indent
    fn tab(&mut self) -> Mode {
        if !self.doc.current_word().is_empty() {
            let cursor = self.doc.cursor();
            let text = self.doc.text();
            if !self
                .autocomplete
                .query_now(&text, cursor.row + 1, cursor.col)
                .is_empty()
            {
                return Mode::Autocomplete;
            }
        }

        self.edit(|doc| {
            for _ in 0..TAB_WIDTH {
                doc.insert_char(' ');
            }
            true
        });
        Mode::Insert
    }

    fn refresh_suggestions(&mut self) {
        let word = self.doc.current_word().to_string();
        if word.chars().count() <= 1 {
            self.autocomplete.clear();
            return;
        }
        let cursor = self.doc.cursor();
        let text = self.doc.text();
        self.autocomplete
            .refresh(&text, cursor.row + 1, cursor.col, &word);
    }

    /// Replace the current word with `suggestion`
    fn accept(&mut self, suggestion: &str) {
        self.edit(|doc| {
            doc.replace_current_word(suggestion);
            true
        });
        self.autocomplete.clear();
    }

    fn autocomplete(&mut self, key: Key) -> (Mode, Vec<Effect>) {
        if !self.autocomplete.has_suggestions() {
            return self.insert(key);
        }

        match key {
            Key::Char('j') | Key::Down | Key::Tab => {
                self.autocomplete.select_next();
                (Mode::Autocomplete, Vec::new())
            }
            Key::Char('k') | Key::Up => {
                self.autocomplete.select_prev();
                (Mode::Autocomplete, Vec::new())
            }
            Key::Enter | Key::Right => {
                if let Some(choice) = self.autocomplete.selected_suggestion().map(str::to_string) {
                    self.accept(&choice);
                }
                (Mode::Insert, Vec::new())
            }
            _ => self.insert(key),
        }
    }

    fn command(&mut self, mut text: String, key: Key) -> (Mode, Vec<Effect>) {
        match key {
            Key::Esc => (Mode::Normal, Vec::new()),
            Key::Enter => self.execute(text.trim()),
            Key::Backspace => {
                text.pop();
                (Mode::Command(text), Vec::new())
            }
            Key::Char(ch) if !ch.is_control() => {
                text.push(ch);
                (Mode::Command(text), Vec::new())
            }
            _ => (Mode::Command(text), Vec::new()),
        }
    }

    fn execute(&mut self, command: &str) -> (Mode, Vec<Effect>) {
        match command {
            "w" => (Mode::Normal, vec![Effect::Save]),
            "q" => (Mode::Normal, vec![Effect::Quit]),
            "wq" => (Mode::Normal, vec![Effect::Save, Effect::Quit]),
            "u" => {
                self.history.undo(&mut self.doc);
                (Mode::Normal, Vec::new())
            }
            "r" => {
                self.history.redo(&mut self.doc);
                (Mode::Normal, Vec::new())
            }
            "config" => (Mode::Config(ConfigMenu::new()), Vec::new()),
            "term" => (Mode::Terminal, vec![Effect::OpenTerminal]),
            other => {
                tracing::debug!("Unknown command {:?}", other);
                (Mode::Normal, Vec::new())
            }
        }
    }

    fn config(&mut self, mut menu: ConfigMenu, key: Key) -> (Mode, Vec<Effect>) {
        match menu.handle(key, &self.theme) {
            MenuOutcome::Close => return (Mode::Normal, Vec::new()),
            MenuOutcome::ToggleLineNumbers => {
                let show = !self.layout.show_line_numbers();
                self.layout.set_line_numbers(show);
            }
            MenuOutcome::SetColor(role, color) => {
                tracing::info!("Set {:?} to {}", role, color.to_hex());
                self.theme.set(role, color);
            }
            MenuOutcome::Stay => {}
        }
        (Mode::Config(menu), Vec::new())
    }

    fn terminal(&mut self, key: Key) -> (Mode, Vec<Effect>) {
        if key == Key::Byte(TERMINAL_EXIT) {
            return (Mode::Normal, Vec::new());
        }
        (Mode::Terminal, vec![Effect::WritePty(key.pty_bytes())])
    }
}

#[cfg(test)]
mod tests {
    use super::autocomplete::{BufferWords, CompletionProvider, NoCompletion};
    use super::document::Cursor;
    use super::*;
    use crate::config::{Color, Role};
    use std::sync::Arc;

    struct Fixed(Vec<&'static str>);

    impl CompletionProvider for Fixed {
        fn complete(&self, _text: &str, _line: usize, _column: usize) -> Vec<String> {
            self.0.iter().map(|s| s.to_string()).collect()
        }
    }

    fn editor_with(text: &str, provider: Arc<dyn CompletionProvider>) -> Editor {
        Editor::new(
            Document::from_text(text),
            Some(PathBuf::from("test.py")),
            Layout::new(80, 24, true),
            Theme::default(),
            Autocomplete::new(provider),
        )
    }

    fn editor(text: &str) -> Editor {
        editor_with(text, Arc::new(NoCompletion))
    }

    fn press(editor: &mut Editor, keys: &[Key]) -> Vec<Effect> {
        keys.iter()
            .flat_map(|k| editor.handle(InputEvent::Key(*k)))
            .collect()
    }

    fn type_str(editor: &mut Editor, text: &str) -> Vec<Effect> {
        let keys: Vec<Key> = text.chars().map(Key::Char).collect();
        press(editor, &keys)
    }

    fn run_command(editor: &mut Editor, command: &str) -> Vec<Effect> {
        press(editor, &[Key::Char(':')]);
        type_str(editor, command);
        press(editor, &[Key::Enter])
    }

    #[test]
    fn test_wq_saves_once_and_quits() {
        let mut ed = editor("");
        press(&mut ed, &[Key::Char('i')]);
        type_str(&mut ed, "hi");
        press(&mut ed, &[Key::Esc]);
        assert!(ed.doc.is_modified());

        let effects = run_command(&mut ed, "wq");
        assert_eq!(effects, vec![Effect::Save, Effect::Quit]);
    }

    #[test]
    fn test_commands_trimmed_and_exact() {
        let mut ed = editor("");
        assert_eq!(run_command(&mut ed, " w "), vec![Effect::Save]);
        assert_eq!(*ed.mode(), Mode::Normal);
        assert!(run_command(&mut ed, "W").is_empty());
        assert_eq!(*ed.mode(), Mode::Normal);
        assert!(run_command(&mut ed, "write").is_empty());
        assert_eq!(run_command(&mut ed, "q"), vec![Effect::Quit]);
    }

    #[test]
    fn test_command_escape_and_backspace() {
        let mut ed = editor("");
        press(&mut ed, &[Key::Char(':'), Key::Char('x'), Key::Backspace, Key::Backspace]);
        assert_eq!(*ed.mode(), Mode::Command(String::new()));
        press(&mut ed, &[Key::Esc]);
        assert_eq!(*ed.mode(), Mode::Normal);
    }

    #[test]
    fn test_undo_redo_commands() {
        let mut ed = editor("");
        press(&mut ed, &[Key::Char('i')]);
        type_str(&mut ed, "ab");
        press(&mut ed, &[Key::Esc]);

        run_command(&mut ed, "u");
        assert_eq!(ed.doc.line(0), "a");
        run_command(&mut ed, "r");
        assert_eq!(ed.doc.line(0), "ab");
    }

    #[test]
    fn test_redo_invalidated_by_edit() {
        let mut ed = editor("abc");
        press(&mut ed, &[Key::Char('x')]);
        run_command(&mut ed, "u");
        press(&mut ed, &[Key::Char('l'), Key::Char('x')]);
        let after = ed.doc.snapshot();
        run_command(&mut ed, "r");
        assert_eq!(ed.doc.snapshot(), after);
    }

    #[test]
    fn test_normal_navigation_and_delete() {
        let mut ed = editor("abc\ndef");
        press(&mut ed, &[Key::Char('j'), Key::Char('l'), Key::Char('x')]);
        assert_eq!(ed.doc.line(1), "df");
        press(&mut ed, &[Key::Up, Key::Left]);
        assert_eq!(ed.doc.cursor(), Cursor::new(0, 0));
    }

    #[test]
    fn test_noop_delete_takes_no_checkpoint() {
        let mut ed = editor("");
        press(&mut ed, &[Key::Char('x')]);
        press(&mut ed, &[Key::Char('i'), Key::Backspace]);
        assert_eq!(ed.history().undo_len(), 0);
    }

    #[test]
    fn test_o_opens_line_below() {
        let mut ed = editor("first\nsecond");
        press(&mut ed, &[Key::Char('o')]);
        assert_eq!(*ed.mode(), Mode::Insert);
        assert_eq!(ed.doc.lines()[1], "");
        assert_eq!(ed.doc.cursor(), Cursor::new(1, 0));
    }

    #[test]
    fn test_insert_editing_keys() {
        let mut ed = editor("");
        press(&mut ed, &[Key::Char('i')]);
        type_str(&mut ed, "ab");
        press(&mut ed, &[Key::Enter]);
        type_str(&mut ed, "c");
        press(&mut ed, &[Key::Left, Key::Delete, Key::Backspace]);
        assert_eq!(ed.doc.lines(), &["ab".to_string()]);
        assert_eq!(ed.history().undo_len(), 6);
    }

    #[test]
    fn test_tab_without_word_inserts_spaces_once() {
        let mut ed = editor("");
        press(&mut ed, &[Key::Char('i'), Key::Tab]);
        assert_eq!(ed.doc.line(0), "    ");
        assert_eq!(ed.history().undo_len(), 1);
        run_command(&mut ed, "u");
        assert_eq!(ed.doc.line(0), "");
    }

    #[test]
    fn test_tab_with_no_candidates_indents() {
        let mut ed = editor("");
        press(&mut ed, &[Key::Char('i')]);
        type_str(&mut ed, "zz");
        press(&mut ed, &[Key::Tab]);
        assert_eq!(*ed.mode(), Mode::Insert);
        assert_eq!(ed.doc.line(0), "zz    ");
    }

    #[test]
    fn test_accept_replaces_current_word() {
        let mut ed = editor_with("", Arc::new(Fixed(vec!["print", "println"])));
        press(&mut ed, &[Key::Char('i')]);
        type_str(&mut ed, "pri");
        press(&mut ed, &[Key::Tab]);
        assert_eq!(*ed.mode(), Mode::Autocomplete);

        press(&mut ed, &[Key::Enter]);
        assert_eq!(*ed.mode(), Mode::Insert);
        assert_eq!(ed.doc.line(0), "print");
        assert_eq!(ed.doc.cursor(), Cursor::new(0, 5));

        press(&mut ed, &[Key::Esc]);
        run_command(&mut ed, "u");
        assert_eq!(ed.doc.line(0), "pri");
    }

    #[test]
    fn test_autocomplete_selection_cycles() {
        let mut ed = editor_with("", Arc::new(Fixed(vec!["alpha", "alpine", "altitude"])));
        press(&mut ed, &[Key::Char('i')]);
        type_str(&mut ed, "al");
        press(&mut ed, &[Key::Tab, Key::Char('k')]);
        assert_eq!(ed.autocomplete.selected_suggestion(), Some("altitude"));
        press(&mut ed, &[Key::Tab, Key::Down]);
        assert_eq!(ed.autocomplete.selected_suggestion(), Some("alpine"));
        press(&mut ed, &[Key::Right]);
        assert_eq!(ed.doc.line(0), "alpine");
    }

    #[test]
    fn test_autocomplete_other_key_forwards_to_insert() {
        let mut ed = editor_with("", Arc::new(Fixed(vec!["foo_bar"])));
        press(&mut ed, &[Key::Char('i')]);
        type_str(&mut ed, "fo");
        press(&mut ed, &[Key::Tab, Key::Char('(')]);
        assert_eq!(*ed.mode(), Mode::Insert);
        assert_eq!(ed.doc.line(0), "fo(");
    }

    #[test]
    fn test_autocomplete_escape_returns_to_normal() {
        let mut ed = editor_with("", Arc::new(Fixed(vec!["foo_bar"])));
        press(&mut ed, &[Key::Char('i')]);
        type_str(&mut ed, "fo");
        press(&mut ed, &[Key::Tab, Key::Esc]);
        assert_eq!(*ed.mode(), Mode::Normal);
        assert!(!ed.autocomplete.has_suggestions());
    }

    #[test]
    fn test_proactive_suggestions_and_right_accepts() {
        let mut ed = editor_with("printer\n", Arc::new(BufferWords));
        press(&mut ed, &[Key::Char('o')]);
        type_str(&mut ed, "p");
        assert!(!ed.autocomplete.has_suggestions());
        type_str(&mut ed, "ri");
        assert_eq!(ed.autocomplete.suggestions(), &["printer".to_string()]);

        press(&mut ed, &[Key::Right]);
        assert_eq!(ed.doc.line(1), "printer");
        assert_eq!(ed.doc.cursor(), Cursor::new(1, 7));
    }

    #[test]
    fn test_escape_clears_suggestions() {
        let mut ed = editor_with("printer\n", Arc::new(BufferWords));
        press(&mut ed, &[Key::Char('o')]);
        type_str(&mut ed, "pri");
        assert!(ed.autocomplete.has_suggestions());
        press(&mut ed, &[Key::Esc]);
        assert!(!ed.autocomplete.has_suggestions());
        assert_eq!(*ed.mode(), Mode::Normal);
    }

    #[test]
    fn test_term_and_ctrl_w() {
        let mut ed = editor("");
        assert_eq!(run_command(&mut ed, "term"), vec![Effect::OpenTerminal]);
        assert_eq!(*ed.mode(), Mode::Terminal);

        let effects = press(&mut ed, &[Key::Char('l'), Key::Up, Key::Enter]);
        assert_eq!(
            effects,
            vec![
                Effect::WritePty(b"l".to_vec()),
                Effect::WritePty(b"\x1b[A".to_vec()),
                Effect::WritePty(vec![0x0A]),
            ]
        );

        assert!(press(&mut ed, &[Key::Byte(TERMINAL_EXIT)]).is_empty());
        assert_eq!(*ed.mode(), Mode::Normal);
    }

    #[test]
    fn test_terminal_closed_forces_normal() {
        let mut ed = editor("");
        run_command(&mut ed, "term");
        ed.terminal_closed();
        assert_eq!(*ed.mode(), Mode::Normal);
    }

    #[test]
    fn test_config_menu_toggle_and_color() {
        let mut ed = editor("");
        run_command(&mut ed, "config");
        assert!(matches!(ed.mode(), Mode::Config(_)));

        press(&mut ed, &[Key::Enter]);
        assert!(!ed.layout.show_line_numbers());

        press(&mut ed, &[Key::Char('j'), Key::Char('j'), Key::Char('j'), Key::Enter]);
        for _ in 0..7 {
            press(&mut ed, &[Key::Backspace]);
        }
        type_str(&mut ed, "#123456");
        press(&mut ed, &[Key::Enter]);
        assert_eq!(ed.theme.get(Role::Keyword), Color::new(0x12, 0x34, 0x56));

        press(&mut ed, &[Key::Enter, Key::Backspace, Key::Enter]);
        assert_eq!(ed.theme.get(Role::Keyword), Color::new(0x12, 0x34, 0x56));

        press(&mut ed, &[Key::Char('q')]);
        assert_eq!(*ed.mode(), Mode::Normal);
    }

    #[test]
    fn test_cursor_stays_on_screen() {
        let text: Vec<String> = (0..200).map(|i| "w".repeat(i % 120)).collect();
        let mut ed = editor(&text.join("\n"));
        ed.handle(InputEvent::Resize(40, 15));
        for key in [Key::Down; 150].iter().chain([Key::Up; 60].iter()) {
            ed.handle(InputEvent::Key(*key));
            let (row, _) = ed.layout.screen_cursor(&ed.doc).unwrap();
            assert!(row < ed.layout.text_rows());
        }
    }

    #[test]
    fn test_saved_posts_notification() {
        let mut ed = editor("");
        ed.saved();
        let now = Instant::now();
        assert_eq!(ed.notifications(now).len(), 1);
        assert!(ed.notifications(now + NOTIFICATION_TTL).is_empty());
    }
}
