//! Application driver
//!
//! Carries out the effects the editor asks for and owns the shell session.
//! One tick polls the session and completion worker; input events go through
//! [`App::handle`].

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::TerminalConfig;
use crate::core::pty::PtyBackend;
use crate::core::session::{PollOutcome, Session};
use crate::editor::layout::CHROME_ROWS;
use crate::editor::{file, Editor, Effect, Mode};
use crate::input::InputEvent;
use crate::ui::{view, Frame};

pub struct App<B: PtyBackend> {
    pub editor: Editor,
    session: Option<Session>,
    backend: B,
    shell: String,
    active_poll: Duration,
    idle_poll: Duration,
    quit: bool,
}

impl<B: PtyBackend> App<B> {
    pub fn new(editor: Editor, backend: B, shell: String, poll: &TerminalConfig) -> Self {
        Self {
            editor,
            session: None,
            backend,
            shell,
            active_poll: Duration::from_millis(poll.active_poll_ms),
            idle_poll: Duration::from_millis(poll.idle_poll_ms),
            quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// How long to wait for input before the next tick
    pub fn poll_timeout(&self) -> Duration {
        if *self.editor.mode() == Mode::Terminal {
            self.active_poll
        } else {
            self.idle_poll
        }
    }

    /// Compose the screen: the shell's grid in TERMINAL mode, else the editor
    pub fn compose(&mut self, now: Instant) -> Frame {
        let terminal = match self.editor.mode() {
            Mode::Terminal => self.session.as_ref().map(|s| &s.state),
            _ => None,
        };
        view::compose(&mut self.editor, terminal, now)
    }

    /// Route one input event and carry out its effects
    pub fn handle(&mut self, event: InputEvent) {
        for effect in self.editor.handle(event) {
            self.apply(effect);
        }
    }

    /// Pump the shell and the completion worker. Returns true if the screen
    /// needs redrawing.
    pub fn tick(&mut self) -> bool {
        let mut changed = self.editor.poll_completions();

        if let Some(session) = self.session.as_mut() {
            match session.poll() {
                PollOutcome::Idle => {}
                PollOutcome::Output => changed = true,
                PollOutcome::Closed => {
                    self.close_session();
                    changed = true;
                }
            }
        }

        changed
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Save => match file::save(self.editor.filename(), &self.editor.doc) {
                Ok(()) => {
                    info!("Saved {:?}", self.editor.filename());
                    self.editor.saved();
                }
                Err(e) => warn!("Save failed: {}", e),
            },
            Effect::Quit => self.quit = true,
            Effect::OpenTerminal => self.open_terminal(),
            Effect::WritePty(bytes) => {
                let Some(session) = self.session.as_mut() else {
                    self.editor.terminal_closed();
                    return;
                };
                if let Err(e) = session.write(&bytes) {
                    warn!("{}", e);
                    self.close_session();
                }
            }
        }
    }

    /// Re-attach to a live session or spawn a new one sized to the viewport
    fn open_terminal(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if session.is_alive() {
                info!("Re-attaching to shell session");
                return;
            }
            self.session = None;
        }

        let rows = self.editor.layout.rows().saturating_sub(CHROME_ROWS).max(1);
        let cols = self.editor.layout.cols().max(1);
        match Session::open(&self.backend, &self.shell, rows, cols) {
            Ok(session) => {
                info!("Spawned {} ({}x{})", self.shell, cols, rows);
                self.session = Some(session);
            }
            Err(e) => {
                warn!("{}", e);
                self.editor.terminal_closed();
            }
        }
    }

    fn close_session(&mut self) {
        if self.session.take().is_some() {
            info!("Shell session closed");
        }
        self.editor.terminal_closed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use crate::config::Theme;
    use crate::core::pty::testing::{FakeBackend, FakeRead};
    use crate::editor::autocomplete::{Autocomplete, NoCompletion};
    use crate::editor::document::Document;
    use crate::editor::layout::Layout;
    use crate::input::{Key, TERMINAL_EXIT};

    fn app_with(backend: &FakeBackend, filename: Option<PathBuf>) -> App<FakeBackend> {
        let editor = Editor::new(
            Document::from_text("hello"),
            filename,
            Layout::new(40, 12, true),
            Theme::default(),
            Autocomplete::new(Arc::new(NoCompletion)),
        );
        App::new(editor, backend.clone(), "sh".to_string(), &TerminalConfig::default())
    }

    fn command(app: &mut App<FakeBackend>, text: &str) {
        app.handle(InputEvent::Key(Key::Char(':')));
        for ch in text.chars() {
            app.handle(InputEvent::Key(Key::Char(ch)));
        }
        app.handle(InputEvent::Key(Key::Enter));
    }

    #[test]
    fn test_term_spawns_sized_session() {
        let backend = FakeBackend::new();
        let mut app = app_with(&backend, None);
        command(&mut app, "term");

        assert_eq!(*app.editor.mode(), Mode::Terminal);
        assert_eq!(*backend.last_spawn.lock().unwrap(), Some(("sh".to_string(), 10, 40)));
        assert!(app.compose(Instant::now()).row_text(10).starts_with(" TERMINAL "));
        assert_eq!(app.poll_timeout(), Duration::from_millis(10));
    }

    #[test]
    fn test_keys_forwarded_and_ctrl_w_returns() {
        let backend = FakeBackend::new();
        let mut app = app_with(&backend, None);
        command(&mut app, "term");

        app.handle(InputEvent::Key(Key::Char('l')));
        app.handle(InputEvent::Key(Key::Enter));
        app.handle(InputEvent::Key(Key::Up));
        assert_eq!(backend.written(), b"l\n\x1b[A");

        app.handle(InputEvent::Key(Key::Byte(TERMINAL_EXIT)));
        assert_eq!(*app.editor.mode(), Mode::Normal);
        assert!(app.compose(Instant::now()).row_text(10).starts_with(" NORMAL "));
        assert_eq!(app.poll_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn test_reattach_to_live_session() {
        let backend = FakeBackend::new();
        let mut app = app_with(&backend, None);
        command(&mut app, "term");
        app.handle(InputEvent::Key(Key::Byte(TERMINAL_EXIT)));
        command(&mut app, "term");
        assert_eq!(backend.spawn_count(), 1);

        app.handle(InputEvent::Key(Key::Byte(TERMINAL_EXIT)));
        backend.alive.store(false, Ordering::SeqCst);
        command(&mut app, "term");
        assert_eq!(backend.spawn_count(), 2);
    }

    #[test]
    fn test_output_reaches_grid() {
        let backend = FakeBackend::new();
        let mut app = app_with(&backend, None);
        command(&mut app, "term");

        assert!(!app.tick());
        backend.push(FakeRead::Data(b"\x1b[2J\x1b[Hok".to_vec()));
        assert!(app.tick());
        assert_eq!(app.compose(Instant::now()).row_text(0), "ok");
    }

    #[test]
    fn test_child_exit_returns_to_normal() {
        let backend = FakeBackend::new();
        let mut app = app_with(&backend, None);
        command(&mut app, "term");

        backend.push(FakeRead::Eof);
        assert!(app.tick());
        assert_eq!(*app.editor.mode(), Mode::Normal);
        assert!(app.session.is_none());
        assert!(backend.killed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_session_polled_outside_terminal_mode() {
        let backend = FakeBackend::new();
        let mut app = app_with(&backend, None);
        command(&mut app, "term");
        app.handle(InputEvent::Key(Key::Byte(TERMINAL_EXIT)));

        backend.push(FakeRead::Data(b"bg".to_vec()));
        assert!(app.tick());
        assert!(app.session.as_ref().is_some_and(|s| s.state.row_text(0) == "bg"));
    }

    #[test]
    fn test_full_pty_input_keeps_session() {
        let backend = FakeBackend::new();
        let mut app = app_with(&backend, None);
        command(&mut app, "term");
        backend.block_writes.store(true, Ordering::SeqCst);

        app.handle(InputEvent::Key(Key::Char('a')));
        assert_eq!(*app.editor.mode(), Mode::Terminal);
        assert!(app.session.as_ref().is_some_and(|s| s.queued() == 1));
        assert!(!backend.killed.load(Ordering::SeqCst));

        backend.block_writes.store(false, Ordering::SeqCst);
        app.tick();
        assert_eq!(backend.written(), b"a");
    }

    #[test]
    fn test_spawn_failure_stays_normal() {
        let backend = FakeBackend::new();
        backend.fail_spawn.store(true, Ordering::SeqCst);
        let mut app = app_with(&backend, None);
        command(&mut app, "term");

        assert_eq!(*app.editor.mode(), Mode::Normal);
        assert!(app.session.is_none());
    }

    #[test]
    fn test_write_quit() {
        let path = std::env::temp_dir().join(format!("rix-app-{}.txt", std::process::id()));
        let backend = FakeBackend::new();
        let mut app = app_with(&backend, Some(path.clone()));
        app.handle(InputEvent::Key(Key::Char('x')));
        assert!(app.editor.doc.is_modified());

        command(&mut app, "wq");
        assert!(app.should_quit());
        assert!(!app.editor.doc.is_modified());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ello");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_save_without_name_is_not_fatal() {
        let backend = FakeBackend::new();
        let mut app = app_with(&backend, None);
        app.handle(InputEvent::Key(Key::Char('x')));
        command(&mut app, "w");

        assert!(!app.should_quit());
        assert!(app.editor.doc.is_modified());
        assert_eq!(*app.editor.mode(), Mode::Normal);
    }
}
