//! rix - A modal terminal text editor with an embedded shell
//!
//! rix edits one file at a time with vi-style modes and can hand the whole
//! screen to a shell running in a pseudo-terminal without leaving the editor.
//!
//! # Quick Start
//!
//! ```text
//! rix notes.py          # Edit a file
//! rix -s /bin/zsh       # Use zsh for :term
//! rix --scheme nord     # Start with the nord color scheme
//! ```
//!
//! # Keys
//!
//! | Mode | Key | Action |
//! |------|-----|--------|
//! | NORMAL | i | Insert |
//! | NORMAL | : | Command line |
//! | NORMAL | h/j/k/l | Move |
//! | NORMAL | x / o | Delete char / open line below |
//! | INSERT | Tab | Complete or indent |
//! | COMMAND | w, q, wq, u, r, config, term | Save, quit, undo, redo, menu, shell |
//! | TERMINAL | Ctrl+W | Back to the editor |

mod app;
mod config;
mod core;
mod editor;
mod input;
mod ui;

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use crossterm::event::{self, Event, KeyEventKind};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::app::App;
use crate::config::{Config, Theme};
use crate::core::pty::{resolve_shell, NativePty};
use crate::editor::autocomplete::{Autocomplete, BufferWords, CompletionProvider, NoCompletion};
use crate::editor::document::Document;
use crate::editor::layout::Layout;
use crate::editor::{file, Editor};
use crate::input::InputEvent;
use crate::ui::{KeyMapper, Renderer};

/// Command line options
#[derive(Debug, Default)]
struct Args {
    /// File to edit
    file: Option<PathBuf>,
    /// Shell command for :term
    shell: Option<String>,
    /// Start with the gutter hidden
    no_line_numbers: bool,
    /// Color scheme override
    scheme: Option<String>,
}

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    eprintln!("rix {}", VERSION);
}

fn print_help() {
    eprintln!("rix {} - A modal terminal text editor with an embedded shell", VERSION);
    eprintln!();
    eprintln!("Usage: rix [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -s, --shell <CMD>       Shell for :term (default: config, then $SHELL)");
    eprintln!("  -n, --no-line-numbers   Hide the line number gutter");
    eprintln!("  --scheme <NAME>         Color scheme");
    eprintln!("  -v, --version           Show version");
    eprintln!("  -h, --help              Show this help");
    eprintln!();
    eprintln!("Commands (type : in NORMAL mode):");
    eprintln!("  :w                      Save");
    eprintln!("  :q                      Quit");
    eprintln!("  :wq                     Save and quit");
    eprintln!("  :u / :r                 Undo / redo");
    eprintln!("  :config                 Configuration menu");
    eprintln!("  :term                   Open the shell (Ctrl+W returns)");
    eprintln!();
    eprintln!("Configuration: ~/.rix/config.toml");
    eprintln!("Log file:      ~/.rix/rix.log (filter with RIX_LOG)");
    eprintln!();
    eprintln!("Color schemes: {}", Theme::list().join(", "));
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-s" | "--shell" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing shell argument".to_string());
                }
                parsed.shell = Some(args[i].clone());
            }
            "-n" | "--no-line-numbers" => {
                parsed.no_line_numbers = true;
            }
            "--scheme" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing scheme argument".to_string());
                }
                parsed.scheme = Some(args[i].clone());
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
            arg => {
                if parsed.file.is_some() {
                    return Err(format!("Unexpected argument: {}", arg));
                }
                parsed.file = Some(PathBuf::from(arg));
            }
        }
        i += 1;
    }

    Ok(parsed)
}

/// Log to ~/.rix/rix.log; stdout belongs to the UI
fn init_logging() {
    let Some(log_path) = config::log_path() else {
        return;
    };

    // Open log file (append mode)
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    else {
        return;
    };

    let filter = EnvFilter::try_from_env("RIX_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn main() -> anyhow::Result<()> {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    init_logging();
    info!("rix {} starting...", VERSION);

    let config = Config::load();
    let theme = match &args.scheme {
        Some(name) => Theme::by_name(name),
        None => config.theme(),
    };
    let shell = resolve_shell(args.shell.as_deref(), config.shell.as_deref());

    let doc = match &args.file {
        Some(path) => {
            let doc = file::load_or_empty(path);
            info!("Loaded {} ({} lines)", path.display(), doc.line_count());
            doc
        }
        None => Document::new(),
    };

    let provider: Arc<dyn CompletionProvider> = if config.completion.enabled {
        Arc::new(BufferWords)
    } else {
        Arc::new(NoCompletion)
    };
    let mut autocomplete = if config.completion.background {
        Autocomplete::with_worker(provider)
    } else {
        Autocomplete::new(provider)
    };
    autocomplete.set_enabled(config.completion.enabled);

    let (cols, rows) = Renderer::size().context("Failed to query terminal size")?;
    let layout = Layout::new(cols, rows, config.show_line_numbers && !args.no_line_numbers);
    let editor = Editor::new(doc, args.file, layout, theme, autocomplete);
    let mut app = App::new(editor, NativePty, shell, &config.terminal);

    let mut renderer = Renderer::new();
    renderer.init().context("Failed to initialize terminal")?;

    let result = run_main_loop(&mut app, &mut renderer);

    renderer.cleanup()?;
    match &result {
        Ok(()) => info!("rix exiting"),
        Err(e) => tracing::error!("rix exiting with error: {:#}", e),
    }
    result
}

fn run_main_loop(app: &mut App<NativePty>, renderer: &mut Renderer) -> anyhow::Result<()> {
    let mut dirty = true;

    while !app.should_quit() {
        dirty |= app.tick();

        // Notifications expire on their own
        if dirty || app.editor.has_notifications() {
            let frame = app.compose(Instant::now());
            renderer.render(&frame, &app.editor.theme)?;
            dirty = false;
        }

        if !event::poll(app.poll_timeout())? {
            continue;
        }

        match event::read()? {
            Event::Key(key_event) => {
                // Only process key press events
                if key_event.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(key) = KeyMapper::map(&key_event) {
                    app.handle(InputEvent::Key(key));
                    dirty = true;
                }
            }
            Event::Resize(cols, rows) => {
                app.handle(InputEvent::Resize(cols, rows));
                renderer.invalidate();
                dirty = true;
            }
            _ => {}
        }
    }

    Ok(())
}
