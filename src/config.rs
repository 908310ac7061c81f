//! Configuration and color scheme management for rix.
//!
//! This module provides:
//! - TOML configuration file loading from `~/.rix/config.toml`
//! - Built-in color schemes addressed by semantic role
//! - Hex color parsing for the configuration menu
//!
//! # Configuration File
//!
//! ```toml
//! # Shell for the embedded terminal (optional, falls back to $SHELL)
//! shell = "/bin/zsh"
//!
//! # Color scheme: tokyo-night, nord, dracula, gruvbox-dark
//! color_scheme = "tokyo-night"
//!
//! show_line_numbers = true
//!
//! [terminal]
//! active_poll_ms = 10
//! idle_poll_ms = 100
//!
//! [completion]
//! enabled = true
//! background = true
//! ```

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Shell command for the embedded terminal
    pub shell: Option<String>,
    /// Color scheme name
    pub color_scheme: String,
    /// Show the line number gutter at startup
    pub show_line_numbers: bool,
    pub terminal: TerminalConfig,
    pub completion: CompletionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shell: None,
            color_scheme: "tokyo-night".to_string(),
            show_line_numbers: true,
            terminal: TerminalConfig::default(),
            completion: CompletionConfig::default(),
        }
    }
}

/// Tick cadence while a shell is attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Poll interval in TERMINAL mode
    pub active_poll_ms: u64,
    /// Poll interval in every other mode
    pub idle_poll_ms: u64,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            active_poll_ms: 10,
            idle_poll_ms: 100,
        }
    }
}

/// Completion settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub enabled: bool,
    /// Run proactive queries on a worker thread
    pub background: bool,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            background: true,
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults
    pub fn load() -> Self {
        match config_path() {
            Some(path) if path.exists() => match fs::read_to_string(&path) {
                Ok(content) => Self::parse(&content),
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", path.display(), e);
                    Self::default()
                }
            },
            _ => Self::default(),
        }
    }

    /// Parse TOML, falling back to defaults on error
    pub fn parse(content: &str) -> Self {
        toml::from_str(content).unwrap_or_else(|e| {
            tracing::warn!("Invalid config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Get the color scheme
    pub fn theme(&self) -> Theme {
        Theme::by_name(&self.color_scheme)
    }
}

/// `~/.rix`, created on first use
pub fn rix_dir() -> Option<PathBuf> {
    let dir = home_dir()?.join(".rix");
    if !dir.exists() {
        let _ = fs::create_dir_all(&dir);
    }
    Some(dir)
}

/// Get config file path
pub fn config_path() -> Option<PathBuf> {
    rix_dir().map(|dir| dir.join("config.toml"))
}

/// Get log file path
pub fn log_path() -> Option<PathBuf> {
    rix_dir().map(|dir| dir.join("rix.log"))
}

/// Color definition (RGB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RGB` or `#RRGGBB`
    pub fn from_hex(text: &str) -> Option<Self> {
        let digits = text.strip_prefix('#')?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return None,
        };

        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Format as `#rrggbb`
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Convert to crossterm Color
    pub fn to_crossterm(self) -> crossterm::style::Color {
        crossterm::style::Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

/// Semantic color roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Foreground,
    Background,
    Keyword,
    String,
    Comment,
    Definition,
    Gutter,
    StatusBackground,
    StatusAccent,
    StatusInfo,
    StatusError,
    Ghost,
    Popup,
    PopupSelected,
}

impl Role {
    pub const COUNT: usize = 14;

    fn index(self) -> usize {
        self as usize
    }
}

/// Color scheme definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub name: String,
    colors: [Color; Role::COUNT],
}

impl Default for Theme {
    fn default() -> Self {
        Self::tokyo_night()
    }
}

impl Theme {
    /// Build a scheme from its palette, in role declaration order
    fn from_palette(name: &str, palette: [(u8, u8, u8); Role::COUNT]) -> Self {
        Self {
            name: name.to_string(),
            colors: palette.map(|(r, g, b)| Color::new(r, g, b)),
        }
    }

    pub fn get(&self, role: Role) -> Color {
        self.colors[role.index()]
    }

    pub fn set(&mut self, role: Role, color: Color) {
        self.colors[role.index()] = color;
    }

    /// Tokyo Night scheme
    pub fn tokyo_night() -> Self {
        Self::from_palette(
            "tokyo-night",
            [
                (192, 202, 245), // foreground
                (26, 27, 38),    // background
                (187, 154, 247), // keyword
                (158, 206, 106), // string
                (86, 95, 137),   // comment
                (122, 162, 247), // def/class
                (59, 66, 97),    // gutter
                (59, 66, 97),    // status background
                (122, 162, 247), // status accent
                (224, 175, 104), // status info
                (247, 118, 142), // status error
                (86, 95, 137),   // ghost
                (36, 40, 59),    // popup
                (122, 162, 247), // popup selected
            ],
        )
    }

    /// Nord scheme
    pub fn nord() -> Self {
        Self::from_palette(
            "nord",
            [
                (216, 222, 233),
                (46, 52, 64),
                (129, 161, 193),
                (163, 190, 140),
                (97, 110, 136),
                (136, 192, 208),
                (76, 86, 106),
                (59, 66, 82),
                (136, 192, 208),
                (235, 203, 139),
                (191, 97, 106),
                (97, 110, 136),
                (59, 66, 82),
                (136, 192, 208),
            ],
        )
    }

    /// Dracula scheme
    pub fn dracula() -> Self {
        Self::from_palette(
            "dracula",
            [
                (248, 248, 242),
                (40, 42, 54),
                (255, 121, 198),
                (241, 250, 140),
                (98, 114, 164),
                (80, 250, 123),
                (98, 114, 164),
                (68, 71, 90),
                (189, 147, 249),
                (255, 184, 108),
                (255, 85, 85),
                (98, 114, 164),
                (68, 71, 90),
                (189, 147, 249),
            ],
        )
    }

    /// Gruvbox Dark scheme
    pub fn gruvbox_dark() -> Self {
        Self::from_palette(
            "gruvbox-dark",
            [
                (235, 219, 178),
                (40, 40, 40),
                (251, 73, 52),
                (184, 187, 38),
                (146, 131, 116),
                (250, 189, 47),
                (102, 92, 84),
                (60, 56, 54),
                (215, 153, 33),
                (131, 165, 152),
                (204, 36, 29),
                (124, 111, 100),
                (60, 56, 54),
                (215, 153, 33),
            ],
        )
    }

    /// Get scheme by name
    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "nord" => Self::nord(),
            "dracula" => Self::dracula(),
            "gruvbox-dark" | "gruvbox_dark" | "gruvbox" => Self::gruvbox_dark(),
            "tokyo-night" | "tokyo_night" | "tokyonight" => Self::tokyo_night(),
            other => {
                tracing::warn!("Unknown color scheme {:?}, using tokyo-night", other);
                Self::tokyo_night()
            }
        }
    }

    /// List available schemes
    pub fn list() -> Vec<&'static str> {
        vec!["tokyo-night", "nord", "dracula", "gruvbox-dark"]
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
