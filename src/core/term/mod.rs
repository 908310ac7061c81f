//! Embedded terminal emulator
//!
//! - **state**: fixed-size cell grid and cursor
//! - **parser**: CSI decoder driving the grid
//! - **sanitize**: escape stripping for plain-text consumers

mod parser;
mod sanitize;
mod state;

pub use parser::AnsiParser;
pub use sanitize::sanitize;
pub use state::{AnsiColor, AttrFlags, Cell, CellAttrs, CursorState, Row, TerminalState};
