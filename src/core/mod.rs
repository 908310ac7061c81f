//! Core terminal emulation components.
//!
//! - **pty**: spawn contract and the portable-pty backend
//! - **term**: terminal grid and ANSI escape sequence parser
//! - **session**: one shell session combining PTY I/O and terminal state
//!
//! # Architecture
//!
//! ```text
//! Session
//! ├── PtyHandles (writer, non-blocking reader, child)
//! ├── AnsiParser (CSI decoder, UTF-8 assembly)
//! └── TerminalState (cell grid + cursor)
//! ```

pub mod pty;
pub mod session;
pub mod term;
