//! Session management
//!
//! Owns one shell attached to a PTY and pumps its output through the ANSI
//! parser into the terminal grid.

use std::io::{ErrorKind, Read, Write};

use super::pty::{PtyBackend, PtyChild, PtyError};
use super::term::{sanitize, AnsiParser, TerminalState};

/// Bytes requested per read
const READ_CHUNK: usize = 4096;
/// Reads per poll before yielding back to the UI
const MAX_READS_PER_POLL: usize = 16;

/// Result of a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nothing arrived
    Idle,
    /// Output was fed into the grid
    Output,
    /// The child exited or the PTY failed; the session must be dropped
    Closed,
}

/// A shell session
pub struct Session {
    /// Terminal state
    pub state: TerminalState,
    parser: AnsiParser,
    writer: Box<dyn Write + Send>,
    reader: Box<dyn Read + Send>,
    child: Box<dyn PtyChild>,
    buffer: Vec<u8>,
    /// Input the PTY has not accepted yet
    outbox: Vec<u8>,
}

impl Session {
    /// Spawn `shell` in a PTY of the given size
    pub fn open<B: PtyBackend + ?Sized>(
        backend: &B,
        shell: &str,
        rows: u16,
        cols: u16,
    ) -> Result<Self, PtyError> {
        let handles = backend.spawn(shell, rows, cols)?;

        Ok(Self {
            state: TerminalState::new(cols, rows),
            parser: AnsiParser::new(),
            writer: handles.writer,
            reader: handles.reader,
            child: handles.child,
            buffer: vec![0u8; READ_CHUNK],
            outbox: Vec::new(),
        })
    }

    /// Drain pending output without blocking
    pub fn poll(&mut self) -> PollOutcome {
        if let Err(e) = self.flush_outbox() {
            tracing::info!("{}", e);
            return PollOutcome::Closed;
        }

        let mut got_output = false;
        let mut drained = false;

        for _ in 0..MAX_READS_PER_POLL {
            match self.reader.read(&mut self.buffer) {
                Ok(0) => {
                    tracing::info!("PTY reached EOF");
                    return PollOutcome::Closed;
                }
                Ok(n) => {
                    let chunk = self.buffer[..n].to_vec();
                    self.feed_bytes(&chunk);
                    got_output = true;
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    drained = true;
                    break;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::info!("PTY read failed: {}", e);
                    return PollOutcome::Closed;
                }
            }
        }

        if drained && !self.child.is_alive() {
            tracing::info!("Shell exited");
            return PollOutcome::Closed;
        }

        if got_output {
            PollOutcome::Output
        } else {
            PollOutcome::Idle
        }
    }

    /// Write input to the PTY. Bytes the PTY cannot take yet are queued and
    /// retried on the next write or poll.
    pub fn write(&mut self, data: &[u8]) -> Result<(), PtyError> {
        self.outbox.extend_from_slice(data);
        self.flush_outbox()
    }

    /// Bytes still waiting for the PTY
    pub fn queued(&self) -> usize {
        self.outbox.len()
    }

    fn flush_outbox(&mut self) -> Result<(), PtyError> {
        if self.outbox.is_empty() {
            return Ok(());
        }

        while !self.outbox.is_empty() {
            match self.writer.write(&self.outbox) {
                Ok(0) => return Err(PtyError::Write(ErrorKind::WriteZero.into())),
                Ok(n) => {
                    self.outbox.drain(..n);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    tracing::debug!("PTY input full, {} bytes queued", self.outbox.len());
                    return Ok(());
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(PtyError::Write(e)),
            }
        }

        match self.writer.flush() {
            Err(e) if e.kind() != ErrorKind::WouldBlock => Err(PtyError::Write(e)),
            _ => Ok(()),
        }
    }

    /// Feed raw bytes into the terminal
    pub fn feed_bytes(&mut self, bytes: &[u8]) {
        if tracing::enabled!(tracing::Level::TRACE) {
            tracing::trace!("pty: {:?}", sanitize(bytes));
        }
        self.parser.feed(bytes, &mut self.state);
    }

    /// Check if the shell is still running
    pub fn is_alive(&mut self) -> bool {
        self.child.is_alive()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.child.kill();
    }
}
