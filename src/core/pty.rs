//! Pseudo-terminal spawning
//!
//! The editor never touches OS process primitives directly. It asks a
//! [`PtyBackend`] for a shell attached to a new pseudo-terminal and gets back
//! a writer, a non-blocking reader and a child handle.

use std::io::{self, Read, Write};

use portable_pty::{native_pty_system, Child, ChildKiller, CommandBuilder, MasterPty, PtySize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PtyError {
    #[error("Failed to open pseudo terminal: {0}")]
    Open(String),

    #[error("Failed to spawn {shell}: {reason}")]
    Spawn { shell: String, reason: String },

    #[error("Failed to set up PTY I/O: {0}")]
    Setup(String),

    #[error("Failed to resize pseudo terminal: {0}")]
    Resize(String),

    #[error("Failed to write to PTY: {0}")]
    Write(#[source] io::Error),

    #[error("Empty shell command")]
    EmptyCommand,
}

pub type Result<T> = std::result::Result<T, PtyError>;

/// Handle on the spawned child process
pub trait PtyChild: Send {
    /// Resize the pseudo-terminal the child is attached to. Sessions keep
    /// their spawn size for now, so nothing calls this yet.
    #[allow(dead_code)]
    fn resize(&mut self, rows: u16, cols: u16) -> Result<()>;

    fn is_alive(&mut self) -> bool;

    fn kill(&mut self);
}

/// Everything a session needs from a freshly spawned shell
pub struct PtyHandles {
    pub writer: Box<dyn Write + Send>,
    /// Returns `WouldBlock` when no output is pending
    pub reader: Box<dyn Read + Send>,
    pub child: Box<dyn PtyChild>,
}

/// Spawn contract between the session manager and the OS
pub trait PtyBackend {
    fn spawn(&self, shell: &str, rows: u16, cols: u16) -> Result<PtyHandles>;
}

/// Resolve the shell to run: command line, then config, then `$SHELL`
pub fn resolve_shell(cli: Option<&str>, config: Option<&str>) -> String {
    resolve_shell_from(cli, config, std::env::var("SHELL").ok())
}

pub fn resolve_shell_from(cli: Option<&str>, config: Option<&str>, env: Option<String>) -> String {
    let pick = |s: Option<&str>| s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

    pick(cli)
        .or_else(|| pick(config))
        .or_else(|| pick(env.as_deref()))
        .unwrap_or_else(default_shell)
}

fn default_shell() -> String {
    if cfg!(windows) {
        "cmd.exe".to_string()
    } else {
        "/bin/sh".to_string()
    }
}

/// The host system's pseudo-terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct NativePty;

impl PtyBackend for NativePty {
    fn spawn(&self, shell: &str, rows: u16, cols: u16) -> Result<PtyHandles> {
        let mut parts = shell.split_whitespace();
        let program = parts.next().ok_or(PtyError::EmptyCommand)?;

        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(pty_size(rows, cols))
            .map_err(|e| PtyError::Open(e.to_string()))?;

        let mut cmd = CommandBuilder::new(program);
        cmd.args(parts);
        cmd.env("RIX", "1");
        if let Ok(cwd) = std::env::current_dir() {
            cmd.cwd(cwd);
        }

        let child = pair.slave.spawn_command(cmd).map_err(|e| PtyError::Spawn {
            shell: shell.to_string(),
            reason: e.to_string(),
        })?;
        // The child holds its own copy of the slave end
        drop(pair.slave);

        let master = pair.master;
        let reader = master
            .try_clone_reader()
            .map_err(|e| PtyError::Setup(e.to_string()))?;
        let writer = master
            .take_writer()
            .map_err(|e| PtyError::Setup(e.to_string()))?;

        let reader = nonblocking_reader(master.as_ref(), reader)?;

        tracing::info!("Spawned {} in a {}x{} PTY", shell, cols, rows);

        Ok(PtyHandles {
            writer,
            reader,
            child: Box::new(NativeChild { master, child }),
        })
    }
}

fn pty_size(rows: u16, cols: u16) -> PtySize {
    PtySize {
        rows: rows.max(1),
        cols: cols.max(1),
        pixel_width: 0,
        pixel_height: 0,
    }
}

/// Put the master descriptor in non-blocking mode.
///
/// The cloned reader shares the open file description with the master, so
/// the flag applies to it too.
#[cfg(unix)]
fn nonblocking_reader(
    master: &dyn MasterPty,
    reader: Box<dyn Read + Send>,
) -> Result<Box<dyn Read + Send>> {
    let fd = master
        .as_raw_fd()
        .ok_or_else(|| PtyError::Setup("master has no file descriptor".to_string()))?;

    // SAFETY: fd is owned by `master`, which outlives this call
    let rc = unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL);
        if flags < 0 {
            flags
        } else {
            libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK)
        }
    };
    if rc < 0 {
        return Err(PtyError::Setup(io::Error::last_os_error().to_string()));
    }

    Ok(reader)
}

/// Without a pollable descriptor, a reader thread feeds a channel and the
/// session drains it.
#[cfg(not(unix))]
fn nonblocking_reader(
    _master: &dyn MasterPty,
    reader: Box<dyn Read + Send>,
) -> Result<Box<dyn Read + Send>> {
    Ok(Box::new(ChannelReader::spawn(reader)))
}

#[cfg(not(unix))]
struct ChannelReader {
    rx: std::sync::mpsc::Receiver<Vec<u8>>,
    pending: Vec<u8>,
}

#[cfg(not(unix))]
impl ChannelReader {
    fn spawn(mut reader: Box<dyn Read + Send>) -> Self {
        let (tx, rx) = std::sync::mpsc::channel::<Vec<u8>>();

        std::thread::spawn(move || {
            let mut buffer = vec![0u8; 4096];
            loop {
                match reader.read(&mut buffer) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if tx.send(buffer[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Self {
            rx,
            pending: Vec::new(),
        }
    }
}

#[cfg(not(unix))]
impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        use std::sync::mpsc::TryRecvError;

        if self.pending.is_empty() {
            match self.rx.try_recv() {
                Ok(data) => self.pending = data,
                Err(TryRecvError::Empty) => return Err(io::ErrorKind::WouldBlock.into()),
                Err(TryRecvError::Disconnected) => return Ok(0),
            }
        }

        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }
}

struct NativeChild {
    master: Box<dyn MasterPty + Send>,
    child: Box<dyn Child + Send + Sync>,
}

impl PtyChild for NativeChild {
    fn resize(&mut self, rows: u16, cols: u16) -> Result<()> {
        self.master
            .resize(pty_size(rows, cols))
            .map_err(|e| PtyError::Resize(e.to_string()))
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    fn kill(&mut self) {
        if self.is_alive() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_shell_precedence() {
        let env = Some("/bin/zsh".to_string());
        assert_eq!(resolve_shell_from(Some("fish"), Some("bash"), env.clone()), "fish");
        assert_eq!(resolve_shell_from(None, Some("bash"), env.clone()), "bash");
        assert_eq!(resolve_shell_from(None, None, env), "/bin/zsh");
    }

    #[test]
    fn test_resolve_shell_fallback() {
        let shell = resolve_shell_from(Some("  "), None, Some(String::new()));
        assert_eq!(shell, default_shell());
    }

    #[test]
    fn test_pty_size_never_zero() {
        let size = pty_size(0, 0);
        assert_eq!((size.rows, size.cols), (1, 1));
    }
}
