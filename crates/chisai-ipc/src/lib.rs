//! Chisai IPC Protocol
//!
//! Shared wire protocol between `chisai` (the window manager) and `maikuro`
//! (its command-line client). One connection carries exactly one line of
//! space-separated text; the first token names the command.

use std::ffi::OsString;
use std::io::Write;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use thiserror::Error;

/// Environment variable overriding the socket location
pub const SOCKET_ENV: &str = "CHISAI_SOCKET";

/// Socket location used when no override is set
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/chisai.sock";

/// Upper bound on a single command message, in bytes
pub const MAX_MESSAGE_LEN: usize = 8192;

/// Socket path for IPC communication
pub fn socket_path() -> PathBuf {
    socket_path_from(std::env::var_os(SOCKET_ENV))
}

/// Resolve the socket path from an optional override value.
pub fn socket_path_from(override_path: Option<OsString>) -> PathBuf {
    match override_path {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_SOCKET_PATH),
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Commands understood by the window manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Toggle maximize on the focused window
    Maximize,

    /// Close the focused window
    Close,

    /// Stop the window manager
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command `{0}`")]
    Unknown(String),
}

impl Command {
    pub fn name(self) -> &'static str {
        match self {
            Command::Maximize => "maximize",
            Command::Close => "close",
            Command::Quit => "quit",
        }
    }
}

impl FromStr for Command {
    type Err = CommandError;

    /// Parse a raw message. Trailing NUL padding and surrounding whitespace
    /// are ignored; tokens after the command name are accepted and unused.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let line = raw.trim_end_matches('\0');
        let name = line.split_whitespace().next().ok_or(CommandError::Empty)?;

        match name {
            "maximize" => Ok(Command::Maximize),
            "close" => Ok(Command::Close),
            "quit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

// ============================================================================
// Client side
// ============================================================================

/// Join process arguments into a single wire message.
pub fn join_args<I, S>(args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter()
        .map(|arg| arg.as_ref().to_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Connect to the window manager and write one message. No reply is read.
pub fn send(path: &Path, message: &str) -> anyhow::Result<()> {
    let mut stream = UnixStream::connect(path)
        .with_context(|| format!("Failed to connect to {}", path.display()))?;

    let bytes = message.as_bytes();
    let bytes = &bytes[..bytes.len().min(MAX_MESSAGE_LEN)];
    stream
        .write_all(bytes)
        .context("Failed to send message to chisai")?;

    Ok(())
}
