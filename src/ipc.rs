//! Command socket
//!
//! Accepts one connection at a time, reads a single bounded message from it
//! and closes it.

use anyhow::{Context, Result};
use chisai_ipc::MAX_MESSAGE_LEN;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::{UnixListener, UnixSocket, UnixStream};
use tracing::{debug, info, warn};

/// How long a connected peer gets to deliver its message
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Listening socket for `maikuro` commands
pub struct CommandListener {
    listener: UnixListener,
    path: PathBuf,
}

impl CommandListener {
    /// Bind at `path` with a backlog of one, replacing any stale socket file.
    pub fn bind(path: &Path) -> Result<Self> {
        match std::fs::remove_file(path) {
            Ok(()) => debug!("Removed stale socket {:?}", path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to remove stale socket {:?}", path));
            }
        }

        let socket = UnixSocket::new_stream().context("Failed to create command socket")?;
        socket
            .bind(path)
            .with_context(|| format!("Failed to bind command socket {:?}", path))?;
        let listener = socket
            .listen(1)
            .context("Failed to listen on command socket")?;

        info!("Command socket listening on {:?}", path);

        Ok(Self {
            listener,
            path: path.to_path_buf(),
        })
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for the next peer. Cancel safe.
    pub async fn accept(&self) -> io::Result<UnixStream> {
        let (stream, _) = self.listener.accept().await?;
        Ok(stream)
    }
}

impl Drop for CommandListener {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("Failed to remove socket {:?}: {}", self.path, e);
        }
    }
}

/// Read one message from `stream` with a single bounded read. The stream is
/// closed when this returns.
pub async fn read_message(mut stream: UnixStream) -> Result<String> {
    let mut buf = vec![0u8; MAX_MESSAGE_LEN];
    let len = tokio::time::timeout(READ_TIMEOUT, stream.read(&mut buf))
        .await
        .context("Timed out waiting for command")?
        .context("Failed to read command")?;

    Ok(String::from_utf8_lossy(&buf[..len]).into_owned())
}
