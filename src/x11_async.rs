//! X11 readiness
//!
//! Lets the main loop await the X connection's file descriptor alongside
//! the command socket, without a polling thread.

use anyhow::{Context, Result};
use std::future::Future;
use std::os::unix::io::{AsRawFd, RawFd};
use tokio::io::unix::AsyncFd;
use tokio::io::Interest;

/// Borrowed descriptor of the X connection. The connection itself stays
/// owned by the display adapter, so an [`X11Readiness`] has to be dropped
/// before the window manager that owns the display.
struct ConnectionFd(RawFd);

impl AsRawFd for ConnectionFd {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

/// Something the main loop can wait on before draining display events
pub trait Readiness {
    /// Resolve once events may be waiting. Errors end the main loop.
    fn readable(&self) -> impl Future<Output = Result<()>>;
}

/// Readiness notifications for the X connection
pub struct X11Readiness {
    fd: AsyncFd<ConnectionFd>,
}

impl X11Readiness {
    pub fn new(source: &impl AsRawFd) -> Result<Self> {
        let fd = AsyncFd::with_interest(ConnectionFd(source.as_raw_fd()), Interest::READABLE)
            .context("Failed to register X11 connection with the runtime")?;
        Ok(Self { fd })
    }
}

impl Readiness for X11Readiness {
    /// Wait until the connection has bytes to read. Callers must drain all
    /// queued events afterwards; readiness is not reported again until then.
    async fn readable(&self) -> Result<()> {
        let mut guard = self
            .fd
            .readable()
            .await
            .context("Failed to poll X11 connection")?;
        guard.clear_ready();
        Ok(())
    }
}
