//! Chisai Window Manager
//!
//! A small floating X11 window manager. Windows are moved with Super+drag,
//! resized with Super+right-drag and controlled from the shell through
//! `maikuro`, which writes one command per connection to the chisai socket.

mod config;
mod ipc;
mod wm;
mod x11_async;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::ipc::CommandListener;
use crate::wm::command::CommandOutcome;
use crate::wm::display::{Display, X11Display};
use crate::wm::WindowManager;
use crate::x11_async::{Readiness, X11Readiness};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "chisai=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Chisai Window Manager");

    let listener = CommandListener::bind(&chisai_ipc::socket_path())?;
    let config = Config::load()?;
    let display = X11Display::connect()?;

    let mut wm = WindowManager::new(display, config);
    // Declared after `wm` so it is deregistered while the X fd is still open
    let readiness = X11Readiness::new(wm.display())?;
    info!(
        "Border {}px ({:?}), {} workspaces, sloppy focus {}",
        wm.config().border_width,
        wm.config().border_side,
        wm.config().workspaces,
        wm.config().sloppy_focus
    );
    wm.adopt_existing_windows()?;

    config::spawn_rc_script();

    run(&mut wm, &listener, &readiness).await?;

    info!("Chisai exiting with {} managed windows", wm.clients().len());
    Ok(())
}

/// Serve commands and display events until `quit` or a fatal error.
async fn run<D: Display, R: Readiness>(
    wm: &mut WindowManager<D>,
    listener: &CommandListener,
    readiness: &R,
) -> Result<()> {
    info!("Entering event loop");

    loop {
        // Events may already sit in the connection's buffer
        let handled = wm.drain_events().context("X11 connection lost")?;
        if handled > 0 {
            debug!("Handled {} events", handled);
        }

        tokio::select! {
            accepted = listener.accept() => {
                let stream = match accepted {
                    Ok(stream) => stream,
                    Err(e) => {
                        warn!("Failed to accept command connection: {}", e);
                        continue;
                    }
                };
                match ipc::read_message(stream).await {
                    Ok(message) => {
                        if wm.run_command(&message)? == CommandOutcome::Quit {
                            return Ok(());
                        }
                    }
                    Err(e) => warn!("Dropping command connection: {:#}", e),
                }
            }

            ready = readiness.readable() => {
                ready?;
            }
        }
    }
}
