//! Command handling for messages received on the chisai socket

use anyhow::Result;
use chisai_ipc::Command;
use tracing::{debug, info, warn};

use crate::wm::display::Display;
use crate::wm::WindowManager;

/// What the main loop should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Continue,
    Quit,
}

impl<D: Display> WindowManager<D> {
    /// Parse and run one command line. Unknown or malformed input is logged
    /// and otherwise ignored.
    pub fn run_command(&mut self, line: &str) -> Result<CommandOutcome> {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                warn!("Ignoring command {:?}: {}", line.trim_end_matches('\0').trim(), e);
                return Ok(CommandOutcome::Continue);
            }
        };

        debug!("Received command: {}", command.name());

        match command {
            Command::Maximize => self.toggle_maximize()?,
            Command::Close => {
                if let Some(window) = self.focused {
                    self.destroy_client(window)?;
                }
            }
            Command::Quit => {
                info!("Quit requested");
                return Ok(CommandOutcome::Quit);
            }
        }

        self.display.flush()?;
        Ok(CommandOutcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wm::client::Geometry;
    use crate::wm::testing::*;

    #[test]
    fn test_maximize_toggles_once_per_command() {
        let mut wm = test_wm();
        create(&mut wm, 1, Geometry::new(10, 10, 300, 200));

        assert_eq!(wm.run_command("maximize").unwrap(), CommandOutcome::Continue);
        assert!(wm.clients().find(1).unwrap().maximized);

        wm.run_command("maximize\n").unwrap();
        let client = wm.clients().find(1).unwrap();
        assert!(!client.maximized);
        assert_eq!(client.geometry, Geometry::new(10, 10, 300, 200));
    }

    #[test]
    fn test_bogus_command_changes_nothing() {
        let mut wm = test_wm();
        create(&mut wm, 1, Geometry::new(10, 10, 300, 200));
        wm.display_mut().take_requests();

        for line in ["bogus", "", "   ", "MAXIMIZE"] {
            assert_eq!(wm.run_command(line).unwrap(), CommandOutcome::Continue);
        }

        assert!(wm.display().requests().is_empty());
        assert_eq!(wm.focused(), Some(1));
        assert!(!wm.clients().find(1).unwrap().maximized);
    }

    #[test]
    fn test_close_destroys_focused_client() {
        let mut wm = test_wm();
        create(&mut wm, 1, Geometry::new(0, 0, 300, 200));
        create(&mut wm, 2, Geometry::new(0, 0, 300, 200));

        wm.run_command("close").unwrap();

        assert!(wm.display().requests().contains(&Request::Kill(2)));
        assert!(!wm.clients().contains(2));
        assert!(wm.clients().contains(1));
        assert_eq!(wm.focused(), None);
        wm.assert_invariants();
    }

    #[test]
    fn test_close_without_focus_is_noop() {
        let mut wm = test_wm();
        wm.run_command("close").unwrap();
        assert!(!wm
            .display()
            .requests()
            .iter()
            .any(|r| matches!(r, Request::Kill(_))));
    }

    #[test]
    fn test_quit() {
        let mut wm = test_wm();
        assert_eq!(wm.run_command("quit").unwrap(), CommandOutcome::Quit);
    }
}
