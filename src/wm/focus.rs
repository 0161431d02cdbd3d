//! Focus Module
//!
//! Tracks the focused client and keeps borders and stacking in step with it.

use anyhow::Result;
use tracing::debug;

use crate::wm::client::WindowId;
use crate::wm::display::Display;
use crate::wm::WindowManager;

impl<D: Display> WindowManager<D> {
    /// Focus `target`, or hand focus back to the root window with `None`.
    pub fn focus(&mut self, target: Option<WindowId>) -> Result<()> {
        match target {
            Some(window) => self.set_focus(window),
            None => self.clear_focus(),
        }
    }

    /// Paint the unfocused border color without touching focus state
    pub fn unfocus_paint(&mut self, window: WindowId) -> Result<()> {
        self.display
            .set_border_color(window, self.config.unfocus_color.pixel())
    }

    fn clear_focus(&mut self) -> Result<()> {
        debug!("Focus cleared");
        self.focused = None;
        self.display.focus_root()
    }

    fn set_focus(&mut self, window: WindowId) -> Result<()> {
        if self.focused == Some(window) || window == self.display.root() {
            return Ok(());
        }
        let Some(maximized) = self.clients.find(window).map(|c| c.maximized) else {
            debug!("Ignoring focus request for unmanaged window {}", window);
            return Ok(());
        };

        if let Some(previous) = self.focused.take() {
            self.unfocus_paint(previous)?;
        }

        self.display.set_input_focus(window)?;
        // Maximized clients are drawn without a border
        if !maximized {
            self.display
                .set_border_color(window, self.config.focus_color.pixel())?;
        }
        self.display.raise_window(window)?;
        self.focused = Some(window);

        debug!("Focused window {}", window);
        Ok(())
    }
}
