//! Events Module
//!
//! Maps protocol events onto registry, focus and geometry operations.

use anyhow::Result;
use tracing::{debug, trace};

use crate::wm::display::{Display, Event};
use crate::wm::WindowManager;

impl<D: Display> WindowManager<D> {
    /// Handle every event the display has queued. Returns how many were
    /// handled.
    pub fn drain_events(&mut self) -> Result<usize> {
        let mut handled = 0;
        while let Some(event) = self.display.poll_event()? {
            self.dispatch(event)?;
            handled += 1;
        }
        Ok(handled)
    }

    /// Handle one event and flush whatever requests it produced.
    pub fn dispatch(&mut self, event: Event) -> Result<()> {
        trace!("Event: {:?}", event);

        match event {
            Event::Create { window, override_redirect } => {
                if !override_redirect {
                    self.manage(window)?;
                }
            }

            // Windows that come back after an unmap are managed again
            Event::Map { window, override_redirect } => {
                if !override_redirect && !self.clients.contains(window) {
                    self.manage(window)?;
                }
            }

            Event::Destroy { window } => {
                debug!("DestroyNotify for window {}", window);
                self.destroy_client(window)?;
            }

            Event::Unmap { window } => {
                if self.clients.contains(window) {
                    debug!("UnmapNotify for window {}", window);
                    self.display.unmap_window(window)?;
                    self.unmanage(window)?;
                }
            }

            Event::Enter { window } => {
                if self.config.sloppy_focus
                    && self.focused != Some(window)
                    && self.clients.contains(window)
                {
                    self.focus(Some(window))?;
                }
            }

            // Someone else moved or resized a window: keep our copy of its
            // geometry and make sure only the focused window looks focused.
            Event::Configure { window, geometry } => {
                if let Some(client) = self.clients.find_mut(window) {
                    client.geometry = geometry;
                    if self.focused != Some(window) {
                        self.unfocus_paint(window)?;
                    }
                    if let Some(focused) = self.focused {
                        self.focus(Some(focused))?;
                    }
                }
            }

            Event::ButtonPress { button, child, root_x, root_y } => {
                if self.clients.contains(child) {
                    self.begin_drag(child, button, root_x, root_y)?;
                }
            }

            Event::Motion { root_x, root_y } => {
                self.drag_motion(root_x, root_y)?;
            }

            Event::ButtonRelease => {
                self.end_drag()?;
            }
        }

        self.display.flush()
    }
}
