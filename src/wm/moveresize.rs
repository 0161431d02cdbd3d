//! MoveResize Module
//!
//! Direct geometry changes, maximize/restore, and the pointer-driven
//! move/resize protocol. A drag owns the pointer grab: the grab is taken
//! when a [`DragState`] is created and released when it is dropped.

use anyhow::Result;
use tracing::{debug, warn};

use crate::wm::client::{Geometry, WindowId};
use crate::wm::display::{Button, Display};
use crate::wm::WindowManager;

/// Move/resize operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Move,
    Resize,
}

/// An in-progress pointer drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragState {
    /// Window being moved/resized
    pub window: WindowId,

    pub kind: DragKind,

    /// Move: pointer position minus half the window extent at press time.
    /// Resize: the window's top-left corner, which stays fixed.
    pub anchor_x: i32,
    pub anchor_y: i32,
}

impl<D: Display> WindowManager<D> {
    /// Reposition and resize `window` in one request, then flush.
    pub fn move_resize(&mut self, window: WindowId, geometry: Geometry) -> Result<()> {
        if window == self.display.root() || window == x11rb::NONE {
            return Ok(());
        }

        self.display.move_resize_window(window, geometry)?;
        if let Some(client) = self.clients.find_mut(window) {
            client.geometry = geometry;
        }
        self.display.flush()
    }

    /// Fill the screen with `window`, remembering where it was.
    pub fn maximize(&mut self, window: WindowId) -> Result<()> {
        let (width, height) = self.display.screen_size();
        let Some(client) = self.clients.find_mut(window) else {
            return Ok(());
        };

        client.saved_geometry = Some(client.geometry);
        client.maximized = true;

        debug!("Maximizing window {}", window);
        self.display.set_border_width(window, 0)?;
        self.move_resize(window, Geometry::new(0, 0, width, height))
    }

    /// Put a maximized `window` back where it was before maximizing.
    pub fn restore(&mut self, window: WindowId) -> Result<()> {
        let Some(client) = self.clients.find_mut(window) else {
            return Ok(());
        };
        let Some(saved) = client.saved_geometry.take() else {
            return Ok(());
        };
        client.maximized = false;

        debug!("Restoring window {} to {:?}", window, saved);
        self.display
            .set_border_width(window, self.config.border_width)?;
        // The border pixel may be stale from while it was hidden
        if self.focused == Some(window) {
            self.display
                .set_border_color(window, self.config.focus_color.pixel())?;
        } else {
            self.unfocus_paint(window)?;
        }
        self.move_resize(window, saved)
    }

    /// Maximize or restore the focused window
    pub fn toggle_maximize(&mut self) -> Result<()> {
        let Some(window) = self.focused else {
            return Ok(());
        };
        if window == self.display.root() {
            return Ok(());
        }

        match self.clients.find(window).map(|c| c.maximized) {
            Some(true) => self.restore(window),
            Some(false) => self.maximize(window),
            None => Ok(()),
        }
    }

    /// Begin a move (primary button) or resize (secondary button) of `window`
    /// with the pointer at `(root_x, root_y)`. Ignored while another drag is
    /// in progress.
    pub(crate) fn begin_drag(
        &mut self,
        window: WindowId,
        button: Button,
        root_x: i32,
        root_y: i32,
    ) -> Result<()> {
        if let Some(drag) = &self.drag {
            debug!("Ignoring press while dragging window {}", drag.window);
            return Ok(());
        }
        if !self.clients.contains(window) {
            return Ok(());
        }

        // The server's view is authoritative at the start of a drag
        let Some((geometry, _)) = self.display.get_geometry(window)? else {
            return Ok(());
        };
        if let Some(client) = self.clients.find_mut(window) {
            client.geometry = geometry;
        }

        // A drag without the grab would never see its motion or release
        if !self.display.grab_pointer()? {
            warn!("Pointer grab refused, not dragging window {}", window);
            return Ok(());
        }

        let half_w = (geometry.width / 2) as i32;
        let half_h = (geometry.height / 2) as i32;

        let drag = match button {
            Button::Primary => {
                // Recenter the window under the cursor
                self.display.warp_pointer(window, half_w, half_h)?;
                DragState {
                    window,
                    kind: DragKind::Move,
                    anchor_x: root_x - half_w,
                    anchor_y: root_y - half_h,
                }
            }
            Button::Secondary => {
                self.display.warp_pointer(
                    window,
                    geometry.width as i32,
                    geometry.height as i32,
                )?;
                DragState {
                    window,
                    kind: DragKind::Resize,
                    anchor_x: geometry.x,
                    anchor_y: geometry.y,
                }
            }
        };

        debug!("Starting {:?} of window {}", drag.kind, window);
        self.drag = Some(drag);

        self.display.raise_window(window)?;
        self.focus(Some(window))
    }

    /// Follow the pointer during a drag
    pub(crate) fn drag_motion(&mut self, root_x: i32, root_y: i32) -> Result<()> {
        let Some(drag) = self.drag else {
            return Ok(());
        };
        let Some(client) = self.clients.find(drag.window) else {
            return Ok(());
        };
        let geometry = client.geometry;
        let border = if client.maximized {
            0
        } else {
            i32::from(self.config.border_width)
        };

        match drag.kind {
            DragKind::Move => {
                let (screen_w, screen_h) = self.display.screen_size();
                let x = clamp_axis(root_x, geometry.width, screen_w, border);
                let y = clamp_axis(root_y, geometry.height, screen_h, border);

                self.display.move_window(drag.window, x, y)?;
                if let Some(client) = self.clients.find_mut(drag.window) {
                    client.geometry.x = x;
                    client.geometry.y = y;
                }
            }
            DragKind::Resize => {
                let width = (root_x - drag.anchor_x).max(1) as u32;
                let height = (root_y - drag.anchor_y).max(1) as u32;

                self.display.resize_window(drag.window, width, height)?;
                if let Some(client) = self.clients.find_mut(drag.window) {
                    client.geometry.width = width;
                    client.geometry.height = height;
                }
            }
        }
        Ok(())
    }

    /// Finish the current drag, if any, and give its window focus.
    pub(crate) fn end_drag(&mut self) -> Result<()> {
        let Some(drag) = self.drag.take() else {
            return Ok(());
        };
        self.display.ungrab_pointer()?;

        debug!("Finished {:?} of window {}", drag.kind, drag.window);
        if self.clients.contains(drag.window) {
            self.display.raise_window(drag.window)?;
            self.focus(Some(drag.window))?;
        }
        Ok(())
    }
}

/// Top-left coordinate along one axis for a window of `extent` centered on
/// `pointer`, kept on screen including both borders.
fn clamp_axis(pointer: i32, extent: u32, screen: u32, border: i32) -> i32 {
    let half = (extent / 2) as i32;
    let extent = extent as i32;
    let screen = screen as i32;

    if pointer < half {
        0
    } else if pointer + half + 2 * border > screen {
        screen - extent - 2 * border
    } else {
        pointer - half
    }
}
