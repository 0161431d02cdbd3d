//! Window Manager Module
//!
//! All window manager state lives in one [`WindowManager`] value owned by
//! the main loop. Behavior is split across submodules as `impl` blocks:
//! focus and stacking, geometry and pointer drags, event dispatch, and the
//! command channel.

pub mod client;
pub mod command;
pub mod display;
pub mod events;
pub mod focus;
pub mod moveresize;

#[cfg(test)]
pub(crate) mod testing;

use anyhow::Result;
use tracing::{debug, info};

use crate::config::Config;
use crate::wm::client::{ClientRegistry, WindowId};
use crate::wm::display::Display;
use crate::wm::moveresize::DragState;

pub struct WindowManager<D: Display> {
    display: D,
    config: Config,
    clients: ClientRegistry,
    /// Never the root window; always a key of `clients` when set
    focused: Option<WindowId>,
    /// Present exactly while the pointer is grabbed
    drag: Option<DragState>,
}

impl<D: Display> WindowManager<D> {
    pub fn new(display: D, config: Config) -> Self {
        Self {
            display,
            config,
            clients: ClientRegistry::new(),
            focused: None,
            drag: None,
        }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    #[cfg(test)]
    pub(crate) fn focused(&self) -> Option<WindowId> {
        self.focused
    }

    #[cfg(test)]
    pub(crate) fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    /// Manage windows that were already on screen before we started
    pub fn adopt_existing_windows(&mut self) -> Result<()> {
        let windows = self.display.top_level_windows()?;
        info!("Adopting {} existing windows", windows.len());

        for window in windows {
            self.manage(window)?;
        }
        self.display.flush()
    }

    /// Start managing `window`: map it, subscribe to its events, give it a
    /// border and focus it. Windows that vanished before we got here are
    /// skipped.
    pub fn manage(&mut self, window: WindowId) -> Result<()> {
        if window == self.display.root() || window == x11rb::NONE {
            return Ok(());
        }

        let Some((geometry, depth)) = self.display.get_geometry(window)? else {
            debug!("Window {} vanished before it could be managed", window);
            return Ok(());
        };

        let client = self.clients.insert(window);
        client.geometry = geometry;
        client.depth = depth;
        debug!(
            "Managing window {} at {:?} (depth {}) on workspace {}",
            client.id, client.geometry, client.depth, client.workspace
        );

        self.display.map_window(window)?;
        self.display.subscribe(window)?;
        self.display.set_border_width(window, self.config.border_width)?;
        self.focus(Some(window))
    }

    /// Forget `window`, dropping focus and any drag that referenced it.
    fn unmanage(&mut self, window: WindowId) -> Result<()> {
        if self.clients.remove(window).is_none() {
            return Ok(());
        }

        debug!("Unmanaged window {}", window);

        if self.focused == Some(window) {
            self.focus(None)?;
        }
        if self.drag.as_ref().is_some_and(|drag| drag.window == window) {
            self.drag = None;
            self.display.ungrab_pointer()?;
            debug!("Cancelled drag of destroyed window {}", window);
        }
        Ok(())
    }

    /// Kill the client owning `window` and stop managing it
    pub fn destroy_client(&mut self, window: WindowId) -> Result<()> {
        if !self.clients.contains(window) {
            return Ok(());
        }
        self.display.kill_client(window)?;
        self.unmanage(window)
    }

    #[cfg(test)]
    pub(crate) fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    /// Check the focus and drag invariants. Used by tests after every step.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        if let Some(focused) = self.focused {
            assert!(self.clients.contains(focused), "focused window {focused} is not managed");
            assert_ne!(focused, self.display.root(), "root window is focused");
        }
        if let Some(drag) = &self.drag {
            assert!(self.clients.contains(drag.window), "drag target {} is not managed", drag.window);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use crate::wm::client::Geometry;
    use crate::wm::display::Event;

    #[test]
    fn test_manage_registers_and_focuses() {
        let mut wm = test_wm();
        create(&mut wm, 10, Geometry::new(50, 60, 400, 300));

        let client = wm.clients().find(10).unwrap();
        assert_eq!(client.geometry, Geometry::new(50, 60, 400, 300));
        assert_eq!(client.depth, 24);
        assert_eq!(wm.focused(), Some(10));

        let requests = wm.display().requests();
        assert!(requests.contains(&Request::Map(10)));
        assert!(requests.contains(&Request::Subscribe(10)));
        assert!(requests.contains(&Request::BorderWidth(10, 5)));
        wm.assert_invariants();
    }

    #[test]
    fn test_manage_skips_vanished_window() {
        let mut wm = test_wm();
        wm.dispatch(Event::Create { window: 99, override_redirect: false }).unwrap();

        assert!(wm.clients().is_empty());
        assert_eq!(wm.focused(), None);
        assert!(!wm.display().requests().contains(&Request::Map(99)));
    }

    #[test]
    fn test_adopt_existing_windows() {
        let mut wm = test_wm();
        wm.display_mut().add_top_level(20, Geometry::new(0, 0, 100, 100));
        wm.display_mut().add_top_level(21, Geometry::new(10, 10, 100, 100));

        wm.adopt_existing_windows().unwrap();

        assert_eq!(wm.clients().ids(), vec![21, 20]);
        assert_eq!(wm.focused(), Some(21));
        wm.assert_invariants();
    }

    #[test]
    fn test_destroy_client_of_unmanaged_window_is_ignored() {
        let mut wm = test_wm();
        wm.destroy_client(42).unwrap();
        assert!(wm.display().requests().is_empty());
    }
}
