//! Display Module
//!
//! The seam between the window manager and the X server. Engine code talks
//! to the [`Display`] trait; [`X11Display`] implements it on top of an x11rb
//! connection and translates raw protocol events into [`Event`].

use anyhow::{Context, Result};
use std::os::unix::io::{AsRawFd, RawFd};
use tracing::{debug, info, warn};
use x11rb::connection::Connection;
use x11rb::errors::ReplyError;
use x11rb::protocol::xproto::*;
use x11rb::protocol::Event as XEvent;
use x11rb::rust_connection::RustConnection;

use crate::wm::client::{Geometry, WindowId};

/// Modifier held for pointer move/resize (Super = Mod4)
pub const DRAG_MODIFIER: ModMask = ModMask::M4;

/// Pointer buttons the window manager reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Button 1, starts a move
    Primary,
    /// Button 3, starts a resize
    Secondary,
}

impl Button {
    fn from_detail(detail: u8) -> Option<Self> {
        match detail {
            1 => Some(Button::Primary),
            3 => Some(Button::Secondary),
            _ => None,
        }
    }
}

/// Protocol events the window manager handles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A top-level window was created
    Create { window: WindowId, override_redirect: bool },

    /// A top-level window was mapped
    Map { window: WindowId, override_redirect: bool },

    Destroy { window: WindowId },

    Unmap { window: WindowId },

    /// The pointer entered a managed window
    Enter { window: WindowId },

    /// A top-level window changed geometry
    Configure { window: WindowId, geometry: Geometry },

    /// A drag button was pressed over `child` (0 when over the root)
    ButtonPress {
        button: Button,
        child: WindowId,
        root_x: i32,
        root_y: i32,
    },

    Motion { root_x: i32, root_y: i32 },

    ButtonRelease,
}

/// Requests the window manager issues to the display server.
///
/// Requests are buffered until [`Display::flush`]. An `Err` from any method
/// means the connection itself is gone.
pub trait Display {
    fn root(&self) -> WindowId;

    /// Screen size in pixels
    fn screen_size(&self) -> (u32, u32);

    fn map_window(&mut self, window: WindowId) -> Result<()>;

    fn unmap_window(&mut self, window: WindowId) -> Result<()>;

    fn kill_client(&mut self, window: WindowId) -> Result<()>;

    /// Select enter and substructure notifications on `window`
    fn subscribe(&mut self, window: WindowId) -> Result<()>;

    fn set_border_width(&mut self, window: WindowId, width: u16) -> Result<()>;

    fn set_border_color(&mut self, window: WindowId, pixel: u32) -> Result<()>;

    fn set_input_focus(&mut self, window: WindowId) -> Result<()>;

    /// Hand input focus back to the root window
    fn focus_root(&mut self) -> Result<()>;

    /// Stack `window` above all siblings
    fn raise_window(&mut self, window: WindowId) -> Result<()>;

    fn move_resize_window(&mut self, window: WindowId, geometry: Geometry) -> Result<()>;

    fn move_window(&mut self, window: WindowId, x: i32, y: i32) -> Result<()>;

    fn resize_window(&mut self, window: WindowId, width: u32, height: u32) -> Result<()>;

    /// Current geometry and depth, or `None` if the window no longer exists
    fn get_geometry(&mut self, window: WindowId) -> Result<Option<(Geometry, u8)>>;

    /// Move the pointer to `(x, y)` relative to `window`
    fn warp_pointer(&mut self, window: WindowId, x: i32, y: i32) -> Result<()>;

    /// Route all pointer motion and button releases to the window manager.
    /// Returns `false` when the server refused the grab.
    fn grab_pointer(&mut self) -> Result<bool>;

    fn ungrab_pointer(&mut self) -> Result<()>;

    /// Mapped top-level windows that are not override-redirect
    fn top_level_windows(&mut self) -> Result<Vec<WindowId>>;

    /// Next queued event without blocking
    fn poll_event(&mut self) -> Result<Option<Event>>;

    fn flush(&mut self) -> Result<()>;
}

/// X11 implementation of [`Display`]
pub struct X11Display {
    conn: RustConnection,
    root: WindowId,
    screen_width: u32,
    screen_height: u32,
}

impl X11Display {
    /// Connect to the X server named by `$DISPLAY` and take over the root window
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) =
            x11rb::connect(None).context("Failed to connect to X server")?;

        info!("Connected to X server, screen {}", screen_num);

        let screen = conn
            .setup()
            .roots
            .get(screen_num)
            .context("X server reported no screen")?;
        let root = screen.root;
        let screen_width = u32::from(screen.width_in_pixels);
        let screen_height = u32::from(screen.height_in_pixels);

        info!("Screen size: {}x{}", screen_width, screen_height);

        // Grab Mod+Button1 (move) and Mod+Button3 (resize)
        for button in [ButtonIndex::M1, ButtonIndex::M3] {
            conn.grab_button(
                false,
                root,
                EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                root,
                x11rb::NONE,
                button,
                DRAG_MODIFIER,
            )?;
        }

        conn.change_window_attributes(
            root,
            &ChangeWindowAttributesAux::new().event_mask(EventMask::SUBSTRUCTURE_NOTIFY),
        )?
        .check()
        .context("Failed to select events on the root window")?;

        conn.flush()?;

        Ok(Self {
            conn,
            root,
            screen_width,
            screen_height,
        })
    }

    fn translate(&self, event: XEvent) -> Option<Event> {
        match event {
            XEvent::CreateNotify(e) if e.parent == self.root => Some(Event::Create {
                window: e.window,
                override_redirect: e.override_redirect,
            }),
            XEvent::MapNotify(e) if e.event == self.root => Some(Event::Map {
                window: e.window,
                override_redirect: e.override_redirect,
            }),
            XEvent::DestroyNotify(e) if e.event == self.root => {
                Some(Event::Destroy { window: e.window })
            }
            XEvent::UnmapNotify(e) if e.event == self.root => {
                Some(Event::Unmap { window: e.window })
            }
            // Crossings caused by our own pointer grabs are not hovers
            XEvent::EnterNotify(e) if e.mode == NotifyMode::NORMAL => {
                Some(Event::Enter { window: e.event })
            }
            XEvent::ConfigureNotify(e) if e.event == self.root => Some(Event::Configure {
                window: e.window,
                geometry: Geometry::new(
                    i32::from(e.x),
                    i32::from(e.y),
                    u32::from(e.width),
                    u32::from(e.height),
                ),
            }),
            XEvent::ButtonPress(e) => Some(Event::ButtonPress {
                button: Button::from_detail(e.detail)?,
                child: e.child,
                root_x: i32::from(e.root_x),
                root_y: i32::from(e.root_y),
            }),
            XEvent::MotionNotify(e) => Some(Event::Motion {
                root_x: i32::from(e.root_x),
                root_y: i32::from(e.root_y),
            }),
            XEvent::ButtonRelease(_) => Some(Event::ButtonRelease),
            XEvent::Error(e) => {
                warn!(
                    "X11 error {:?} (request {}, resource {})",
                    e.error_kind, e.major_opcode, e.bad_value
                );
                None
            }
            _ => None,
        }
    }
}

impl AsRawFd for X11Display {
    fn as_raw_fd(&self) -> RawFd {
        self.conn.stream().as_raw_fd()
    }
}

impl Display for X11Display {
    fn root(&self) -> WindowId {
        self.root
    }

    fn screen_size(&self) -> (u32, u32) {
        (self.screen_width, self.screen_height)
    }

    fn map_window(&mut self, window: WindowId) -> Result<()> {
        self.conn.map_window(window)?;
        Ok(())
    }

    fn unmap_window(&mut self, window: WindowId) -> Result<()> {
        self.conn.unmap_window(window)?;
        Ok(())
    }

    fn kill_client(&mut self, window: WindowId) -> Result<()> {
        self.conn.kill_client(window)?;
        Ok(())
    }

    fn subscribe(&mut self, window: WindowId) -> Result<()> {
        let mask = EventMask::ENTER_WINDOW | EventMask::SUBSTRUCTURE_NOTIFY;
        self.conn
            .change_window_attributes(window, &ChangeWindowAttributesAux::new().event_mask(mask))?;
        Ok(())
    }

    fn set_border_width(&mut self, window: WindowId, width: u16) -> Result<()> {
        self.conn.configure_window(
            window,
            &ConfigureWindowAux::new().border_width(u32::from(width)),
        )?;
        Ok(())
    }

    fn set_border_color(&mut self, window: WindowId, pixel: u32) -> Result<()> {
        self.conn
            .change_window_attributes(window, &ChangeWindowAttributesAux::new().border_pixel(pixel))?;
        Ok(())
    }

    fn set_input_focus(&mut self, window: WindowId) -> Result<()> {
        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, window, x11rb::CURRENT_TIME)?;
        Ok(())
    }

    fn focus_root(&mut self) -> Result<()> {
        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, self.root, x11rb::CURRENT_TIME)?;
        Ok(())
    }

    fn raise_window(&mut self, window: WindowId) -> Result<()> {
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))?;
        Ok(())
    }

    fn move_resize_window(&mut self, window: WindowId, geometry: Geometry) -> Result<()> {
        self.conn.configure_window(
            window,
            &ConfigureWindowAux::new()
                .x(geometry.x)
                .y(geometry.y)
                .width(geometry.width)
                .height(geometry.height),
        )?;
        Ok(())
    }

    fn move_window(&mut self, window: WindowId, x: i32, y: i32) -> Result<()> {
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().x(x).y(y))?;
        Ok(())
    }

    fn resize_window(&mut self, window: WindowId, width: u32, height: u32) -> Result<()> {
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().width(width).height(height))?;
        Ok(())
    }

    fn get_geometry(&mut self, window: WindowId) -> Result<Option<(Geometry, u8)>> {
        match self.conn.get_geometry(window)?.reply() {
            Ok(reply) => Ok(Some((
                Geometry::new(
                    i32::from(reply.x),
                    i32::from(reply.y),
                    u32::from(reply.width),
                    u32::from(reply.height),
                ),
                reply.depth,
            ))),
            Err(ReplyError::X11Error(e)) => {
                debug!("No geometry for window {}: {:?}", window, e.error_kind);
                Ok(None)
            }
            Err(ReplyError::ConnectionError(e)) => Err(e.into()),
        }
    }

    fn warp_pointer(&mut self, window: WindowId, x: i32, y: i32) -> Result<()> {
        let clamp = |v: i32| v.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
        self.conn
            .warp_pointer(x11rb::NONE, window, 0, 0, 0, 0, clamp(x), clamp(y))?;
        Ok(())
    }

    fn grab_pointer(&mut self) -> Result<bool> {
        let reply = self.conn.grab_pointer(
            false,
            self.root,
            EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
            self.root,
            x11rb::NONE,
            x11rb::CURRENT_TIME,
        )?
        .reply()?;

        if reply.status != GrabStatus::SUCCESS {
            debug!("GrabPointer answered {:?}", reply.status);
        }
        Ok(reply.status == GrabStatus::SUCCESS)
    }

    fn ungrab_pointer(&mut self) -> Result<()> {
        self.conn.ungrab_pointer(x11rb::CURRENT_TIME)?;
        Ok(())
    }

    fn top_level_windows(&mut self) -> Result<Vec<WindowId>> {
        let tree = self
            .conn
            .query_tree(self.root)?
            .reply()
            .context("Failed to query root window tree")?;

        let mut windows = Vec::new();
        for child in tree.children {
            // Windows that vanish mid-scan are skipped
            if let Ok(attrs) = self.conn.get_window_attributes(child)?.reply() {
                if attrs.map_state != MapState::UNMAPPED && !attrs.override_redirect {
                    windows.push(child);
                }
            }
        }
        Ok(windows)
    }

    fn poll_event(&mut self) -> Result<Option<Event>> {
        while let Some(event) = self
            .conn
            .poll_for_event()
            .context("Lost connection to X server")?
        {
            if let Some(event) = self.translate(event) {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }

    fn flush(&mut self) -> Result<()> {
        self.conn.flush().context("Lost connection to X server")?;
        Ok(())
    }
}
