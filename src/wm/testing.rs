//! In-memory display used by the window manager tests.

use std::collections::{HashMap, VecDeque};

use anyhow::Result;

use crate::config::Config;
use crate::wm::client::{Geometry, WindowId};
use crate::wm::display::{Display, Event};
use crate::wm::WindowManager;

pub const ROOT: WindowId = 1000;
pub const SCREEN_W: u32 = 1920;
pub const SCREEN_H: u32 = 1080;
pub const FOCUS: u32 = 0x97a293;
pub const UNFOCUS: u32 = 0x393638;

pub type TestWm = WindowManager<RecordingDisplay>;

/// A request as the window manager issued it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Map(WindowId),
    Unmap(WindowId),
    Kill(WindowId),
    Subscribe(WindowId),
    BorderWidth(WindowId, u16),
    BorderColor(WindowId, u32),
    InputFocus(WindowId),
    FocusRoot,
    Raise(WindowId),
    MoveResize(WindowId, Geometry),
    Move(WindowId, i32, i32),
    Resize(WindowId, u32, u32),
    Warp(WindowId, i32, i32),
    GrabPointer,
    UngrabPointer,
    Flush,
}

/// Records every request and keeps just enough server state (geometry,
/// border colors, stacking, grab) for assertions.
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    requests: Vec<Request>,
    geometries: HashMap<WindowId, Geometry>,
    border_colors: HashMap<WindowId, u32>,
    /// Bottom to top
    stacking: Vec<WindowId>,
    top_level: Vec<WindowId>,
    events: VecDeque<Event>,
    grabbed: bool,
    grab_count: usize,
    refuse_grabs: bool,
    connection_lost: bool,
}

impl RecordingDisplay {
    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn take_requests(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.requests)
    }

    pub fn set_geometry(&mut self, window: WindowId, geometry: Geometry) {
        self.geometries.insert(window, geometry);
    }

    pub fn geometry_of(&self, window: WindowId) -> Option<Geometry> {
        self.geometries.get(&window).copied()
    }

    pub fn border_color_of(&self, window: WindowId) -> Option<u32> {
        self.border_colors.get(&window).copied()
    }

    pub fn stacking_order(&self) -> Vec<WindowId> {
        self.stacking.clone()
    }

    pub fn add_top_level(&mut self, window: WindowId, geometry: Geometry) {
        self.set_geometry(window, geometry);
        self.top_level.push(window);
    }

    pub fn queue_event(&mut self, event: Event) {
        self.events.push_back(event);
    }

    pub fn pointer_grabbed(&self) -> bool {
        self.grabbed
    }

    pub fn grab_count(&self) -> usize {
        self.grab_count
    }

    /// Answer every GrabPointer as if another client held the pointer
    pub fn refuse_grabs(&mut self, refuse: bool) {
        self.refuse_grabs = refuse;
    }

    /// Fail every later poll the way a closed connection does
    pub fn lose_connection(&mut self) {
        self.connection_lost = true;
    }

    fn to_top(&mut self, window: WindowId) {
        self.stacking.retain(|&w| w != window);
        self.stacking.push(window);
    }
}

impl Display for RecordingDisplay {
    fn root(&self) -> WindowId {
        ROOT
    }

    fn screen_size(&self) -> (u32, u32) {
        (SCREEN_W, SCREEN_H)
    }

    fn map_window(&mut self, window: WindowId) -> Result<()> {
        self.requests.push(Request::Map(window));
        if !self.stacking.contains(&window) {
            self.stacking.push(window);
        }
        Ok(())
    }

    fn unmap_window(&mut self, window: WindowId) -> Result<()> {
        self.requests.push(Request::Unmap(window));
        self.stacking.retain(|&w| w != window);
        Ok(())
    }

    fn kill_client(&mut self, window: WindowId) -> Result<()> {
        self.requests.push(Request::Kill(window));
        self.stacking.retain(|&w| w != window);
        self.geometries.remove(&window);
        Ok(())
    }

    fn subscribe(&mut self, window: WindowId) -> Result<()> {
        self.requests.push(Request::Subscribe(window));
        Ok(())
    }

    fn set_border_width(&mut self, window: WindowId, width: u16) -> Result<()> {
        self.requests.push(Request::BorderWidth(window, width));
        Ok(())
    }

    fn set_border_color(&mut self, window: WindowId, pixel: u32) -> Result<()> {
        self.requests.push(Request::BorderColor(window, pixel));
        self.border_colors.insert(window, pixel);
        Ok(())
    }

    fn set_input_focus(&mut self, window: WindowId) -> Result<()> {
        self.requests.push(Request::InputFocus(window));
        Ok(())
    }

    fn focus_root(&mut self) -> Result<()> {
        self.requests.push(Request::FocusRoot);
        Ok(())
    }

    fn raise_window(&mut self, window: WindowId) -> Result<()> {
        self.requests.push(Request::Raise(window));
        self.to_top(window);
        Ok(())
    }

    fn move_resize_window(&mut self, window: WindowId, geometry: Geometry) -> Result<()> {
        self.requests.push(Request::MoveResize(window, geometry));
        self.geometries.insert(window, geometry);
        Ok(())
    }

    fn move_window(&mut self, window: WindowId, x: i32, y: i32) -> Result<()> {
        self.requests.push(Request::Move(window, x, y));
        if let Some(g) = self.geometries.get_mut(&window) {
            g.x = x;
            g.y = y;
        }
        Ok(())
    }

    fn resize_window(&mut self, window: WindowId, width: u32, height: u32) -> Result<()> {
        self.requests.push(Request::Resize(window, width, height));
        if let Some(g) = self.geometries.get_mut(&window) {
            g.width = width;
            g.height = height;
        }
        Ok(())
    }

    fn get_geometry(&mut self, window: WindowId) -> Result<Option<(Geometry, u8)>> {
        Ok(self.geometries.get(&window).map(|&g| (g, 24)))
    }

    fn warp_pointer(&mut self, window: WindowId, x: i32, y: i32) -> Result<()> {
        self.requests.push(Request::Warp(window, x, y));
        Ok(())
    }

    fn grab_pointer(&mut self) -> Result<bool> {
        self.requests.push(Request::GrabPointer);
        if self.refuse_grabs {
            return Ok(false);
        }
        self.grabbed = true;
        self.grab_count += 1;
        Ok(true)
    }

    fn ungrab_pointer(&mut self) -> Result<()> {
        self.requests.push(Request::UngrabPointer);
        self.grabbed = false;
        Ok(())
    }

    fn top_level_windows(&mut self) -> Result<Vec<WindowId>> {
        Ok(self.top_level.clone())
    }

    fn poll_event(&mut self) -> Result<Option<Event>> {
        if self.connection_lost {
            anyhow::bail!("connection closed");
        }
        Ok(self.events.pop_front())
    }

    fn flush(&mut self) -> Result<()> {
        self.requests.push(Request::Flush);
        Ok(())
    }
}

pub fn test_wm() -> TestWm {
    WindowManager::new(RecordingDisplay::default(), Config::default())
}

pub fn test_wm_with(tweak: impl FnOnce(&mut Config)) -> TestWm {
    let mut config = Config::default();
    tweak(&mut config);
    WindowManager::new(RecordingDisplay::default(), config)
}

/// Create a top-level window on the fake server and dispatch its CreateNotify
pub fn create(wm: &mut TestWm, window: WindowId, geometry: Geometry) {
    wm.display_mut().set_geometry(window, geometry);
    wm.dispatch(Event::Create { window, override_redirect: false })
        .unwrap();
    wm.assert_invariants();
}
