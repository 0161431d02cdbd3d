//! Client Module
//!
//! Managed windows and the registry that owns them.

use std::collections::HashMap;

/// Server-assigned window identifier
pub type WindowId = u32;

/// Window geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// Window Manager client state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    /// X11 window ID
    pub id: WindowId,

    /// Last known geometry
    pub geometry: Geometry,

    /// Color depth reported by the server
    pub depth: u8,

    pub maximized: bool,

    /// Geometry to return to on restore. Only set while maximized.
    pub saved_geometry: Option<Geometry>,

    pub workspace: u32,
}

impl Client {
    pub fn new(id: WindowId) -> Self {
        Self {
            id,
            geometry: Geometry::default(),
            depth: 0,
            maximized: false,
            saved_geometry: None,
            workspace: 0,
        }
    }
}

/// Owns every managed client, keyed by window ID.
///
/// Iteration yields the most recently inserted client first, which is also
/// the default stacking order (top to bottom).
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashMap<WindowId, Client>,
    /// Insertion order, oldest first
    order: Vec<WindowId>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `id`, returning the existing entry if it is already managed.
    pub fn insert(&mut self, id: WindowId) -> &mut Client {
        if !self.clients.contains_key(&id) {
            self.order.push(id);
        }
        self.clients.entry(id).or_insert_with(|| Client::new(id))
    }

    pub fn find(&self, id: WindowId) -> Option<&Client> {
        self.clients.get(&id)
    }

    pub fn find_mut(&mut self, id: WindowId) -> Option<&mut Client> {
        self.clients.get_mut(&id)
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.clients.contains_key(&id)
    }

    /// Stop tracking `id`. Absent IDs are ignored.
    pub fn remove(&mut self, id: WindowId) -> Option<Client> {
        let client = self.clients.remove(&id)?;
        self.order.retain(|&w| w != id);
        Some(client)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Window IDs, most recently inserted first. The returned list is a
    /// snapshot, so callers may remove clients while walking it.
    #[cfg(test)]
    pub fn ids(&self) -> Vec<WindowId> {
        self.order.iter().rev().copied().collect()
    }
}
