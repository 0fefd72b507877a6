//! Client Registry
//!
//! Which client windows we manage and the frame each one lives in.

use std::collections::HashMap;

use x11rb::protocol::xproto::Window;

use crate::wm::error::WmError;

/// Window manager client state
/// Represents a window being managed by the WM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Client {
    /// Application window, owned by the application
    pub window: Window,

    /// Decoration window we created and reparented `window` into
    pub frame: Window,
}

/// Client records keyed by client window, with a reverse index by frame
///
/// Client and frame ids form a bijection over the managed windows.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashMap<Window, Client>,
    by_frame: HashMap<Window, Window>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `window` framed by `frame`.
    ///
    /// Registering a window twice, or reusing a frame, is a bug in the
    /// caller and is reported as [`WmError::Invariant`].
    pub fn add(&mut self, window: Window, frame: Window) -> Result<(), WmError> {
        if let Some(existing) = self.clients.get(&window) {
            return Err(WmError::Invariant(format!(
                "window {} is already framed by {}",
                window, existing.frame
            )));
        }
        if let Some(owner) = self.by_frame.get(&frame) {
            return Err(WmError::Invariant(format!(
                "frame {} already holds window {}",
                frame, owner
            )));
        }
        self.clients.insert(window, Client { window, frame });
        self.by_frame.insert(frame, window);
        Ok(())
    }

    /// Frame of a managed client
    pub fn frame_of(&self, window: Window) -> Option<Window> {
        self.clients.get(&window).map(|c| c.frame)
    }

    /// Client held by `frame`
    pub fn client_of(&self, frame: Window) -> Option<Window> {
        self.by_frame.get(&frame).copied()
    }

    /// The frame `window` belongs to, whether `window` is a managed client
    /// or a frame itself.
    pub fn managed_frame(&self, window: Window) -> Option<Window> {
        self.frame_of(window)
            .or_else(|| self.by_frame.contains_key(&window).then_some(window))
    }

    pub fn contains(&self, window: Window) -> bool {
        self.clients.contains_key(&window)
    }

    /// Forget `window`. No-op when it isn't managed.
    pub fn remove(&mut self, window: Window) -> Option<Client> {
        let client = self.clients.remove(&window)?;
        self.by_frame.remove(&client.frame);
        Some(client)
    }

    pub fn count(&self) -> usize {
        self.clients.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Client> {
        self.clients.values()
    }
}
