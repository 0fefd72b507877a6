//! Screen Module
//!
//! The one screen we manage. Read once when the display is opened and never
//! refreshed.

use x11rb::protocol::xproto::{Screen, Window};

/// Screen descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenInfo {
    /// Screen number on the display
    pub screen_num: usize,

    /// Root window
    pub root: Window,

    /// Screen width in pixels
    pub width: u32,

    /// Screen height in pixels
    pub height: u32,
}

impl ScreenInfo {
    pub fn new(screen_num: usize, root: Window, width: u32, height: u32) -> Self {
        Self {
            screen_num,
            root,
            width,
            height,
        }
    }

    /// Build from the connection setup entry for `screen_num`.
    pub fn from_setup(screen_num: usize, screen: &Screen) -> Self {
        Self::new(
            screen_num,
            screen.root,
            u32::from(screen.width_in_pixels),
            u32::from(screen.height_in_pixels),
        )
    }
}
