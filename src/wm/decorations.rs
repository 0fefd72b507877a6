//! Window decorations: frame creation and removal
//!
//! A frame is a plain InputOutput window with a coloured border. The client
//! is reparented into it at (0, 0).

use tracing::{debug, info};
use x11rb::protocol::xproto::{ButtonIndex, EventMask, ModMask, Window};

use crate::wm::WindowManager;
use crate::wm::display::DisplayGateway;
use crate::wm::error::WmError;
use crate::wm::placement;

pub const BORDER_WIDTH: u16 = 4;
pub const BORDER_COLOR: u32 = 0xff5a5f;
pub const BACKGROUND_COLOR: u32 = 0xbfd7ea;

/// Events selected on every frame: requests and notifications from the
/// client inside it, plus clicks on the frame itself.
pub fn frame_event_mask() -> EventMask {
    EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY | EventMask::BUTTON_PRESS
}

/// Events delivered through the button 1 grab on clients
fn client_button_mask() -> EventMask {
    EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::BUTTON_MOTION
}

impl<G: DisplayGateway> WindowManager<G> {
    /// Put `window` into a new frame.
    ///
    /// `preexisting` windows (found by the startup scan) are left alone when
    /// they are override-redirect or not viewable. Returns the new frame, or
    /// `None` when the window was skipped.
    pub fn frame(&mut self, window: Window, preexisting: bool) -> Result<Option<Window>, WmError> {
        let attrs = self.gateway.attributes(window)?;
        debug!(
            "Window {} is {}x{} at {},{}",
            window, attrs.geometry.width, attrs.geometry.height, attrs.geometry.x, attrs.geometry.y
        );

        if preexisting && (attrs.override_redirect || !attrs.viewable) {
            debug!(
                "Not framing window {} (override_redirect={}, viewable={})",
                window, attrs.override_redirect, attrs.viewable
            );
            return Ok(None);
        }

        let geometry = placement::frame_geometry(self.clients.count(), &self.screen);

        let frame = self.gateway.create_window(
            self.screen.root,
            geometry,
            BORDER_WIDTH,
            BORDER_COLOR,
            BACKGROUND_COLOR,
        )?;
        self.gateway.select_input(frame, frame_event_mask())?;
        self.gateway
            .grab_button(window, ButtonIndex::M1, ModMask::ANY, client_button_mask())?;

        // Server puts the client back on the root if we die
        self.gateway.add_to_save_set(window)?;
        self.gateway.reparent(window, frame, 0, 0)?;
        self.gateway.map(frame)?;

        self.clients.add(window, frame)?;

        info!(
            "Framed window {} [{}] at {},{} {}x{}",
            window, frame, geometry.x, geometry.y, geometry.width, geometry.height
        );
        Ok(Some(frame))
    }

    /// Take `window` out of its frame and destroy the frame.
    ///
    /// The caller checks that `window` is managed; an unknown window is an
    /// [`WmError::Invariant`] violation.
    pub fn unframe(&mut self, window: Window) -> Result<(), WmError> {
        let frame = self
            .clients
            .frame_of(window)
            .ok_or_else(|| WmError::Invariant(format!("window {} is not framed", window)))?;

        self.gateway.unmap(frame)?;
        self.gateway.reparent(window, self.screen.root, 0, 0)?;
        self.gateway.remove_from_save_set(window)?;
        self.gateway.destroy(frame)?;

        if let Some(client) = self.clients.remove(window) {
            info!("Unframed window {} [{}]", client.window, client.frame);
        }
        Ok(())
    }
}
