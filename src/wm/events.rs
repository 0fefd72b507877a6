//! Events Module
//!
//! Routes each X event to its handler. Handlers run to completion before the
//! next event is read.

use tracing::{debug, trace};
use x11rb::protocol::Event;
use x11rb::protocol::xproto::{
    ConfigureRequestEvent, ConfigureWindowAux, MapRequestEvent, UnmapNotifyEvent,
};

use crate::wm::WindowManager;
use crate::wm::display::DisplayGateway;
use crate::wm::error::{ProtocolError, WmError};

impl<G: DisplayGateway> WindowManager<G> {
    /// Handle one event. Protocol errors raised while handling it are logged
    /// and swallowed; anything else is returned and is fatal.
    pub fn dispatch(&mut self, event: Event) -> Result<(), WmError> {
        match self.handle_event(event) {
            Ok(()) => Ok(()),
            Err(err) => match err.protocol() {
                Some(protocol) => {
                    self.on_protocol_error(protocol);
                    Ok(())
                }
                None => Err(err),
            },
        }
    }

    fn handle_event(&mut self, event: Event) -> Result<(), WmError> {
        match event {
            Event::MapRequest(e) => self.on_map_request(e),
            Event::ConfigureRequest(e) => self.on_configure_request(e),
            Event::UnmapNotify(e) => self.on_unmap_notify(e),
            Event::ButtonPress(e) => self.on_button_press(e),
            Event::MotionNotify(e) => {
                let latest = self.gateway.latest_motion(e)?;
                self.on_motion_notify(latest)
            }
            Event::Error(e) => {
                self.on_protocol_error(&ProtocolError::from(e));
                Ok(())
            }
            other => {
                trace!("Ignoring event: {:?}", other);
                Ok(())
            }
        }
    }

    fn on_map_request(&mut self, e: MapRequestEvent) -> Result<(), WmError> {
        debug!("MapRequest for window {}", e.window);

        if self.clients.contains(e.window) {
            debug!("Window {} is already framed, mapping only", e.window);
        } else {
            self.frame(e.window, false)?;
        }
        self.gateway.map(e.window)?;
        Ok(())
    }

    /// Clients get exactly the geometry they ask for; the frame follows.
    fn on_configure_request(&mut self, e: ConfigureRequestEvent) -> Result<(), WmError> {
        debug!(
            "ConfigureRequest for window {}: {},{} {}x{}",
            e.window, e.x, e.y, e.width, e.height
        );
        let changes = ConfigureWindowAux::from_configure_request(&e);

        if let Some(frame) = self.clients.frame_of(e.window) {
            self.gateway.configure(frame, &changes)?;
        }
        self.gateway.configure(e.window, &changes)?;
        Ok(())
    }

    fn on_unmap_notify(&mut self, e: UnmapNotifyEvent) -> Result<(), WmError> {
        if !self.clients.contains(e.window) {
            debug!("Ignoring UnmapNotify for non-client window {}", e.window);
            return Ok(());
        }

        // Reported on the root: caused by our own reparent in unframe()
        if e.event == self.screen.root {
            debug!("Ignoring UnmapNotify for window {} reported on root", e.window);
            return Ok(());
        }

        self.unframe(e.window)
    }
}
