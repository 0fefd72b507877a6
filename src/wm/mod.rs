//! Window Manager Module
//!
//! A reparenting window manager: every client gets a plain bordered frame,
//! placed by a simple tiling rule, and can be dragged around with button 1.

pub mod client;
pub mod decorations;
pub mod display;
pub mod error;
pub mod events;
pub mod moveresize;
pub mod placement;
pub mod screen;
pub mod startup;

#[cfg(test)]
pub mod testing;

use tracing::info;

use crate::wm::client::ClientRegistry;
use crate::wm::display::DisplayGateway;
use crate::wm::error::{ErrorEra, ProtocolError, WmError};
use crate::wm::moveresize::DragController;
use crate::wm::screen::ScreenInfo;

/// The window manager instance
///
/// Owns the display gateway and all window state. Everything runs on the
/// thread that calls [`run`](Self::run).
pub struct WindowManager<G: DisplayGateway> {
    gateway: G,
    screen: ScreenInfo,
    clients: ClientRegistry,
    drag: DragController,
    error_era: ErrorEra,
}

impl<G: DisplayGateway> WindowManager<G> {
    pub fn new(gateway: G) -> Self {
        let screen = gateway.screen();
        Self {
            gateway,
            screen,
            clients: ClientRegistry::new(),
            drag: DragController::default(),
            error_era: ErrorEra::SteadyState,
        }
    }

    #[cfg(test)]
    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    #[cfg(test)]
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    #[cfg(test)]
    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    /// Entry point for every protocol error the display reports, whatever
    /// path it arrived on.
    pub fn on_protocol_error(&mut self, error: &ProtocolError) {
        self.error_era.observe(error);
    }

    /// Take over the display and process events until a fatal error.
    pub fn run(&mut self) -> Result<(), WmError> {
        info!(
            "Managing screen {} ({}x{}, root {})",
            self.screen.screen_num, self.screen.width, self.screen.height, self.screen.root
        );
        self.become_window_manager()?;

        let adopted = self.adopt_existing_windows()?;
        info!("Framed {} pre-existing window(s)", adopted);

        info!("Entering event loop");
        loop {
            let event = self.gateway.next_event()?;
            self.dispatch(event)?;
        }
    }
}
