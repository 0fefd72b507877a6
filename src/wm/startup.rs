//! Startup Module
//!
//! Claiming substructure redirection on the root, and framing the windows
//! that were already on screen before we started.

use tracing::{debug, error, info};
use x11rb::protocol::xproto::EventMask;

use crate::wm::WindowManager;
use crate::wm::display::DisplayGateway;
use crate::wm::error::{ErrorEra, WmError};

fn root_event_mask() -> EventMask {
    EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY | EventMask::BUTTON_PRESS
}

impl<G: DisplayGateway> WindowManager<G> {
    /// Select substructure redirection on the root. Only one client can hold
    /// it, so an `Access` error in reply means another window manager runs.
    pub fn become_window_manager(&mut self) -> Result<(), WmError> {
        self.error_era = ErrorEra::detection();

        let root = self.screen.root;
        self.gateway.select_input(root, root_event_mask())?;
        for err in self.gateway.sync()? {
            self.on_protocol_error(&err);
        }

        if self.error_era.rival_detected() {
            let name = self.gateway.display_name().to_string();
            error!("Detected another window manager on display {}", name);
            return Err(WmError::RivalWindowManager(name));
        }

        self.error_era = ErrorEra::SteadyState;
        info!("Registered as window manager on root {}", root);
        Ok(())
    }

    /// Frame every viewable top-level window while holding a server grab.
    /// Returns how many windows were framed.
    pub fn adopt_existing_windows(&mut self) -> Result<usize, WmError> {
        self.gateway.grab_server()?;
        let adopted = self.frame_top_level_windows();
        let ungrab = self.gateway.ungrab_server();

        let adopted = adopted?;
        ungrab?;
        Ok(adopted)
    }

    fn frame_top_level_windows(&mut self) -> Result<usize, WmError> {
        let root = self.screen.root;
        let (reported_root, windows) = self.gateway.top_level_windows(root)?;
        if reported_root != root {
            return Err(WmError::Invariant(format!(
                "tree query for root {} reported root {}",
                root, reported_root
            )));
        }

        debug!("Scanning {} top-level window(s)", windows.len());
        let mut adopted = 0;
        for window in windows {
            match self.frame(window, true) {
                Ok(Some(_)) => adopted += 1,
                Ok(None) => {}
                Err(err) => match err.protocol() {
                    Some(protocol) => {
                        debug!("Skipping top-level window {}", window);
                        self.on_protocol_error(protocol);
                    }
                    None => return Err(err),
                },
            }
        }

        for client in self.clients.iter() {
            debug!("Managing window {} in frame {}", client.window, client.frame);
        }
        Ok(adopted)
    }
}
