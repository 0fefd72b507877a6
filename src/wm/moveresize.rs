//! MoveResize Module
//!
//! Drag-to-move with button 1. A press on a managed client records where the
//! pointer and the frame were; motion with button 1 held moves the frame by
//! the pointer delta. Releases are not tracked, the next press simply
//! replaces the session.

use tracing::{debug, trace};
use x11rb::protocol::xproto::{ButtonPressEvent, KeyButMask, MotionNotifyEvent};

use crate::shared::Geometry;
use crate::wm::WindowManager;
use crate::wm::display::DisplayGateway;
use crate::wm::error::WmError;

/// Pointer and frame state captured at button press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    /// Pointer position (root coordinates)
    pub pointer_x: i16,
    pub pointer_y: i16,

    /// Frame geometry at the time of the press
    pub frame: Geometry,
}

/// Drag state
#[derive(Debug, Default)]
pub struct DragController {
    session: Option<DragSession>,
}

impl DragController {
    /// Start (or restart) a session.
    pub fn begin(&mut self, pointer_x: i16, pointer_y: i16, frame: Geometry) {
        self.session = Some(DragSession {
            pointer_x,
            pointer_y,
            frame,
        });
    }

    #[cfg(test)]
    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Where the frame goes for a pointer at `(pointer_x, pointer_y)`.
    /// `None` before the first press.
    pub fn target(&self, pointer_x: i16, pointer_y: i16) -> Option<Geometry> {
        self.session.map(|s| {
            let dx = i32::from(pointer_x) - i32::from(s.pointer_x);
            let dy = i32::from(pointer_y) - i32::from(s.pointer_y);
            s.frame.moved_to(s.frame.x + dx, s.frame.y + dy)
        })
    }
}

fn button1_held(state: KeyButMask) -> bool {
    u16::from(state) & u16::from(KeyButMask::BUTTON1) != 0
}

impl<G: DisplayGateway> WindowManager<G> {
    pub(crate) fn on_button_press(&mut self, e: ButtonPressEvent) -> Result<(), WmError> {
        // Clicks on the border arrive with the frame itself as event window
        let Some(frame) = self.clients.managed_frame(e.event) else {
            debug!("ButtonPress on unmanaged window {}", e.event);
            return Ok(());
        };

        let geometry = self.gateway.geometry(frame)?;
        debug!(
            "ButtonPress {} on window {} at ({}, {}), frame {} at {},{}",
            e.detail, e.event, e.root_x, e.root_y, frame, geometry.x, geometry.y
        );
        self.drag.begin(e.root_x, e.root_y, geometry);

        self.gateway.raise(frame)?;
        Ok(())
    }

    /// `e` is already the newest queued motion for its window.
    pub(crate) fn on_motion_notify(&mut self, e: MotionNotifyEvent) -> Result<(), WmError> {
        let Some(frame) = self.clients.managed_frame(e.event) else {
            trace!("MotionNotify on unmanaged window {}", e.event);
            return Ok(());
        };

        if !button1_held(e.state) {
            return Ok(());
        }

        let Some(target) = self.drag.target(e.root_x, e.root_y) else {
            trace!("MotionNotify on window {} without a drag session", e.event);
            return Ok(());
        };

        trace!("Dragging frame {} to ({}, {})", frame, target.x, target.y);
        self.gateway.move_to(frame, target.x, target.y)?;
        Ok(())
    }
}
