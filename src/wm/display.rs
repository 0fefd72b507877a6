//! Display Module
//!
//! The boundary between the window manager and the X server. The core only
//! talks to [`DisplayGateway`]; [`X11Display`] is the x11rb-backed
//! implementation used by the binary.

use std::collections::VecDeque;

use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::{
    ButtonIndex, ChangeWindowAttributesAux, ConfigureWindowAux, ConnectionExt as _,
    CreateWindowAux, EventMask, GrabMode, MapState, ModMask, MotionNotifyEvent, SetMode,
    StackMode, Window, WindowClass,
};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use crate::shared::Geometry;
use crate::wm::error::{GatewayError, ProtocolError, WmError};
use crate::wm::screen::ScreenInfo;

/// What the framing engine needs to know about a window before taking it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowAttributes {
    pub override_redirect: bool,
    /// Mapped and all ancestors mapped
    pub viewable: bool,
    pub geometry: Geometry,
}

/// Requests and queries the window manager issues against the display.
///
/// Void requests may fail asynchronously; those failures come back as
/// `Event::Error` from [`next_event`](Self::next_event) or from
/// [`sync`](Self::sync).
pub trait DisplayGateway {
    fn screen(&self) -> ScreenInfo;

    /// Human readable display name, for diagnostics
    fn display_name(&self) -> &str;

    fn select_input(&mut self, window: Window, mask: EventMask) -> Result<(), GatewayError>;

    /// Round trip to the server. Returns the protocol errors delivered up to
    /// this point; other events stay queued for `next_event`.
    fn sync(&mut self) -> Result<Vec<ProtocolError>, GatewayError>;

    /// Block until the next event arrives.
    fn next_event(&mut self) -> Result<Event, GatewayError>;

    /// Swallow already-queued motion events for the same window and return
    /// the newest one (`event` itself if there are none).
    fn latest_motion(
        &mut self,
        event: MotionNotifyEvent,
    ) -> Result<MotionNotifyEvent, GatewayError>;

    fn create_window(
        &mut self,
        parent: Window,
        geometry: Geometry,
        border_width: u16,
        border_color: u32,
        background: u32,
    ) -> Result<Window, GatewayError>;

    fn reparent(&mut self, window: Window, parent: Window, x: i16, y: i16)
    -> Result<(), GatewayError>;

    fn map(&mut self, window: Window) -> Result<(), GatewayError>;

    fn unmap(&mut self, window: Window) -> Result<(), GatewayError>;

    fn destroy(&mut self, window: Window) -> Result<(), GatewayError>;

    fn add_to_save_set(&mut self, window: Window) -> Result<(), GatewayError>;

    fn remove_from_save_set(&mut self, window: Window) -> Result<(), GatewayError>;

    fn configure(
        &mut self,
        window: Window,
        changes: &ConfigureWindowAux,
    ) -> Result<(), GatewayError>;

    fn attributes(&mut self, window: Window) -> Result<WindowAttributes, GatewayError>;

    fn geometry(&mut self, window: Window) -> Result<Geometry, GatewayError>;

    fn move_to(&mut self, window: Window, x: i32, y: i32) -> Result<(), GatewayError>;

    /// Put `window` on top of its siblings.
    fn raise(&mut self, window: Window) -> Result<(), GatewayError>;

    fn grab_server(&mut self) -> Result<(), GatewayError>;

    fn ungrab_server(&mut self) -> Result<(), GatewayError>;

    /// Children of `root`, bottom to top, together with the root the server
    /// reported for the query.
    fn top_level_windows(&mut self, root: Window) -> Result<(Window, Vec<Window>), GatewayError>;

    fn grab_button(
        &mut self,
        window: Window,
        button: ButtonIndex,
        modifiers: ModMask,
        mask: EventMask,
    ) -> Result<(), GatewayError>;
}

/// X11 connection owned by the window manager thread
pub struct X11Display {
    conn: RustConnection,
    screen: ScreenInfo,
    display_name: String,
    /// Events read ahead of `next_event` (during `sync` or motion coalescing)
    pending: VecDeque<Event>,
}

impl X11Display {
    /// Connect to `display_name`, or to the default display if `None`.
    pub fn open(display_name: Option<&str>) -> Result<Self, WmError> {
        let name = display_name.unwrap_or("(default)").to_string();
        let (conn, screen_num) =
            x11rb::connect(display_name).map_err(|source| WmError::DisplayUnavailable {
                display: name.clone(),
                source,
            })?;

        let screen = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|screen| ScreenInfo::from_setup(screen_num, screen))
            .ok_or_else(|| {
                WmError::Invariant(format!("display {} has no screen {}", name, screen_num))
            })?;

        info!("Connected to X server {}, screen {}", name, screen_num);
        info!("Screen size: {}x{}", screen.width, screen.height);

        Ok(Self {
            conn,
            screen,
            display_name: name,
            pending: VecDeque::new(),
        })
    }

    /// Move everything the server already sent into `pending`.
    fn read_ahead(&mut self) -> Result<(), GatewayError> {
        while let Some(event) = self.conn.poll_for_event()? {
            self.pending.push_back(event);
        }
        Ok(())
    }
}

/// Remove every protocol error from `queue`. Other events keep their order.
pub(crate) fn take_errors(queue: &mut VecDeque<Event>) -> Vec<ProtocolError> {
    let mut errors = Vec::new();
    queue.retain(|event| match event {
        Event::Error(e) => {
            errors.push(ProtocolError::from(e.clone()));
            false
        }
        _ => true,
    });
    errors
}

/// Remove queued motion events for the window of `event` and return the
/// newest of them, or `event` when none are queued.
pub(crate) fn coalesce_motion(
    queue: &mut VecDeque<Event>,
    event: MotionNotifyEvent,
) -> MotionNotifyEvent {
    let window = event.event;
    let mut latest = event;
    queue.retain(|queued| match queued {
        Event::MotionNotify(motion) if motion.event == window => {
            latest = *motion;
            false
        }
        _ => true,
    });
    latest
}

fn to_i16(v: i32) -> i16 {
    v.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

/// The protocol rejects zero-sized windows.
fn to_extent(v: u32) -> u16 {
    v.clamp(1, u32::from(u16::MAX)) as u16
}

impl DisplayGateway for X11Display {
    fn screen(&self) -> ScreenInfo {
        self.screen
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn select_input(&mut self, window: Window, mask: EventMask) -> Result<(), GatewayError> {
        self.conn
            .change_window_attributes(window, &ChangeWindowAttributesAux::new().event_mask(mask))?;
        Ok(())
    }

    fn sync(&mut self) -> Result<Vec<ProtocolError>, GatewayError> {
        self.conn.sync()?;
        self.read_ahead()?;

        let errors = take_errors(&mut self.pending);
        debug!("Sync complete, {} protocol error(s) delivered", errors.len());
        Ok(errors)
    }

    fn next_event(&mut self) -> Result<Event, GatewayError> {
        // Requests from the previous handler go out before anything else
        self.conn.flush()?;
        if let Some(event) = self.pending.pop_front() {
            return Ok(event);
        }
        Ok(self.conn.wait_for_event()?)
    }

    fn latest_motion(
        &mut self,
        event: MotionNotifyEvent,
    ) -> Result<MotionNotifyEvent, GatewayError> {
        self.read_ahead()?;
        Ok(coalesce_motion(&mut self.pending, event))
    }

    fn create_window(
        &mut self,
        parent: Window,
        geometry: Geometry,
        border_width: u16,
        border_color: u32,
        background: u32,
    ) -> Result<Window, GatewayError> {
        let window = self.conn.generate_id()?;
        self.conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            window,
            parent,
            to_i16(geometry.x),
            to_i16(geometry.y),
            to_extent(geometry.width),
            to_extent(geometry.height),
            border_width,
            WindowClass::INPUT_OUTPUT,
            x11rb::COPY_FROM_PARENT,
            &CreateWindowAux::new()
                .border_pixel(border_color)
                .background_pixel(background),
        )?;
        Ok(window)
    }

    fn reparent(
        &mut self,
        window: Window,
        parent: Window,
        x: i16,
        y: i16,
    ) -> Result<(), GatewayError> {
        self.conn.reparent_window(window, parent, x, y)?;
        Ok(())
    }

    fn map(&mut self, window: Window) -> Result<(), GatewayError> {
        self.conn.map_window(window)?;
        Ok(())
    }

    fn unmap(&mut self, window: Window) -> Result<(), GatewayError> {
        self.conn.unmap_window(window)?;
        Ok(())
    }

    fn destroy(&mut self, window: Window) -> Result<(), GatewayError> {
        self.conn.destroy_window(window)?;
        Ok(())
    }

    fn add_to_save_set(&mut self, window: Window) -> Result<(), GatewayError> {
        self.conn.change_save_set(SetMode::INSERT, window)?;
        Ok(())
    }

    fn remove_from_save_set(&mut self, window: Window) -> Result<(), GatewayError> {
        self.conn.change_save_set(SetMode::DELETE, window)?;
        Ok(())
    }

    fn configure(
        &mut self,
        window: Window,
        changes: &ConfigureWindowAux,
    ) -> Result<(), GatewayError> {
        self.conn.configure_window(window, changes)?;
        Ok(())
    }

    fn attributes(&mut self, window: Window) -> Result<WindowAttributes, GatewayError> {
        let attrs = self.conn.get_window_attributes(window)?.reply()?;
        let geometry = self.geometry(window)?;
        Ok(WindowAttributes {
            override_redirect: attrs.override_redirect,
            viewable: attrs.map_state == MapState::VIEWABLE,
            geometry,
        })
    }

    fn geometry(&mut self, window: Window) -> Result<Geometry, GatewayError> {
        let geom = self.conn.get_geometry(window)?.reply()?;
        Ok(Geometry::new(
            i32::from(geom.x),
            i32::from(geom.y),
            u32::from(geom.width),
            u32::from(geom.height),
        ))
    }

    fn move_to(&mut self, window: Window, x: i32, y: i32) -> Result<(), GatewayError> {
        self.configure(window, &ConfigureWindowAux::new().x(x).y(y))
    }

    fn raise(&mut self, window: Window) -> Result<(), GatewayError> {
        self.configure(window, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))
    }

    fn grab_server(&mut self) -> Result<(), GatewayError> {
        self.conn.grab_server()?;
        Ok(())
    }

    fn ungrab_server(&mut self) -> Result<(), GatewayError> {
        self.conn.ungrab_server()?;
        self.conn.flush()?;
        Ok(())
    }

    fn top_level_windows(&mut self, root: Window) -> Result<(Window, Vec<Window>), GatewayError> {
        let tree = self.conn.query_tree(root)?.reply()?;
        Ok((tree.root, tree.children))
    }

    fn grab_button(
        &mut self,
        window: Window,
        button: ButtonIndex,
        modifiers: ModMask,
        mask: EventMask,
    ) -> Result<(), GatewayError> {
        self.conn.grab_button(
            true,
            window,
            mask,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
            x11rb::NONE,
            x11rb::NONE,
            button,
            modifiers,
        )?;
        Ok(())
    }
}
