//! In-memory display for tests
//!
//! Keeps a window table, records every request, and replays a scripted
//! event queue. Once the script runs out, `next_event` reports a lost
//! connection.

use std::collections::{HashMap, HashSet, VecDeque};

use x11rb::errors::ConnectionError;
use x11rb::protocol::xproto::{
    BUTTON_PRESS_EVENT, ButtonIndex, ButtonPressEvent, CONFIGURE_REQUEST_EVENT, ConfigWindow,
    ConfigureRequestEvent, ConfigureWindowAux, EventMask, KeyButMask, MAP_NOTIFY_EVENT,
    MAP_REQUEST_EVENT, MOTION_NOTIFY_EVENT, MapNotifyEvent, MapRequestEvent, ModMask, Motion,
    MotionNotifyEvent, StackMode, UNMAP_NOTIFY_EVENT, UnmapNotifyEvent, Window,
};
use x11rb::protocol::{ErrorKind, Event};
use x11rb::x11_utils::X11Error;

use crate::shared::Geometry;
use crate::wm::display::{DisplayGateway, WindowAttributes, coalesce_motion, take_errors};
use crate::wm::error::{GatewayError, ProtocolError};
use crate::wm::screen::ScreenInfo;

pub const ROOT: Window = 1;

/// First id handed out by `create_window`
const FIRST_CREATED_ID: Window = 0x40_0000;

/// A request the window manager sent
#[derive(Debug, Clone)]
pub enum Call {
    SelectInput(Window, EventMask),
    Sync,
    CreateWindow {
        window: Window,
        parent: Window,
        geometry: Geometry,
        border_width: u16,
        border_color: u32,
        background: u32,
    },
    Reparent {
        window: Window,
        parent: Window,
        x: i16,
        y: i16,
    },
    Map(Window),
    Unmap(Window),
    Destroy(Window),
    AddToSaveSet(Window),
    RemoveFromSaveSet(Window),
    Configure(Window, ConfigureWindowAux),
    Move(Window, i32, i32),
    Raise(Window),
    GrabServer,
    UngrabServer,
    GrabButton(Window),
}

#[derive(Debug, Clone, Copy)]
pub struct FakeWindow {
    pub parent: Window,
    pub geometry: Geometry,
    pub override_redirect: bool,
    pub viewable: bool,
    pub event_mask: Option<EventMask>,
}

pub struct FakeDisplay {
    screen: ScreenInfo,
    windows: HashMap<Window, FakeWindow>,
    /// Top-level windows in stacking order, including ones the table forgot
    top_level: Vec<Window>,
    save_set: HashSet<Window>,
    calls: Vec<Call>,
    events: VecDeque<Event>,
    sync_errors: Vec<ProtocolError>,
    reported_root: Option<Window>,
    next_id: Window,
}

impl FakeDisplay {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            screen: ScreenInfo::new(0, ROOT, width, height),
            windows: HashMap::new(),
            top_level: Vec::new(),
            save_set: HashSet::new(),
            calls: Vec::new(),
            events: VecDeque::new(),
            sync_errors: Vec::new(),
            reported_root: None,
            next_id: FIRST_CREATED_ID,
        }
    }

    fn insert(&mut self, id: Window, window: FakeWindow) {
        if window.parent == ROOT && !self.top_level.contains(&id) {
            self.top_level.push(id);
        }
        self.windows.insert(id, window);
    }

    fn add(&mut self, id: Window, geometry: Geometry, override_redirect: bool, viewable: bool) {
        self.insert(
            id,
            FakeWindow {
                parent: ROOT,
                geometry,
                override_redirect,
                viewable,
                event_mask: None,
            },
        );
    }

    /// A top-level window that has not been mapped yet
    pub fn add_client(&mut self, id: Window, geometry: Geometry) {
        self.add(id, geometry, false, false);
    }

    /// A top-level window already on screen
    pub fn add_viewable(&mut self, id: Window, geometry: Geometry) {
        self.add(id, geometry, false, true);
    }

    pub fn add_override_redirect(&mut self, id: Window, geometry: Geometry) {
        self.add(id, geometry, true, true);
    }

    /// Keep listing `id` as a top-level window but fail every query on it,
    /// as if it was destroyed after the tree query.
    pub fn forget_window(&mut self, id: Window) {
        self.windows.remove(&id);
    }

    pub fn report_root(&mut self, root: Window) {
        self.reported_root = Some(root);
    }

    pub fn fail_next_sync(&mut self, error: ProtocolError) {
        self.sync_errors.push(error);
    }

    pub fn push_event(&mut self, event: Event) {
        self.events.push_back(event);
    }

    pub fn queued_events(&self) -> usize {
        self.events.len()
    }

    pub fn window(&self, id: Window) -> Option<&FakeWindow> {
        self.windows.get(&id)
    }

    pub fn selected_mask(&self, id: Window) -> Option<EventMask> {
        self.windows.get(&id).and_then(|w| w.event_mask)
    }

    pub fn in_save_set(&self, id: Window) -> bool {
        self.save_set.contains(&id)
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn created_windows(&self) -> Vec<Window> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::CreateWindow { window, .. } => Some(*window),
                _ => None,
            })
            .collect()
    }

    pub fn configured(&self) -> Vec<(Window, ConfigureWindowAux)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Configure(window, changes) => Some((*window, changes.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn moves(&self) -> Vec<(Window, i32, i32)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Move(window, x, y) => Some((*window, *x, *y)),
                _ => None,
            })
            .collect()
    }

    pub fn error_event(kind: ErrorKind, bad_value: u32) -> Event {
        Event::Error(X11Error {
            error_kind: kind,
            error_code: 0,
            sequence: 0,
            bad_value,
            minor_opcode: 0,
            major_opcode: 0,
            extension_name: None,
            request_name: None,
        })
    }

    fn missing(window: Window) -> GatewayError {
        GatewayError::Protocol(ProtocolError::new(ErrorKind::Window, window))
    }
}

impl DisplayGateway for FakeDisplay {
    fn screen(&self) -> ScreenInfo {
        self.screen
    }

    fn display_name(&self) -> &str {
        ":fake"
    }

    fn select_input(&mut self, window: Window, mask: EventMask) -> Result<(), GatewayError> {
        self.calls.push(Call::SelectInput(window, mask));
        if window == ROOT {
            self.screen_event_mask(mask);
        } else if let Some(w) = self.windows.get_mut(&window) {
            w.event_mask = Some(mask);
        }
        Ok(())
    }

    fn sync(&mut self) -> Result<Vec<ProtocolError>, GatewayError> {
        self.calls.push(Call::Sync);
        let mut errors = std::mem::take(&mut self.sync_errors);
        errors.extend(take_errors(&mut self.events));
        Ok(errors)
    }

    fn next_event(&mut self) -> Result<Event, GatewayError> {
        self.events
            .pop_front()
            .ok_or(GatewayError::Connection(ConnectionError::UnknownError))
    }

    fn latest_motion(
        &mut self,
        event: MotionNotifyEvent,
    ) -> Result<MotionNotifyEvent, GatewayError> {
        Ok(coalesce_motion(&mut self.events, event))
    }

    fn create_window(
        &mut self,
        parent: Window,
        geometry: Geometry,
        border_width: u16,
        border_color: u32,
        background: u32,
    ) -> Result<Window, GatewayError> {
        let window = self.next_id;
        self.next_id += 1;
        self.calls.push(Call::CreateWindow {
            window,
            parent,
            geometry,
            border_width,
            border_color,
            background,
        });
        self.insert(
            window,
            FakeWindow {
                parent,
                geometry,
                override_redirect: false,
                viewable: false,
                event_mask: None,
            },
        );
        Ok(window)
    }

    fn reparent(
        &mut self,
        window: Window,
        parent: Window,
        x: i16,
        y: i16,
    ) -> Result<(), GatewayError> {
        self.calls.push(Call::Reparent {
            window,
            parent,
            x,
            y,
        });
        if let Some(w) = self.windows.get_mut(&window) {
            w.parent = parent;
            w.geometry = w.geometry.moved_to(i32::from(x), i32::from(y));
        }
        Ok(())
    }

    fn map(&mut self, window: Window) -> Result<(), GatewayError> {
        self.calls.push(Call::Map(window));
        if let Some(w) = self.windows.get_mut(&window) {
            w.viewable = true;
        }
        Ok(())
    }

    fn unmap(&mut self, window: Window) -> Result<(), GatewayError> {
        self.calls.push(Call::Unmap(window));
        if let Some(w) = self.windows.get_mut(&window) {
            w.viewable = false;
        }
        Ok(())
    }

    fn destroy(&mut self, window: Window) -> Result<(), GatewayError> {
        self.calls.push(Call::Destroy(window));
        self.windows.remove(&window);
        self.top_level.retain(|&w| w != window);
        Ok(())
    }

    fn add_to_save_set(&mut self, window: Window) -> Result<(), GatewayError> {
        self.calls.push(Call::AddToSaveSet(window));
        self.save_set.insert(window);
        Ok(())
    }

    fn remove_from_save_set(&mut self, window: Window) -> Result<(), GatewayError> {
        self.calls.push(Call::RemoveFromSaveSet(window));
        self.save_set.remove(&window);
        Ok(())
    }

    fn configure(
        &mut self,
        window: Window,
        changes: &ConfigureWindowAux,
    ) -> Result<(), GatewayError> {
        self.calls.push(Call::Configure(window, changes.clone()));
        if let Some(w) = self.windows.get_mut(&window) {
            let g = &mut w.geometry;
            g.x = changes.x.unwrap_or(g.x);
            g.y = changes.y.unwrap_or(g.y);
            g.width = changes.width.unwrap_or(g.width);
            g.height = changes.height.unwrap_or(g.height);
        }
        Ok(())
    }

    fn attributes(&mut self, window: Window) -> Result<WindowAttributes, GatewayError> {
        let w = self.windows.get(&window).ok_or_else(|| Self::missing(window))?;
        Ok(WindowAttributes {
            override_redirect: w.override_redirect,
            viewable: w.viewable,
            geometry: w.geometry,
        })
    }

    fn geometry(&mut self, window: Window) -> Result<Geometry, GatewayError> {
        self.windows
            .get(&window)
            .map(|w| w.geometry)
            .ok_or_else(|| Self::missing(window))
    }

    fn move_to(&mut self, window: Window, x: i32, y: i32) -> Result<(), GatewayError> {
        self.calls.push(Call::Move(window, x, y));
        if let Some(w) = self.windows.get_mut(&window) {
            w.geometry = w.geometry.moved_to(x, y);
        }
        Ok(())
    }

    fn raise(&mut self, window: Window) -> Result<(), GatewayError> {
        self.calls.push(Call::Raise(window));
        if let Some(pos) = self.top_level.iter().position(|&w| w == window) {
            let w = self.top_level.remove(pos);
            self.top_level.push(w);
        }
        Ok(())
    }

    fn grab_server(&mut self) -> Result<(), GatewayError> {
        self.calls.push(Call::GrabServer);
        Ok(())
    }

    fn ungrab_server(&mut self) -> Result<(), GatewayError> {
        self.calls.push(Call::UngrabServer);
        Ok(())
    }

    fn top_level_windows(&mut self, root: Window) -> Result<(Window, Vec<Window>), GatewayError> {
        let children = self
            .top_level
            .iter()
            .copied()
            .filter(|id| self.windows.get(id).is_none_or(|w| w.parent == root))
            .collect();
        Ok((self.reported_root.unwrap_or(root), children))
    }

    fn grab_button(
        &mut self,
        window: Window,
        _button: ButtonIndex,
        _modifiers: ModMask,
        _mask: EventMask,
    ) -> Result<(), GatewayError> {
        self.calls.push(Call::GrabButton(window));
        Ok(())
    }
}

impl FakeDisplay {
    fn screen_event_mask(&mut self, mask: EventMask) {
        let root = self.windows.entry(ROOT).or_insert(FakeWindow {
            parent: x11rb::NONE,
            geometry: Geometry::new(0, 0, self.screen.width, self.screen.height),
            override_redirect: false,
            viewable: true,
            event_mask: None,
        });
        root.event_mask = Some(mask);
    }
}

pub fn map_request(window: Window) -> Event {
    Event::MapRequest(MapRequestEvent {
        response_type: MAP_REQUEST_EVENT,
        sequence: 0,
        parent: ROOT,
        window,
    })
}

pub fn map_notify(window: Window) -> Event {
    Event::MapNotify(MapNotifyEvent {
        response_type: MAP_NOTIFY_EVENT,
        sequence: 0,
        event: ROOT,
        window,
        override_redirect: false,
    })
}

/// Unmap of `window`, reported to the listener on `event`
pub fn unmap_notify(event: Window, window: Window) -> Event {
    Event::UnmapNotify(UnmapNotifyEvent {
        response_type: UNMAP_NOTIFY_EVENT,
        sequence: 0,
        event,
        window,
        from_configure: false,
    })
}

pub fn configure_request(
    window: Window,
    value_mask: ConfigWindow,
    x: i16,
    y: i16,
    width: u16,
    height: u16,
) -> Event {
    Event::ConfigureRequest(ConfigureRequestEvent {
        response_type: CONFIGURE_REQUEST_EVENT,
        stack_mode: StackMode::ABOVE,
        sequence: 0,
        parent: ROOT,
        window,
        sibling: x11rb::NONE,
        x,
        y,
        width,
        height,
        border_width: 0,
        value_mask,
    })
}

pub fn button_press(window: Window, root_x: i16, root_y: i16) -> Event {
    Event::ButtonPress(ButtonPressEvent {
        response_type: BUTTON_PRESS_EVENT,
        detail: 1,
        sequence: 0,
        time: 0,
        root: ROOT,
        event: window,
        child: x11rb::NONE,
        root_x,
        root_y,
        event_x: 0,
        event_y: 0,
        state: KeyButMask::from(0u16),
        same_screen: true,
    })
}

pub fn motion_notify(window: Window, root_x: i16, root_y: i16, button1: bool) -> Event {
    let state = if button1 {
        KeyButMask::BUTTON1
    } else {
        KeyButMask::from(0u16)
    };
    Event::MotionNotify(MotionNotifyEvent {
        response_type: MOTION_NOTIFY_EVENT,
        detail: Motion::NORMAL,
        sequence: 0,
        time: 0,
        root: ROOT,
        event: window,
        child: x11rb::NONE,
        root_x,
        root_y,
        event_x: 0,
        event_y: 0,
        state,
        same_screen: true,
    })
}
