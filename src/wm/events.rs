//! Events Module
//!
//! The eight display-server notifications the dispatcher reacts to, and their
//! translation from raw X11 events.

use bitflags::bitflags;
use tracing::{debug, warn};
use x11rb::protocol::Event;
use x11rb::protocol::xproto::{self, ConfigWindow, ConfigureRequestEvent};

use crate::shared::WindowId;
use crate::wm::display::{StackMode, WindowChanges};

bitflags! {
    /// Key and button modifier state, as carried by key and pointer events
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u16 {
        const SHIFT = 1 << 0;
        const LOCK = 1 << 1;
        const CONTROL = 1 << 2;
        const MOD1 = 1 << 3;
        const MOD2 = 1 << 4;
        const MOD4 = 1 << 6;
    }
}

/// Pointer event payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    /// Window the event was reported on
    pub window: WindowId,
    pub button: u8,
    /// Pointer position relative to `window`
    pub event_x: i32,
    pub event_y: i32,
    /// Pointer position relative to the root
    pub root_x: i32,
    pub root_y: i32,
    pub state: Modifiers,
}

/// A display-server event routed by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WmEvent {
    MapRequest { window: WindowId },
    ConfigureRequest { window: WindowId, changes: WindowChanges },
    DestroyNotify { window: WindowId },
    UnmapNotify { window: WindowId },
    KeyPress { keycode: u8, state: Modifiers },
    ButtonPress(PointerEvent),
    MotionNotify(PointerEvent),
    ButtonRelease(PointerEvent),
}

impl WmEvent {
    /// Translate a raw X11 event. Events the dispatcher does not route
    /// produce `None`; protocol errors are logged here.
    pub fn from_x11(event: &Event) -> Option<Self> {
        match event {
            Event::MapRequest(e) => Some(Self::MapRequest { window: e.window }),
            Event::ConfigureRequest(e) => Some(Self::ConfigureRequest {
                window: e.window,
                changes: changes_from_request(e),
            }),
            Event::DestroyNotify(e) => Some(Self::DestroyNotify { window: e.window }),
            Event::UnmapNotify(e) => Some(Self::UnmapNotify { window: e.window }),
            Event::KeyPress(e) => Some(Self::KeyPress {
                keycode: e.detail,
                state: Modifiers::from_bits_truncate(u16::from(e.state)),
            }),
            Event::ButtonPress(e) => Some(Self::ButtonPress(PointerEvent {
                window: e.event,
                button: e.detail,
                event_x: e.event_x as i32,
                event_y: e.event_y as i32,
                root_x: e.root_x as i32,
                root_y: e.root_y as i32,
                state: Modifiers::from_bits_truncate(u16::from(e.state)),
            })),
            Event::MotionNotify(e) => Some(Self::MotionNotify(PointerEvent {
                window: e.event,
                button: 0,
                event_x: e.event_x as i32,
                event_y: e.event_y as i32,
                root_x: e.root_x as i32,
                root_y: e.root_y as i32,
                state: Modifiers::from_bits_truncate(u16::from(e.state)),
            })),
            Event::ButtonRelease(e) => Some(Self::ButtonRelease(PointerEvent {
                window: e.event,
                button: e.detail,
                event_x: e.event_x as i32,
                event_y: e.event_y as i32,
                root_x: e.root_x as i32,
                root_y: e.root_y as i32,
                state: Modifiers::from_bits_truncate(u16::from(e.state)),
            })),
            Event::Error(e) => {
                warn!(
                    "X11 error {:?} for resource 0x{:x} (request {})",
                    e.error_kind, e.bad_value, e.major_opcode
                );
                None
            }
            other => {
                debug!("Ignoring event {:?}", other);
                None
            }
        }
    }

    /// Whether this event can change the set of managed windows
    pub fn changes_topology(&self) -> bool {
        matches!(
            self,
            Self::MapRequest { .. } | Self::DestroyNotify { .. } | Self::UnmapNotify { .. }
        )
    }
}

fn changes_from_request(e: &ConfigureRequestEvent) -> WindowChanges {
    let mask = u16::from(e.value_mask);
    let has = |flag: ConfigWindow| mask & u16::from(flag) != 0;
    let mut changes = WindowChanges::default();
    if has(ConfigWindow::X) {
        changes.x = Some(e.x as i32);
    }
    if has(ConfigWindow::Y) {
        changes.y = Some(e.y as i32);
    }
    if has(ConfigWindow::WIDTH) {
        changes.width = Some(e.width as u32);
    }
    if has(ConfigWindow::HEIGHT) {
        changes.height = Some(e.height as u32);
    }
    if has(ConfigWindow::BORDER_WIDTH) {
        changes.border_width = Some(e.border_width as u32);
    }
    if has(ConfigWindow::SIBLING) {
        changes.sibling = Some(e.sibling);
    }
    if has(ConfigWindow::STACK_MODE) {
        changes.stack_mode = Some(match e.stack_mode {
            xproto::StackMode::BELOW => StackMode::Below,
            xproto::StackMode::TOP_IF => StackMode::TopIf,
            xproto::StackMode::BOTTOM_IF => StackMode::BottomIf,
            xproto::StackMode::OPPOSITE => StackMode::Opposite,
            _ => StackMode::Above,
        });
    }
    changes
}
