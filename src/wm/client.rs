use tracing::warn;

use crate::shared::{Geometry, WindowId};
use crate::wm::decorations::ButtonType;
use crate::wm::display::DisplayServer;

/// Title used when a window has no readable class property
pub const UNKNOWN_TITLE: &str = "Unknown";

/// A managed top-level window the user opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub window: WindowId,
    pub title: String,
    /// Geometry inside the frame
    pub geometry: Geometry,
    pub frame: WindowId,
}

/// One of the three small buttons on a frame's top edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecorationButton {
    pub window: WindowId,
    pub kind: ButtonType,
    /// Client the button acts on
    pub client: WindowId,
}

/// The decorated container around exactly one client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub window: WindowId,
    /// Geometry in root coordinates
    pub geometry: Geometry,
    pub active: bool,
    /// Close, maximize, minimize (right to left on screen)
    pub buttons: [DecorationButton; 3],
    pub client: WindowId,
}

/// A client and its frame, stored together so both sides change at once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedWindow {
    pub client: Client,
    pub frame: Frame,
}

impl ManagedWindow {
    pub fn has_title(&self) -> bool {
        self.client.title != UNKNOWN_TITLE
    }
}

/// Best-effort display title of `window` from its WM_CLASS property.
///
/// Any failure, or a missing property, yields `"Unknown"`.
pub fn resolve_title<D: DisplayServer>(display: &mut D, window: WindowId) -> String {
    match display.window_class(window) {
        Ok(Some(class)) if !class.is_empty() => class,
        Ok(_) => UNKNOWN_TITLE.to_string(),
        Err(e) => {
            warn!("Failed to get WM_CLASS for window 0x{:x}: {}", window, e);
            UNKNOWN_TITLE.to_string()
        }
    }
}
