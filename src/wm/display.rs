//! Display Module
//!
//! The capability set the window manager needs from a display server. The X11
//! implementation lives in `x11.rs`; tests use an in-memory recorder.

use crate::error::WmResult;
use crate::shared::{Geometry, WindowId};
use crate::wm::events::Modifiers;
use crate::wm::keyboard::KeyboardMap;

/// Opaque pixel value returned by color allocation
pub type Pixel = u32;

/// Opaque graphics context handle
pub type GcId = u32;

/// Pointer glyphs used for the resize hints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorShape {
    Default,
    Horizontal,
    Vertical,
    Diagonal,
}

/// What a newly created window is for. Decides its event interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRole {
    /// Container around a client: pointer presses, motion, releases and
    /// substructure events of the reparented client.
    Frame,
    /// Decoration button: exposure and presses.
    Button,
    /// The taskbar strip: exposure and presses.
    Taskbar,
}

/// Parameters for `DisplayServer::create_window`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSpec {
    pub parent: WindowId,
    pub geometry: Geometry,
    pub border_width: u32,
    pub background: Pixel,
    pub role: WindowRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackMode {
    Above,
    Below,
    TopIf,
    BottomIf,
    Opposite,
}

/// A partial configure request: only `Some` fields are sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowChanges {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub border_width: Option<u32>,
    pub sibling: Option<WindowId>,
    pub stack_mode: Option<StackMode>,
}

impl WindowChanges {
    pub fn geometry(geometry: Geometry) -> Self {
        Self {
            x: Some(geometry.x),
            y: Some(geometry.y),
            width: Some(geometry.width),
            height: Some(geometry.height),
            ..Self::default()
        }
    }

    pub fn position(x: i32, y: i32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn size(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    pub fn raise() -> Self {
        Self {
            stack_mode: Some(StackMode::Above),
            ..Self::default()
        }
    }

    /// Overlay the requested fields onto `geometry`.
    pub fn apply_to(&self, geometry: Geometry) -> Geometry {
        Geometry {
            x: self.x.unwrap_or(geometry.x),
            y: self.y.unwrap_or(geometry.y),
            width: self.width.unwrap_or(geometry.width),
            height: self.height.unwrap_or(geometry.height),
        }
    }
}

/// Operations the window manager issues against the display server.
///
/// Every call may fail with a stale-handle error when the window is already
/// gone; callers decide whether that is fatal.
pub trait DisplayServer {
    fn root(&self) -> WindowId;

    /// Screen size in pixels
    fn screen_size(&self) -> (u32, u32);

    fn create_window(&mut self, spec: &WindowSpec) -> WmResult<WindowId>;
    fn destroy_window(&mut self, window: WindowId) -> WmResult<()>;
    fn reparent_window(&mut self, window: WindowId, parent: WindowId, x: i32, y: i32) -> WmResult<()>;
    fn map_window(&mut self, window: WindowId) -> WmResult<()>;
    fn unmap_window(&mut self, window: WindowId) -> WmResult<()>;

    fn get_geometry(&mut self, window: WindowId) -> WmResult<Geometry>;
    fn configure_window(&mut self, window: WindowId, changes: &WindowChanges) -> WmResult<()>;

    /// Change the background pixel and repaint the window with it.
    fn set_background(&mut self, window: WindowId, pixel: Pixel) -> WmResult<()>;

    /// Repaint the whole window with its background.
    fn clear_window(&mut self, window: WindowId) -> WmResult<()>;

    fn set_cursor(&mut self, window: WindowId, shape: CursorShape) -> WmResult<()>;
    fn set_input_focus(&mut self, window: WindowId) -> WmResult<()>;

    /// Route motion and release events to `window` until ungrabbed.
    fn grab_pointer(&mut self, window: WindowId) -> WmResult<()>;
    fn ungrab_pointer(&mut self) -> WmResult<()>;

    /// Grab a key combination on the root window.
    fn grab_key(&mut self, keycode: u8, modifiers: Modifiers) -> WmResult<()>;
    fn keyboard_map(&mut self) -> WmResult<KeyboardMap>;

    /// Resolve a color name (`#RRGGBB` or an X11 color name).
    fn alloc_color(&mut self, name: &str) -> WmResult<Pixel>;
    fn create_gc(&mut self, window: WindowId, foreground: Pixel) -> WmResult<GcId>;
    fn fill_rectangle(&mut self, window: WindowId, gc: GcId, rect: Geometry) -> WmResult<()>;
    fn draw_text(&mut self, window: WindowId, gc: GcId, x: i32, y: i32, text: &str) -> WmResult<()>;

    /// WM_CLASS of `window`: the class part if present, otherwise the instance.
    fn window_class(&mut self, window: WindowId) -> WmResult<Option<String>>;

    /// Mapped, non-override-redirect children of the root.
    fn viewable_top_levels(&mut self) -> WmResult<Vec<WindowId>>;

    fn flush(&mut self) -> WmResult<()>;
}

/// Parse `#RRGGBB` into a 24-bit pixel value.
pub fn parse_hex_color(name: &str) -> Option<Pixel> {
    let hex = name.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}
