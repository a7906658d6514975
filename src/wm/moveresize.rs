//! MoveResize Module
//!
//! Interactive dragging and resizing of frames with the pointer. A press near
//! the bottom or right edge resizes, anywhere else drags. The pointer is
//! grabbed by the frame until the button is released.

use tracing::{debug, warn};

use crate::error::WmResult;
use crate::shared::{Geometry, WindowId};
use crate::wm::display::{CursorShape, DisplayServer, WindowChanges};
use crate::wm::events::PointerEvent;
use crate::wm::WindowManager;

/// Distance from the bottom/right edge that selects a resize
pub const RESIZE_MARGIN: i32 = 10;

/// Smallest frame width or height reachable by resizing
pub const MIN_FRAME_SIZE: u32 = 50;

/// Which edges a resize moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAxis {
    Horizontal,
    Vertical,
    Both,
}

impl ResizeAxis {
    pub fn horizontal(self) -> bool {
        matches!(self, ResizeAxis::Horizontal | ResizeAxis::Both)
    }

    pub fn vertical(self) -> bool {
        matches!(self, ResizeAxis::Vertical | ResizeAxis::Both)
    }

    /// Resize axis for a pointer at (`x`, `y`) relative to a frame of
    /// `width × height`, or `None` if it is away from the bottom/right edges.
    pub fn at(width: u32, height: u32, x: i32, y: i32) -> Option<Self> {
        let near_right = x >= width as i32 - RESIZE_MARGIN;
        let near_bottom = y >= height as i32 - RESIZE_MARGIN;
        match (near_right, near_bottom) {
            (true, true) => Some(ResizeAxis::Both),
            (false, true) => Some(ResizeAxis::Vertical),
            (true, false) => Some(ResizeAxis::Horizontal),
            (false, false) => None,
        }
    }

    pub fn cursor(axis: Option<Self>) -> CursorShape {
        match axis {
            Some(ResizeAxis::Both) => CursorShape::Diagonal,
            Some(ResizeAxis::Horizontal) => CursorShape::Horizontal,
            Some(ResizeAxis::Vertical) => CursorShape::Vertical,
            None => CursorShape::Default,
        }
    }
}

/// The single process-wide pointer interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Idle,
    Dragging {
        target: WindowId,
        /// Pointer position minus the frame origin at press time
        offset: (i32, i32),
    },
    Resizing {
        target: WindowId,
        axis: ResizeAxis,
        start_pointer: (i32, i32),
        start_geometry: Geometry,
    },
}

impl Session {
    pub fn is_idle(&self) -> bool {
        matches!(self, Session::Idle)
    }

    /// Frame being dragged or resized
    pub fn target(&self) -> Option<WindowId> {
        match *self {
            Session::Idle => None,
            Session::Dragging { target, .. } | Session::Resizing { target, .. } => Some(target),
        }
    }
}

/// New frame size for a resize that moved the pointer by (`dx`, `dy`).
/// Dimensions not on `axis` keep their starting value; neither drops
/// below `MIN_FRAME_SIZE`.
pub fn resized(start: Geometry, axis: ResizeAxis, dx: i32, dy: i32) -> (u32, u32) {
    let grow = |size: u32, delta: i32| (size as i64 + delta as i64).max(MIN_FRAME_SIZE as i64) as u32;
    let width = if axis.horizontal() { grow(start.width, dx) } else { start.width };
    let height = if axis.vertical() { grow(start.height, dy) } else { start.height };
    (width, height)
}

impl<D: DisplayServer> WindowManager<D> {
    /// Start a drag or resize of `frame` from a button press.
    /// Ignored unless the session is idle.
    pub fn begin_interaction(&mut self, frame: WindowId, event: &PointerEvent) -> WmResult<()> {
        if !self.session.is_idle() {
            debug!("Ignoring press on 0x{:x}: interaction already running", frame);
            return Ok(());
        }
        let Some((x, y)) = self.frame_relative(event) else {
            return Ok(());
        };
        let Some(managed) = self.registry.by_frame(frame) else {
            return Ok(());
        };
        let geometry = managed.frame.geometry;

        self.session = match ResizeAxis::at(geometry.width, geometry.height, x, y) {
            Some(axis) => Session::Resizing {
                target: frame,
                axis,
                start_pointer: (event.root_x, event.root_y),
                start_geometry: geometry,
            },
            None => Session::Dragging {
                target: frame,
                offset: (event.root_x - geometry.x, event.root_y - geometry.y),
            },
        };
        debug!("Started {:?}", self.session);

        self.display.grab_pointer(frame)
    }

    /// Pointer motion: move/resize the session target, or update the
    /// resize cursor hint while idle.
    pub fn handle_motion(&mut self, event: &PointerEvent) -> WmResult<()> {
        if event.window == self.taskbar.window {
            return Ok(());
        }

        match self.session {
            Session::Idle => self.update_cursor_hint(event),
            Session::Dragging { target, offset } => {
                let (x, y) = (event.root_x - offset.0, event.root_y - offset.1);
                let Some(managed) = self.registry.resolve_mut(target) else {
                    return Ok(());
                };
                managed.frame.geometry.x = x;
                managed.frame.geometry.y = y;
                self.display.configure_window(target, &WindowChanges::position(x, y))
            }
            Session::Resizing {
                target,
                axis,
                start_pointer,
                start_geometry,
            } => {
                let (width, height) = resized(
                    start_geometry,
                    axis,
                    event.root_x - start_pointer.0,
                    event.root_y - start_pointer.1,
                );
                self.resize_frame(target, width, height)
            }
        }
    }

    /// End any interaction. Safe to call when already idle.
    pub fn end_interaction(&mut self) {
        if let Some(target) = self.session.target() {
            debug!("Finished interaction on frame 0x{:x}", target);
        }
        self.session = Session::Idle;
        if let Err(e) = self.display.ungrab_pointer() {
            warn!("Failed to ungrab pointer: {}", e);
        }
    }

    fn resize_frame(&mut self, frame: WindowId, width: u32, height: u32) -> WmResult<()> {
        let border = self.theme.border;
        let Some(managed) = self.registry.resolve_mut(frame) else {
            warn!("No client found for frame 0x{:x}", frame);
            return Ok(());
        };
        managed.frame.geometry.width = width;
        managed.frame.geometry.height = height;
        let client_size = managed.frame.geometry.inset(border);
        managed.client.geometry.width = client_size.width;
        managed.client.geometry.height = client_size.height;
        let client = managed.client.window;

        self.display.configure_window(frame, &WindowChanges::size(width, height))?;
        self.display
            .configure_window(client, &WindowChanges::size(client_size.width, client_size.height))?;
        self.reposition_buttons(frame)
    }

    fn update_cursor_hint(&mut self, event: &PointerEvent) -> WmResult<()> {
        let Some((x, y)) = self.frame_relative(event) else {
            return Ok(());
        };
        let Some(managed) = self.registry.resolve(event.window) else {
            return Ok(());
        };
        let geometry = managed.frame.geometry;
        let shape = ResizeAxis::cursor(ResizeAxis::at(geometry.width, geometry.height, x, y));
        self.display.set_cursor(event.window, shape)
    }

    /// Pointer position relative to the frame owning `event.window`, which
    /// may be the frame itself or its client.
    fn frame_relative(&self, event: &PointerEvent) -> Option<(i32, i32)> {
        let managed = self.registry.resolve(event.window)?;
        if event.window == managed.client.window {
            let inner = managed.client.geometry;
            Some((event.event_x + inner.x, event.event_y + inner.y))
        } else {
            Some((event.event_x, event.event_y))
        }
    }
}
