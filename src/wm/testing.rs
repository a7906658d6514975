//! In-memory display server for unit tests.
//!
//! Keeps a window tree and records the drawing, stacking and grab requests
//! the window manager issues, so handlers can be checked without an X server.

use std::collections::HashMap;

use crate::config::Config;
use crate::error::{WmError, WmResult};
use crate::shared::{Geometry, WindowId};
use crate::wm::display::{
    parse_hex_color, CursorShape, DisplayServer, GcId, Pixel, StackMode, WindowChanges, WindowSpec,
};
use crate::wm::events::{Modifiers, PointerEvent};
use crate::wm::keyboard::tests::us_layout;
use crate::wm::keyboard::KeyboardMap;
use crate::wm::WindowManager;

pub const ROOT: WindowId = 1;

#[derive(Debug, Clone)]
pub struct MockWindow {
    pub parent: WindowId,
    pub geometry: Geometry,
    pub mapped: bool,
    pub background: Pixel,
    pub border_width: u32,
    pub cursor: Option<CursorShape>,
    pub class: Option<String>,
}

#[derive(Debug)]
pub struct MockDisplay {
    width: u32,
    height: u32,
    next_id: WindowId,
    pub windows: HashMap<WindowId, MockWindow>,
    pub focused: Option<WindowId>,
    pub pointer_grab: Option<WindowId>,
    /// Windows raised with `StackMode::Above`, oldest first
    pub raised: Vec<WindowId>,
    pub key_grabs: Vec<(u8, Modifiers)>,
    pub gcs: HashMap<GcId, Pixel>,
    pub cleared: Vec<WindowId>,
    pub filled: Vec<(WindowId, GcId, Geometry)>,
    pub drawn_text: Vec<(GcId, i32, i32, String)>,
}

impl MockDisplay {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            next_id: 0x100,
            windows: HashMap::new(),
            focused: None,
            pointer_grab: None,
            raised: Vec::new(),
            key_grabs: Vec::new(),
            gcs: HashMap::new(),
            cleared: Vec::new(),
            filled: Vec::new(),
            drawn_text: Vec::new(),
        }
    }

    fn allocate_id(&mut self) -> WindowId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// A top-level client window as an application would create it:
    /// a child of the root, not yet mapped.
    pub fn add_client(&mut self, geometry: Geometry, class: Option<&str>) -> WindowId {
        let id = self.allocate_id();
        self.windows.insert(
            id,
            MockWindow {
                parent: ROOT,
                geometry,
                mapped: false,
                background: 0,
                border_width: 0,
                cursor: None,
                class: class.map(str::to_string),
            },
        );
        id
    }

    fn window_mut(&mut self, window: WindowId) -> WmResult<&mut MockWindow> {
        self.windows.get_mut(&window).ok_or(WmError::WindowGone(window))
    }
}

impl DisplayServer for MockDisplay {
    fn root(&self) -> WindowId {
        ROOT
    }

    fn screen_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn create_window(&mut self, spec: &WindowSpec) -> WmResult<WindowId> {
        if spec.parent != ROOT && !self.windows.contains_key(&spec.parent) {
            return Err(WmError::WindowGone(spec.parent));
        }
        let id = self.allocate_id();
        self.windows.insert(
            id,
            MockWindow {
                parent: spec.parent,
                geometry: spec.geometry,
                mapped: false,
                background: spec.background,
                border_width: spec.border_width,
                cursor: None,
                class: None,
            },
        );
        Ok(id)
    }

    fn destroy_window(&mut self, window: WindowId) -> WmResult<()> {
        if self.windows.remove(&window).is_none() {
            return Err(WmError::WindowGone(window));
        }
        let children: Vec<WindowId> = self
            .windows
            .iter()
            .filter(|(_, w)| w.parent == window)
            .map(|(&id, _)| id)
            .collect();
        for child in children {
            self.destroy_window(child)?;
        }
        Ok(())
    }

    fn reparent_window(&mut self, window: WindowId, parent: WindowId, x: i32, y: i32) -> WmResult<()> {
        let w = self.window_mut(window)?;
        w.parent = parent;
        w.geometry.x = x;
        w.geometry.y = y;
        Ok(())
    }

    fn map_window(&mut self, window: WindowId) -> WmResult<()> {
        self.window_mut(window)?.mapped = true;
        Ok(())
    }

    fn unmap_window(&mut self, window: WindowId) -> WmResult<()> {
        self.window_mut(window)?.mapped = false;
        Ok(())
    }

    fn get_geometry(&mut self, window: WindowId) -> WmResult<Geometry> {
        Ok(self.window_mut(window)?.geometry)
    }

    fn configure_window(&mut self, window: WindowId, changes: &WindowChanges) -> WmResult<()> {
        let w = self.window_mut(window)?;
        w.geometry = changes.apply_to(w.geometry);
        if let Some(border_width) = changes.border_width {
            w.border_width = border_width;
        }
        if changes.stack_mode == Some(StackMode::Above) {
            self.raised.push(window);
        }
        Ok(())
    }

    fn set_background(&mut self, window: WindowId, pixel: Pixel) -> WmResult<()> {
        self.window_mut(window)?.background = pixel;
        Ok(())
    }

    fn clear_window(&mut self, window: WindowId) -> WmResult<()> {
        self.window_mut(window)?;
        self.cleared.push(window);
        Ok(())
    }

    fn set_cursor(&mut self, window: WindowId, shape: CursorShape) -> WmResult<()> {
        self.window_mut(window)?.cursor = Some(shape);
        Ok(())
    }

    fn set_input_focus(&mut self, window: WindowId) -> WmResult<()> {
        self.window_mut(window)?;
        self.focused = Some(window);
        Ok(())
    }

    fn grab_pointer(&mut self, window: WindowId) -> WmResult<()> {
        self.window_mut(window)?;
        self.pointer_grab = Some(window);
        Ok(())
    }

    fn ungrab_pointer(&mut self) -> WmResult<()> {
        self.pointer_grab = None;
        Ok(())
    }

    fn grab_key(&mut self, keycode: u8, modifiers: Modifiers) -> WmResult<()> {
        self.key_grabs.push((keycode, modifiers));
        Ok(())
    }

    fn keyboard_map(&mut self) -> WmResult<KeyboardMap> {
        Ok(us_layout())
    }

    fn alloc_color(&mut self, name: &str) -> WmResult<Pixel> {
        if let Some(pixel) = parse_hex_color(name) {
            return Ok(pixel);
        }
        match name {
            "black" => Ok(0x000000),
            "white" => Ok(0xffffff),
            "green" => Ok(0x00ff00),
            "lightblue" => Ok(0xadd8e6),
            _ => Err(WmError::UnknownColor(name.to_string())),
        }
    }

    fn create_gc(&mut self, window: WindowId, foreground: Pixel) -> WmResult<GcId> {
        self.window_mut(window)?;
        let gc = self.allocate_id();
        self.gcs.insert(gc, foreground);
        Ok(gc)
    }

    fn fill_rectangle(&mut self, window: WindowId, gc: GcId, rect: Geometry) -> WmResult<()> {
        self.filled.push((window, gc, rect));
        Ok(())
    }

    fn draw_text(&mut self, _window: WindowId, gc: GcId, x: i32, y: i32, text: &str) -> WmResult<()> {
        self.drawn_text.push((gc, x, y, text.to_string()));
        Ok(())
    }

    fn window_class(&mut self, window: WindowId) -> WmResult<Option<String>> {
        Ok(self.window_mut(window)?.class.clone())
    }

    fn viewable_top_levels(&mut self) -> WmResult<Vec<WindowId>> {
        let mut windows: Vec<WindowId> = self
            .windows
            .iter()
            .filter(|(_, w)| w.parent == ROOT && w.mapped)
            .map(|(&id, _)| id)
            .collect();
        windows.sort_unstable();
        Ok(windows)
    }

    fn flush(&mut self) -> WmResult<()> {
        Ok(())
    }
}

/// A window manager on a 1920×1080 mock screen with the default config
/// (border 10, taskbar 30).
pub fn test_wm() -> WindowManager<MockDisplay> {
    WindowManager::new(MockDisplay::new(1920, 1080), &Config::default())
        .expect("mock window manager")
}

/// A window manager managing one "XTerm" client at `geometry`.
/// Returns the manager, the client handle and its frame handle.
pub fn with_client(geometry: Geometry) -> (WindowManager<MockDisplay>, WindowId, WindowId) {
    let mut wm = test_wm();
    let client = wm.display.add_client(geometry, Some("XTerm"));
    wm.decorate(client, false).expect("decorate test client");
    let frame = wm.registry.by_client(client).expect("registered").frame.window;
    (wm, client, frame)
}

/// Left-button pointer event on `window`
pub fn pointer(window: WindowId, event_x: i32, event_y: i32, root_x: i32, root_y: i32) -> PointerEvent {
    PointerEvent {
        window,
        button: 1,
        event_x,
        event_y,
        root_x,
        root_y,
        state: Modifiers::empty(),
    }
}
