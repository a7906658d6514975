//! X11 display backend
//!
//! `DisplayServer` over an x11rb `RustConnection`. Requests are sent without
//! waiting for a reply unless one is needed; their errors come back through
//! the event stream and are logged there.

use std::sync::Arc;
use tracing::{debug, info, warn};
use x11rb::connection::Connection;
use x11rb::errors::ReplyError;
use x11rb::protocol::xproto::{
    self, AtomEnum, ChangeWindowAttributesAux, ConfigureWindowAux, ConnectionExt as _, CreateGCAux,
    CreateWindowAux, EventMask, Font, GrabMode, GrabStatus, InputFocus, MapState, ModMask, Rectangle,
    WindowClass,
};
use x11rb::protocol::ErrorKind;
use x11rb::rust_connection::RustConnection;

use crate::error::{WmError, WmResult};
use crate::shared::{Geometry, WindowId};
use crate::wm::display::{
    parse_hex_color, CursorShape, DisplayServer, GcId, Pixel, StackMode, WindowChanges, WindowRole,
    WindowSpec,
};
use crate::wm::events::Modifiers;
use crate::wm::keyboard::KeyboardMap;

/// Glyphs in the standard `cursor` font; each mask is the next glyph
const GLYPH_LEFT_PTR: u16 = 68;
const GLYPH_SB_H_DOUBLE_ARROW: u16 = 108;
const GLYPH_SB_V_DOUBLE_ARROW: u16 = 116;
const GLYPH_BOTTOM_RIGHT_CORNER: u16 = 14;

/// Longest string a single poly_text8 item can carry
const MAX_TEXT_ITEM: usize = 254;

#[derive(Debug, Clone, Copy)]
struct Cursors {
    default: u32,
    horizontal: u32,
    vertical: u32,
    diagonal: u32,
}

impl Cursors {
    fn load(conn: &RustConnection) -> WmResult<Self> {
        let font = conn.generate_id()?;
        conn.open_font(font, b"cursor")?;

        let create_cursor = |glyph: u16| -> WmResult<u32> {
            let cursor = conn.generate_id()?;
            conn.create_glyph_cursor(
                cursor,
                font,
                font,
                glyph,
                glyph + 1,
                0xffff, 0xffff, 0xffff, // foreground: white
                0, 0, 0,                // background: black
            )?;
            Ok(cursor)
        };

        let cursors = Self {
            default: create_cursor(GLYPH_LEFT_PTR)?,
            horizontal: create_cursor(GLYPH_SB_H_DOUBLE_ARROW)?,
            vertical: create_cursor(GLYPH_SB_V_DOUBLE_ARROW)?,
            diagonal: create_cursor(GLYPH_BOTTOM_RIGHT_CORNER)?,
        };
        conn.close_font(font)?;
        Ok(cursors)
    }

    fn get(&self, shape: CursorShape) -> u32 {
        match shape {
            CursorShape::Default => self.default,
            CursorShape::Horizontal => self.horizontal,
            CursorShape::Vertical => self.vertical,
            CursorShape::Diagonal => self.diagonal,
        }
    }
}

pub struct X11Display {
    conn: Arc<RustConnection>,
    root: WindowId,
    width: u32,
    height: u32,
    colormap: xproto::Colormap,
    border_pixel: Pixel,
    text_font: Font,
    cursors: Cursors,
}

impl X11Display {
    /// Connect to `$DISPLAY` and become its window manager.
    ///
    /// Fails with `AccessDenied` if another client already redirects the
    /// root's substructure.
    pub fn connect() -> WmResult<Self> {
        let (conn, screen_num) = x11rb::connect(None)?;
        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;
        let width = screen.width_in_pixels as u32;
        let height = screen.height_in_pixels as u32;
        let colormap = screen.default_colormap;
        let border_pixel = screen.black_pixel;
        info!("Connected to X server, screen {} ({}x{})", screen_num, width, height);

        debug!("Selecting SubstructureRedirect on root 0x{:x}", root);
        conn.change_window_attributes(
            root,
            &ChangeWindowAttributesAux::new()
                .event_mask(EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY),
        )?
        .check()
        .map_err(|e| match e {
            ReplyError::X11Error(ref x) if x.error_kind == ErrorKind::Access => WmError::AccessDenied,
            other => WmError::Reply(other),
        })?;

        let cursors = Cursors::load(&conn)?;
        conn.change_window_attributes(root, &ChangeWindowAttributesAux::new().cursor(cursors.default))?;

        let text_font = conn.generate_id()?;
        conn.open_font(text_font, b"fixed")?;
        conn.flush()?;

        Ok(Self {
            conn: Arc::new(conn),
            root,
            width,
            height,
            colormap,
            border_pixel,
            text_font,
            cursors,
        })
    }

    /// Shared handle for the event stream
    pub fn connection(&self) -> Arc<RustConnection> {
        self.conn.clone()
    }

    fn event_mask(role: WindowRole) -> EventMask {
        match role {
            WindowRole::Frame => {
                EventMask::BUTTON_PRESS
                    | EventMask::BUTTON_RELEASE
                    | EventMask::POINTER_MOTION
                    | EventMask::SUBSTRUCTURE_REDIRECT
                    | EventMask::SUBSTRUCTURE_NOTIFY
            }
            WindowRole::Button | WindowRole::Taskbar => EventMask::EXPOSURE | EventMask::BUTTON_PRESS,
        }
    }
}

fn to_x11_stack_mode(mode: StackMode) -> xproto::StackMode {
    match mode {
        StackMode::Above => xproto::StackMode::ABOVE,
        StackMode::Below => xproto::StackMode::BELOW,
        StackMode::TopIf => xproto::StackMode::TOP_IF,
        StackMode::BottomIf => xproto::StackMode::BOTTOM_IF,
        StackMode::Opposite => xproto::StackMode::OPPOSITE,
    }
}

/// Split a WM_CLASS value (`instance\0class\0`) and prefer the class.
fn parse_wm_class(value: &[u8]) -> Option<String> {
    let mut parts = value
        .split(|&b| b == 0)
        .map(|part| String::from_utf8_lossy(part).into_owned());
    let instance = parts.next().filter(|s| !s.is_empty());
    let class = parts.next().filter(|s| !s.is_empty());
    class.or(instance)
}

impl DisplayServer for X11Display {
    fn root(&self) -> WindowId {
        self.root
    }

    fn screen_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn create_window(&mut self, spec: &WindowSpec) -> WmResult<WindowId> {
        let window = self.conn.generate_id()?;
        self.conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            window,
            spec.parent,
            spec.geometry.x as i16,
            spec.geometry.y as i16,
            spec.geometry.width.max(1) as u16,
            spec.geometry.height.max(1) as u16,
            spec.border_width as u16,
            WindowClass::INPUT_OUTPUT,
            x11rb::COPY_FROM_PARENT,
            &CreateWindowAux::new()
                .background_pixel(spec.background)
                .border_pixel(self.border_pixel)
                .event_mask(Self::event_mask(spec.role)),
        )?;
        debug!("Created {:?} window 0x{:x} at {:?}", spec.role, window, spec.geometry);
        Ok(window)
    }

    fn destroy_window(&mut self, window: WindowId) -> WmResult<()> {
        self.conn.destroy_window(window)?;
        Ok(())
    }

    fn reparent_window(&mut self, window: WindowId, parent: WindowId, x: i32, y: i32) -> WmResult<()> {
        self.conn.reparent_window(window, parent, x as i16, y as i16)?;
        Ok(())
    }

    fn map_window(&mut self, window: WindowId) -> WmResult<()> {
        self.conn.map_window(window)?;
        Ok(())
    }

    fn unmap_window(&mut self, window: WindowId) -> WmResult<()> {
        self.conn.unmap_window(window)?;
        Ok(())
    }

    fn get_geometry(&mut self, window: WindowId) -> WmResult<Geometry> {
        let reply = self
            .conn
            .get_geometry(window)?
            .reply()
            .map_err(|e| WmError::for_window(window, e))?;
        Ok(Geometry::new(
            reply.x as i32,
            reply.y as i32,
            reply.width as u32,
            reply.height as u32,
        ))
    }

    fn configure_window(&mut self, window: WindowId, changes: &WindowChanges) -> WmResult<()> {
        let aux = ConfigureWindowAux {
            x: changes.x,
            y: changes.y,
            width: changes.width,
            height: changes.height,
            border_width: changes.border_width,
            sibling: changes.sibling,
            stack_mode: changes.stack_mode.map(to_x11_stack_mode),
        };
        self.conn.configure_window(window, &aux)?;
        Ok(())
    }

    fn set_background(&mut self, window: WindowId, pixel: Pixel) -> WmResult<()> {
        self.conn
            .change_window_attributes(window, &ChangeWindowAttributesAux::new().background_pixel(pixel))?;
        self.clear_window(window)
    }

    fn clear_window(&mut self, window: WindowId) -> WmResult<()> {
        self.conn.clear_area(false, window, 0, 0, 0, 0)?;
        Ok(())
    }

    fn set_cursor(&mut self, window: WindowId, shape: CursorShape) -> WmResult<()> {
        self.conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().cursor(self.cursors.get(shape)),
        )?;
        Ok(())
    }

    fn set_input_focus(&mut self, window: WindowId) -> WmResult<()> {
        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, window, x11rb::CURRENT_TIME)?;
        Ok(())
    }

    fn grab_pointer(&mut self, window: WindowId) -> WmResult<()> {
        let reply = self
            .conn
            .grab_pointer(
                false,
                window,
                EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                x11rb::NONE,
                x11rb::NONE,
                x11rb::CURRENT_TIME,
            )?
            .reply()
            .map_err(|e| WmError::for_window(window, e))?;
        if reply.status != GrabStatus::SUCCESS {
            warn!("Pointer grab on 0x{:x} failed: {:?}", window, reply.status);
        }
        Ok(())
    }

    fn ungrab_pointer(&mut self) -> WmResult<()> {
        self.conn.ungrab_pointer(x11rb::CURRENT_TIME)?;
        Ok(())
    }

    fn grab_key(&mut self, keycode: u8, modifiers: Modifiers) -> WmResult<()> {
        self.conn.grab_key(
            false,
            self.root,
            ModMask::from(modifiers.bits()),
            keycode,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
        )?;
        Ok(())
    }

    fn keyboard_map(&mut self) -> WmResult<KeyboardMap> {
        let setup = self.conn.setup();
        let (min, max) = (setup.min_keycode, setup.max_keycode);
        let reply = self
            .conn
            .get_keyboard_mapping(min, max - min + 1)?
            .reply()?;
        debug!(
            "Keyboard mapping: keycodes {}..={}, {} keysyms per keycode",
            min, max, reply.keysyms_per_keycode
        );
        Ok(KeyboardMap::new(min, reply.keysyms_per_keycode, reply.keysyms))
    }

    fn alloc_color(&mut self, name: &str) -> WmResult<Pixel> {
        if let Some(rgb) = parse_hex_color(name) {
            let channel = |shift: u32| ((rgb >> shift) & 0xff) as u16 * 0x101;
            let reply = self
                .conn
                .alloc_color(self.colormap, channel(16), channel(8), channel(0))?
                .reply()?;
            return Ok(reply.pixel);
        }

        let reply = self
            .conn
            .alloc_named_color(self.colormap, name.as_bytes())?
            .reply()
            .map_err(|e| match e {
                ReplyError::X11Error(ref x) if x.error_kind == ErrorKind::Name => {
                    WmError::UnknownColor(name.to_string())
                }
                other => WmError::Reply(other),
            })?;
        Ok(reply.pixel)
    }

    fn create_gc(&mut self, window: WindowId, foreground: Pixel) -> WmResult<GcId> {
        let gc = self.conn.generate_id()?;
        self.conn.create_gc(
            gc,
            window,
            &CreateGCAux::new().foreground(foreground).font(self.text_font),
        )?;
        Ok(gc)
    }

    fn fill_rectangle(&mut self, window: WindowId, gc: GcId, rect: Geometry) -> WmResult<()> {
        let rectangle = Rectangle {
            x: rect.x as i16,
            y: rect.y as i16,
            width: rect.width as u16,
            height: rect.height as u16,
        };
        self.conn.poly_fill_rectangle(window, gc, &[rectangle])?;
        Ok(())
    }

    fn draw_text(&mut self, window: WindowId, gc: GcId, x: i32, y: i32, text: &str) -> WmResult<()> {
        let bytes = &text.as_bytes()[..text.len().min(MAX_TEXT_ITEM)];
        // TEXTITEM8: length, delta, string
        let mut item = Vec::with_capacity(bytes.len() + 2);
        item.push(bytes.len() as u8);
        item.push(0);
        item.extend_from_slice(bytes);
        self.conn.poly_text8(window, gc, x as i16, y as i16, &item)?;
        Ok(())
    }

    fn window_class(&mut self, window: WindowId) -> WmResult<Option<String>> {
        let reply = self
            .conn
            .get_property(false, window, AtomEnum::WM_CLASS, AtomEnum::STRING, 0, 1024)?
            .reply()
            .map_err(|e| WmError::for_window(window, e))?;
        Ok(parse_wm_class(&reply.value))
    }

    fn viewable_top_levels(&mut self) -> WmResult<Vec<WindowId>> {
        let tree = self.conn.query_tree(self.root)?.reply()?;
        let mut windows = Vec::new();
        for child in tree.children {
            match self.conn.get_window_attributes(child)?.reply() {
                Ok(attrs) if attrs.map_state == MapState::VIEWABLE && !attrs.override_redirect => {
                    windows.push(child);
                }
                Ok(_) => {}
                Err(e) => debug!("Skipping top-level 0x{:x}: {}", child, e),
            }
        }
        Ok(windows)
    }

    fn flush(&mut self) -> WmResult<()> {
        self.conn.flush()?;
        Ok(())
    }
}
