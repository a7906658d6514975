//! Window decorations (frame and buttons) for floatwm
//!
//! Every client is reparented into a frame `border` pixels larger on each
//! side. Three `border × border` buttons sit on the frame's top edge, flush
//! with its right side: close nearest the edge, then maximize, then minimize.

use tracing::{debug, info, warn};

use crate::error::WmResult;
use crate::shared::{Geometry, WindowId};
use crate::wm::client::{Client, DecorationButton, Frame, ManagedWindow, resolve_title};
use crate::wm::display::{DisplayServer, WindowChanges, WindowRole, WindowSpec};
use crate::wm::WindowManager;

/// Border drawn around each decoration button
const BUTTON_BORDER_WIDTH: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonType {
    Close,
    Maximize,
    Minimize,
}

impl ButtonType {
    /// Right-to-left order along the frame's top edge
    pub const ALL: [ButtonType; 3] = [ButtonType::Close, ButtonType::Maximize, ButtonType::Minimize];

    fn slot(self) -> i32 {
        match self {
            ButtonType::Close => 0,
            ButtonType::Maximize => 1,
            ButtonType::Minimize => 2,
        }
    }

    /// X offset of this button inside a frame of `frame_width`
    pub fn offset(self, frame_width: u32, border: u32) -> i32 {
        frame_width as i32 - (self.slot() + 2) * border as i32
    }
}

impl<D: DisplayServer> WindowManager<D> {
    /// Wrap a newly mapped client in a frame and make it active.
    ///
    /// A client that is already managed (e.g. re-mapped after minimize) is
    /// only mapped again. `viewable` marks windows adopted while already
    /// mapped, whose reparent produces an unmap notify we must ignore.
    pub fn decorate(&mut self, client: WindowId, viewable: bool) -> WmResult<()> {
        if self.registry.by_client(client).is_some() {
            debug!("Client 0x{:x} already framed, mapping it again", client);
            return self.display.map_window(client);
        }

        let border = self.theme.border;
        let geometry = self.display.get_geometry(client)?;
        let title = resolve_title(&mut self.display, client);
        let frame_geometry = geometry.enclosing(border);
        let root = self.display.root();

        let frame = self.display.create_window(&WindowSpec {
            parent: root,
            geometry: frame_geometry,
            border_width: 0,
            background: self.theme.frame_passive,
            role: WindowRole::Frame,
        })?;

        let buttons = match self.create_buttons(frame, client, frame_geometry.width) {
            Ok(buttons) => buttons,
            Err(e) => {
                if let Err(cleanup) = self.display.destroy_window(frame) {
                    warn!("Failed to destroy half-built frame 0x{:x}: {}", frame, cleanup);
                }
                return Err(e);
            }
        };

        if viewable {
            self.reparenting.insert(client);
        }
        self.display.reparent_window(client, frame, border as i32, border as i32)?;
        self.display.map_window(frame)?;
        self.display.map_window(client)?;

        self.registry.register(ManagedWindow {
            client: Client {
                window: client,
                title: title.clone(),
                geometry: Geometry::new(border as i32, border as i32, geometry.width, geometry.height),
                frame,
            },
            frame: Frame {
                window: frame,
                geometry: frame_geometry,
                active: false,
                buttons,
                client,
            },
        })?;

        info!(
            "Managing window 0x{:x} ('{}') in frame 0x{:x} at {}x{}+{}+{}",
            client, title, frame, frame_geometry.width, frame_geometry.height, frame_geometry.x, frame_geometry.y
        );

        self.set_active(frame);
        Ok(())
    }

    fn create_buttons(
        &mut self,
        frame: WindowId,
        client: WindowId,
        frame_width: u32,
    ) -> WmResult<[DecorationButton; 3]> {
        let border = self.theme.border;
        let mut created = Vec::with_capacity(ButtonType::ALL.len());

        for kind in ButtonType::ALL {
            let window = self.display.create_window(&WindowSpec {
                parent: frame,
                geometry: Geometry::new(kind.offset(frame_width, border), 0, border, border),
                border_width: BUTTON_BORDER_WIDTH,
                background: self.theme.button_color(kind),
                role: WindowRole::Button,
            })?;
            self.display.map_window(window)?;
            created.push(DecorationButton { window, kind, client });
        }

        Ok([created[0], created[1], created[2]])
    }

    /// Keep the buttons flush with the frame's (possibly new) right edge.
    pub fn reposition_buttons(&mut self, frame: WindowId) -> WmResult<()> {
        let Some(managed) = self.registry.by_frame(frame) else {
            return Ok(());
        };
        let width = managed.frame.geometry.width;
        let buttons = managed.frame.buttons;

        for button in buttons {
            let changes = WindowChanges {
                x: Some(button.kind.offset(width, self.theme.border)),
                y: Some(0),
                ..WindowChanges::default()
            };
            self.display.configure_window(button.window, &changes)?;
        }
        Ok(())
    }

    /// Forget the pair containing `handle` and destroy its frame.
    ///
    /// The server takes the buttons and the reparented client down with the
    /// frame. A frame that is already gone is logged and ignored.
    pub fn teardown(&mut self, handle: WindowId) -> Option<ManagedWindow> {
        let managed = self.registry.remove_if_present(handle)?;
        let frame = managed.frame.window;

        if managed.client.window == handle {
            info!("Destroying frame 0x{:x} for window 0x{:x}", frame, handle);
        } else {
            info!("Client 0x{:x} already gone, destroying frame 0x{:x}", managed.client.window, frame);
        }

        if let Err(e) = self.display.destroy_window(frame) {
            warn!("Failed to destroy frame 0x{:x}: {}", frame, e);
        }

        self.saved.forget(frame);
        self.saved.forget(managed.client.window);
        self.reparenting.remove(&managed.client.window);

        if self.active == Some(frame) {
            self.active = None;
        }
        if self.session.target() == Some(frame) {
            self.end_interaction();
        }

        Some(managed)
    }
}
