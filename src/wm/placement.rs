//! Placement Module
//!
//! Maximize/restore toggling and snapping the active frame to screen halves.
//! The taskbar strip at the bottom of the screen is never covered by a
//! maximized or half-snapped frame.

use std::collections::HashMap;
use tracing::{debug, info};

use crate::error::WmResult;
use crate::shared::{Geometry, WindowId};
use crate::wm::display::{DisplayServer, WindowChanges};
use crate::wm::keyboard::SnapDirection;
use crate::wm::WindowManager;

/// Pre-maximize geometries, keyed by frame and by client handle
#[derive(Debug, Default)]
pub struct SavedGeometry {
    entries: HashMap<WindowId, Geometry>,
}

impl SavedGeometry {
    pub fn save(&mut self, window: WindowId, geometry: Geometry) {
        self.entries.insert(window, geometry);
    }

    pub fn get(&self, window: WindowId) -> Option<Geometry> {
        self.entries.get(&window).copied()
    }

    pub fn forget(&mut self, window: WindowId) {
        self.entries.remove(&window);
    }
}

/// Target frame geometry for a snap on a `width × height` screen
pub fn snap_geometry(direction: SnapDirection, width: u32, height: u32, taskbar: u32) -> Geometry {
    let usable = height.saturating_sub(taskbar);
    let half_w = width / 2;
    let half_h = height / 2;
    match direction {
        SnapDirection::Left => Geometry::new(0, 0, half_w, usable),
        SnapDirection::Right => Geometry::new(half_w as i32, 0, half_w, usable),
        SnapDirection::Up => Geometry::new(0, 0, width, half_h),
        SnapDirection::Down => Geometry::new(0, half_h as i32, width, half_h.saturating_sub(taskbar)),
    }
}

impl<D: DisplayServer> WindowManager<D> {
    /// Screen area above the taskbar
    fn work_area(&self) -> Geometry {
        let (width, height) = self.display.screen_size();
        Geometry::new(0, 0, width, height.saturating_sub(self.taskbar.height))
    }

    /// Maximize the frame of `client`, or restore it if it already fills the
    /// work area.
    ///
    /// A frame is considered maximized when its size equals the work area,
    /// whatever its position. Saved geometry outlives the restore; only
    /// teardown forgets it.
    pub fn toggle_maximize(&mut self, client: WindowId) -> WmResult<()> {
        let Some(managed) = self.registry.by_client(client) else {
            debug!("Maximize for unmanaged client 0x{:x}", client);
            return Ok(());
        };
        let frame = managed.frame.window;
        let frame_geometry = managed.frame.geometry;
        let client_geometry = managed.client.geometry;
        let work_area = self.work_area();

        if frame_geometry.same_size(work_area.width, work_area.height) {
            match (self.saved.get(frame), self.saved.get(client)) {
                (Some(saved_frame), Some(saved_client)) => {
                    info!("Restoring frame 0x{:x} to {:?}", frame, saved_frame);
                    self.place(frame, saved_frame, saved_client)?;
                }
                _ => {
                    // Created at full size: nothing to restore to
                    debug!("Frame 0x{:x} has no saved geometry, moving to origin", frame);
                    if let Some(managed) = self.registry.resolve_mut(frame) {
                        managed.frame.geometry.x = 0;
                        managed.frame.geometry.y = 0;
                    }
                    self.display.configure_window(frame, &WindowChanges::position(0, 0))?;
                }
            }
        } else {
            info!("Maximizing frame 0x{:x}", frame);
            self.saved.save(frame, frame_geometry);
            self.saved.save(client, client_geometry);
            self.place(frame, work_area, work_area.inset(self.theme.border))?;
        }

        self.reposition_buttons(frame)
    }

    /// Snap the active frame to a screen half. No-op without an active frame.
    pub fn snap_active(&mut self, direction: SnapDirection) -> WmResult<()> {
        let Some(frame) = self.active else {
            return Ok(());
        };
        let (width, height) = self.display.screen_size();
        let target = snap_geometry(direction, width, height, self.taskbar.height);
        debug!("Snapping frame 0x{:x} {:?} to {:?}", frame, direction, target);

        self.place(frame, target, target.inset(self.theme.border))?;
        self.reposition_buttons(frame)
    }

    /// Move/resize a frame and its client, keeping the registry in step.
    fn place(&mut self, frame: WindowId, frame_geometry: Geometry, client_geometry: Geometry) -> WmResult<()> {
        let Some(managed) = self.registry.resolve_mut(frame) else {
            return Ok(());
        };
        managed.frame.geometry = frame_geometry;
        managed.client.geometry = client_geometry;
        let client = managed.client.window;

        self.display.configure_window(frame, &WindowChanges::geometry(frame_geometry))?;
        self.display.configure_window(client, &WindowChanges::geometry(client_geometry))
    }
}
