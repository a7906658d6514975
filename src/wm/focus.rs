//! Focus Module
//!
//! Tracks the single active frame. Activating a frame recolors it, raises it
//! (with the taskbar kept on top), maps it and gives its client the keyboard.

use tracing::{debug, warn};

use crate::error::WmResult;
use crate::shared::WindowId;
use crate::wm::display::{DisplayServer, WindowChanges};
use crate::wm::WindowManager;

impl<D: DisplayServer> WindowManager<D> {
    /// Make `frame` the active frame.
    ///
    /// Does nothing for the taskbar or a handle that is not a registered
    /// frame. Display failures are logged; the bookkeeping still moves to
    /// the new frame.
    pub fn set_active(&mut self, frame: WindowId) {
        if frame == self.taskbar.window {
            return;
        }
        let Some(managed) = self.registry.by_frame(frame) else {
            debug!("Ignoring activation of unmanaged window 0x{:x}", frame);
            return;
        };
        let client = managed.client.window;

        if let Some(previous) = self.active.filter(|&p| p != frame) {
            if let Err(e) = self.display.set_background(previous, self.theme.frame_passive) {
                warn!("Failed to deactivate frame 0x{:x}: {}", previous, e);
            }
            if let Some(managed) = self.registry.resolve_mut(previous) {
                managed.frame.active = false;
            }
        }

        self.active = Some(frame);
        if let Some(managed) = self.registry.resolve_mut(frame) {
            managed.frame.active = true;
        }

        if let Err(e) = self.show_on_top(frame, client) {
            warn!("Failed to activate frame 0x{:x}: {}", frame, e);
        }

        if let Err(e) = self.display.configure_window(self.taskbar.window, &WindowChanges::raise()) {
            warn!("Failed to raise taskbar: {}", e);
        }

        debug!("Active frame is now 0x{:x} (client 0x{:x})", frame, client);
    }

    fn show_on_top(&mut self, frame: WindowId, client: WindowId) -> WmResult<()> {
        self.display.map_window(frame)?;
        self.display.map_window(client)?;
        self.display.set_background(frame, self.theme.frame_active)?;
        self.display.configure_window(frame, &WindowChanges::raise())?;
        self.display.set_input_focus(client)
    }
}

#[cfg(test)]
mod tests {
    use crate::shared::Geometry;
    use crate::wm::testing::{test_wm, with_client};

    #[test]
    fn test_activation_moves_between_frames() {
        let (mut wm, first_client, first) = with_client(Geometry::new(0, 0, 300, 200));
        let second_client = wm.display.add_client(Geometry::new(50, 50, 300, 200), Some("Firefox"));
        wm.decorate(second_client, false).unwrap();
        let second = wm.registry.by_client(second_client).unwrap().frame.window;

        assert_eq!(wm.active, Some(second));
        assert_eq!(wm.display.windows[&first].background, wm.theme.frame_passive);
        assert_eq!(wm.display.windows[&second].background, wm.theme.frame_active);

        wm.set_active(first);
        assert_eq!(wm.active, Some(first));
        assert_eq!(wm.display.focused, Some(first_client));
        assert_eq!(wm.display.windows[&first].background, wm.theme.frame_active);
        assert_eq!(wm.display.windows[&second].background, wm.theme.frame_passive);
        assert!(wm.registry.by_frame(first).unwrap().frame.active);
        assert!(!wm.registry.by_frame(second).unwrap().frame.active);

        // Taskbar is raised after the frame
        let raised: Vec<_> = wm.display.raised.iter().rev().take(2).copied().collect();
        assert_eq!(raised, vec![wm.taskbar.window, first]);
    }

    #[test]
    fn test_activation_ignores_taskbar_and_strangers() {
        let (mut wm, _client, frame) = with_client(Geometry::new(0, 0, 300, 200));

        let taskbar = wm.taskbar.window;
        wm.set_active(taskbar);
        assert_eq!(wm.active, Some(frame));

        wm.set_active(0xbeef);
        assert_eq!(wm.active, Some(frame));
    }

    #[test]
    fn test_activation_maps_minimized_client() {
        let mut wm = test_wm();
        let client = wm.display.add_client(Geometry::new(0, 0, 300, 200), Some("XTerm"));
        wm.decorate(client, false).unwrap();
        let frame = wm.registry.by_client(client).unwrap().frame.window;

        wm.display.windows.get_mut(&client).unwrap().mapped = false;
        wm.display.windows.get_mut(&frame).unwrap().mapped = false;
        wm.set_active(frame);

        assert!(wm.display.windows[&client].mapped);
        assert!(wm.display.windows[&frame].mapped);
    }
}
