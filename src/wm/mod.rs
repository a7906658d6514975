//! Window Manager Module
//!
//! Handles X11 window management, decorations, and user interactions.
//! `WindowManager` owns all mutable state; the handlers in the submodules
//! are `impl` blocks on it, driven one event at a time by `dispatch`.

pub mod client;
pub mod decorations;
pub mod display;
pub mod events;
pub mod focus;
pub mod keyboard;
pub mod launch;
pub mod moveresize;
pub mod placement;
pub mod registry;
pub mod x11;

#[cfg(test)]
pub mod testing;

use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::config::{CommandsConfig, Config, WindowConfig};
use crate::error::WmResult;
use crate::shared::WindowId;
use crate::shell::Taskbar;
pub use decorations::ButtonType;
use display::{DisplayServer, Pixel, WindowChanges};
use events::{Modifiers, PointerEvent, WmEvent};
use keyboard::{KeyboardAction, KeyboardMap};
use moveresize::Session;
use placement::SavedGeometry;
use registry::ClientRegistry;

/// Only the primary button drives decorations, the taskbar and interactions
const LEFT_BUTTON: u8 = 1;

/// What the event loop should do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Allocated decoration colors
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub border: u32,
    pub frame_active: Pixel,
    pub frame_passive: Pixel,
    close: Pixel,
    maximize: Pixel,
    minimize: Pixel,
}

impl Theme {
    fn allocate<D: DisplayServer>(display: &mut D, config: &WindowConfig) -> WmResult<Self> {
        Ok(Self {
            border: config.frame.border_width,
            frame_active: display.alloc_color(&config.frame.active_background_color)?,
            frame_passive: display.alloc_color(&config.frame.passive_background_color)?,
            close: display.alloc_color(&config.close.color)?,
            maximize: display.alloc_color(&config.maximize.color)?,
            minimize: display.alloc_color(&config.minimize.color)?,
        })
    }

    pub fn button_color(&self, kind: ButtonType) -> Pixel {
        match kind {
            ButtonType::Close => self.close,
            ButtonType::Maximize => self.maximize,
            ButtonType::Minimize => self.minimize,
        }
    }
}

pub struct WindowManager<D: DisplayServer> {
    pub(crate) display: D,
    theme: Theme,
    commands: CommandsConfig,
    pub(crate) registry: ClientRegistry,
    /// Pre-maximize geometries
    saved: SavedGeometry,
    session: Session,
    /// Frame that currently has focus
    pub(crate) active: Option<WindowId>,
    pub(crate) taskbar: Taskbar,
    keyboard: KeyboardMap,
    /// Clients adopted while viewable; their reparent unmap is expected
    reparenting: HashSet<WindowId>,
}

impl<D: DisplayServer> WindowManager<D> {
    /// Allocate colors, create the taskbar and grab the shortcut keys.
    pub fn new(mut display: D, config: &Config) -> WmResult<Self> {
        let window_config = &config.display.window;
        let theme = Theme::allocate(&mut display, window_config)?;
        let taskbar = Taskbar::create(&mut display, &window_config.taskbar)?;

        let keymap = display.keyboard_map()?;
        keyboard::grab_bindings(&mut display, &keymap)?;

        let (width, height) = display.screen_size();
        info!(
            "Window manager ready on {}x{} screen (border {}, taskbar {})",
            width, height, theme.border, taskbar.height
        );

        Ok(Self {
            display,
            theme,
            commands: config.commands.clone(),
            registry: ClientRegistry::new(),
            saved: SavedGeometry::default(),
            session: Session::default(),
            active: None,
            taskbar,
            keyboard: keymap,
            reparenting: HashSet::new(),
        })
    }

    /// Decorate top-level windows that were already mapped before we started.
    pub fn adopt_existing_windows(&mut self) -> WmResult<()> {
        let windows = self.display.viewable_top_levels()?;
        info!("Adopting {} existing windows", windows.len());

        for window in windows {
            if window == self.taskbar.window || self.registry.contains(window) {
                continue;
            }
            if let Err(e) = self.decorate(window, true) {
                if e.is_fatal() {
                    return Err(e);
                }
                warn!("Failed to adopt window 0x{:x}: {}", window, e);
            }
        }
        Ok(())
    }

    /// Route one event to its handler, then repaint the taskbar and flush.
    ///
    /// Handler failures caused by stale windows are logged and swallowed;
    /// only a broken connection is returned.
    pub fn dispatch(&mut self, event: WmEvent) -> WmResult<Flow> {
        let topology = event.changes_topology();

        let result = match event {
            WmEvent::MapRequest { window } => self.decorate(window, false).map(|()| Flow::Continue),
            WmEvent::ConfigureRequest { window, changes } => {
                self.handle_configure_request(window, &changes).map(|()| Flow::Continue)
            }
            WmEvent::DestroyNotify { window } => {
                self.handle_destroy(window);
                Ok(Flow::Continue)
            }
            WmEvent::UnmapNotify { window } => self.handle_unmap(window).map(|()| Flow::Continue),
            WmEvent::KeyPress { keycode, state } => self.handle_key(keycode, state),
            WmEvent::ButtonPress(ref pointer) => self.handle_button_press(pointer).map(|()| Flow::Continue),
            WmEvent::MotionNotify(ref pointer) => self.handle_motion(pointer).map(|()| Flow::Continue),
            WmEvent::ButtonRelease(_) => {
                self.end_interaction();
                Ok(Flow::Continue)
            }
        };

        let flow = match result {
            Ok(flow) => flow,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Failed to handle {:?}: {}", event, e);
                Flow::Continue
            }
        };

        if topology {
            debug!("Managing {} windows", self.registry.len());
        }

        self.redraw_taskbar()?;
        self.display.flush()?;
        Ok(flow)
    }

    /// Repaint the taskbar. Stale-window failures are logged only.
    pub fn redraw_taskbar(&mut self) -> WmResult<()> {
        match self.taskbar.redraw(&mut self.display, &mut self.registry, self.active) {
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!("Failed to redraw taskbar: {}", e);
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }

    /// Forward the requested fields to the window unchanged.
    fn handle_configure_request(&mut self, window: WindowId, changes: &WindowChanges) -> WmResult<()> {
        debug!("Configure request for 0x{:x}: {:?}", window, changes);
        self.display.configure_window(window, changes)?;

        if let Some(managed) = self.registry.resolve_mut(window).filter(|m| m.client.window == window) {
            managed.client.geometry = changes.apply_to(managed.client.geometry);
        }
        Ok(())
    }

    fn handle_destroy(&mut self, window: WindowId) {
        if self.teardown(window).is_none() {
            debug!("Destroy notify for unmanaged window 0x{:x}", window);
        }
    }

    /// Hide the frame of a client that unmapped itself (or was minimized).
    fn handle_unmap(&mut self, window: WindowId) -> WmResult<()> {
        if self.reparenting.remove(&window) {
            debug!("Ignoring unmap of 0x{:x} caused by reparenting", window);
            return Ok(());
        }
        let Some(managed) = self.registry.by_client(window) else {
            return Ok(());
        };
        let frame = managed.frame.window;
        debug!("Client 0x{:x} unmapped, hiding frame 0x{:x}", window, frame);
        self.display.unmap_window(frame)
    }

    fn handle_key(&mut self, keycode: u8, state: Modifiers) -> WmResult<Flow> {
        let Some(action) = self.keyboard.resolve(keycode, state) else {
            debug!("No binding for keycode {} with {:?}", keycode, state);
            return Ok(Flow::Continue);
        };
        debug!("Key action {:?}", action);

        match action {
            KeyboardAction::Snap(direction) => self.snap_active(direction)?,
            KeyboardAction::Quit => {
                info!("Quit shortcut pressed");
                return Ok(Flow::Quit);
            }
            other => {
                if let Some(argv) = self.launch_command(other) {
                    launch::spawn(argv);
                }
            }
        }
        Ok(Flow::Continue)
    }

    /// Configured command line for a launch shortcut
    fn launch_command(&self, action: KeyboardAction) -> Option<&[String]> {
        match action {
            KeyboardAction::LaunchTerminal => Some(self.commands.terminal.as_slice()),
            KeyboardAction::LaunchFileManager => Some(self.commands.filemanager.as_slice()),
            KeyboardAction::LaunchLauncher => Some(self.commands.launcher.as_slice()),
            KeyboardAction::Snap(_) | KeyboardAction::Quit => None,
        }
    }

    fn handle_button_press(&mut self, event: &PointerEvent) -> WmResult<()> {
        if event.button != LEFT_BUTTON {
            return Ok(());
        }

        if let Some(button) = self.registry.button(event.window) {
            debug!("{:?} pressed for client 0x{:x}", button.kind, button.client);
            return match button.kind {
                ButtonType::Close => self.display.destroy_window(button.client),
                ButtonType::Maximize => self.toggle_maximize(button.client),
                ButtonType::Minimize => self.display.unmap_window(button.client),
            };
        }

        if event.window == self.taskbar.window {
            let hit = self
                .taskbar
                .hit_test(&mut self.display, event.event_x, &mut self.registry);
            if let Some(frame) = hit {
                self.set_active(frame);
            }
            return Ok(());
        }

        let Some(frame) = self.registry.resolve(event.window).map(|m| m.frame.window) else {
            return Ok(());
        };
        self.set_active(frame);
        self.begin_interaction(frame, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Geometry;
    use crate::wm::testing::{pointer, test_wm, with_client, ROOT};

    const CTRL: Modifiers = Modifiers::CONTROL;

    fn button_window(wm: &WindowManager<testing::MockDisplay>, frame: WindowId, kind: ButtonType) -> WindowId {
        let managed = wm.registry.by_frame(frame).unwrap();
        managed.frame.buttons.iter().find(|b| b.kind == kind).unwrap().window
    }

    #[test]
    fn test_startup_grabs_shortcuts_and_maps_taskbar() {
        let wm = test_wm();
        assert_eq!(wm.display.key_grabs.len(), keyboard::BINDINGS.len());
        let taskbar = &wm.display.windows[&wm.taskbar.window];
        assert!(taskbar.mapped);
        assert_eq!(taskbar.geometry, Geometry::new(0, 1050, 1920, 30));
    }

    #[test]
    fn test_map_request_decorates_and_activates() {
        let mut wm = test_wm();
        let client = wm.display.add_client(Geometry::new(30, 40, 400, 300), Some("XTerm"));

        let flow = wm.dispatch(WmEvent::MapRequest { window: client }).unwrap();
        assert_eq!(flow, Flow::Continue);

        let managed = wm.registry.by_client(client).unwrap();
        let frame = managed.frame.window;
        assert_eq!((managed.frame.geometry.width, managed.frame.geometry.height), (420, 320));
        assert_eq!(
            managed.frame.geometry.width,
            managed.client.geometry.width + 2 * wm.theme.border
        );
        assert_eq!(wm.active, Some(frame));
        assert_eq!(wm.display.focused, Some(client));
        assert_eq!(wm.display.drawn_text.last().unwrap().3, "XTerm");
    }

    #[test]
    fn test_ctrl_left_snaps_active_frame() {
        let (mut wm, client, frame) = with_client(Geometry::new(500, 500, 400, 300));

        wm.dispatch(WmEvent::KeyPress { keycode: 113, state: CTRL }).unwrap();

        assert_eq!(wm.registry.by_frame(frame).unwrap().frame.geometry, Geometry::new(0, 0, 960, 1050));
        assert_eq!(wm.display.windows[&client].geometry, Geometry::new(10, 10, 940, 1030));
        let close = button_window(&wm, frame, ButtonType::Close);
        assert_eq!(wm.display.windows[&close].geometry.x, ButtonType::Close.offset(960, 10));
    }

    #[test]
    fn test_launch_shortcuts_pick_configured_commands() {
        let mut wm = test_wm();
        wm.commands = CommandsConfig {
            terminal: vec!["xterm".to_string()],
            filemanager: vec!["xterm".to_string(), "-e".to_string(), "lf".to_string()],
            launcher: vec!["dmenu_run".to_string()],
        };
        let command = |keycode, state| {
            let action = wm.keyboard.resolve(keycode, state).unwrap();
            wm.launch_command(action).map(|argv| argv.join(" "))
        };

        assert_eq!(command(28, CTRL | Modifiers::SHIFT).as_deref(), Some("xterm"));
        assert_eq!(command(26, CTRL).as_deref(), Some("xterm -e lf"));
        assert_eq!(command(65, CTRL).as_deref(), Some("dmenu_run"));
        assert_eq!(command(113, CTRL), None);
        assert_eq!(command(24, CTRL), None);
    }

    #[tokio::test]
    async fn test_launch_keys_keep_running() {
        let mut wm = test_wm();
        let argv = vec!["true".to_string()];
        wm.commands = CommandsConfig {
            terminal: argv.clone(),
            filemanager: argv.clone(),
            launcher: argv,
        };

        for (keycode, state) in [(28, CTRL | Modifiers::SHIFT), (26, CTRL), (65, CTRL)] {
            let flow = wm.dispatch(WmEvent::KeyPress { keycode, state }).unwrap();
            assert_eq!(flow, Flow::Continue);
        }
        assert!(wm.registry.is_empty());
    }

    #[test]
    fn test_ctrl_q_quits() {
        let mut wm = test_wm();
        assert_eq!(wm.dispatch(WmEvent::KeyPress { keycode: 24, state: CTRL }).unwrap(), Flow::Quit);
        assert_eq!(
            wm.dispatch(WmEvent::KeyPress { keycode: 24, state: Modifiers::empty() }).unwrap(),
            Flow::Continue
        );
    }

    #[test]
    fn test_destroy_by_frame_handle_removes_pair() {
        let (mut wm, client, frame) = with_client(Geometry::new(0, 0, 400, 300));

        wm.dispatch(WmEvent::DestroyNotify { window: frame }).unwrap();
        assert!(wm.registry.by_client(client).is_none());
        assert!(wm.registry.by_frame(frame).is_none());
        assert_eq!(wm.active, None);

        // Duplicate notifications for either side are harmless
        wm.dispatch(WmEvent::DestroyNotify { window: frame }).unwrap();
        wm.dispatch(WmEvent::DestroyNotify { window: client }).unwrap();
    }

    #[test]
    fn test_close_button_destroys_client() {
        let (mut wm, client, frame) = with_client(Geometry::new(0, 0, 400, 300));
        let close = button_window(&wm, frame, ButtonType::Close);

        wm.dispatch(WmEvent::ButtonPress(pointer(close, 3, 3, 403, 3))).unwrap();
        assert!(!wm.display.windows.contains_key(&client));

        wm.dispatch(WmEvent::DestroyNotify { window: client }).unwrap();
        assert!(wm.registry.is_empty());
        assert!(!wm.display.windows.contains_key(&frame));
        assert!(wm.session.is_idle());
    }

    #[test]
    fn test_minimize_then_restore_from_taskbar() {
        let (mut wm, client, frame) = with_client(Geometry::new(0, 0, 400, 300));
        let minimize = button_window(&wm, frame, ButtonType::Minimize);

        wm.dispatch(WmEvent::ButtonPress(pointer(minimize, 3, 3, 383, 3))).unwrap();
        assert!(!wm.display.windows[&client].mapped);
        wm.dispatch(WmEvent::UnmapNotify { window: client }).unwrap();
        assert!(!wm.display.windows[&frame].mapped);
        assert!(wm.registry.by_client(client).is_some());

        let taskbar = wm.taskbar.window;
        wm.dispatch(WmEvent::ButtonPress(pointer(taskbar, 100, 15, 100, 1065))).unwrap();
        assert!(wm.display.windows[&client].mapped);
        assert!(wm.display.windows[&frame].mapped);
        assert_eq!(wm.active, Some(frame));
    }

    #[test]
    fn test_maximize_button_toggles() {
        let (mut wm, _client, frame) = with_client(Geometry::new(100, 100, 400, 300));
        let maximize = button_window(&wm, frame, ButtonType::Maximize);

        wm.dispatch(WmEvent::ButtonPress(pointer(maximize, 3, 3, 493, 103))).unwrap();
        assert_eq!(wm.registry.by_frame(frame).unwrap().frame.geometry, Geometry::new(0, 0, 1920, 1050));
        assert!(wm.session.is_idle());
    }

    #[test]
    fn test_taskbar_click_activates_client() {
        let (mut wm, _first_client, first) = with_client(Geometry::new(0, 0, 300, 200));
        let second_client = wm.display.add_client(Geometry::new(10, 10, 300, 200), Some("Firefox"));
        wm.dispatch(WmEvent::MapRequest { window: second_client }).unwrap();
        assert_ne!(wm.active, Some(first));

        let taskbar = wm.taskbar.window;
        wm.dispatch(WmEvent::ButtonPress(pointer(taskbar, 5, 15, 5, 1065))).unwrap();
        assert_eq!(wm.active, Some(first));
        assert!(wm.session.is_idle());
    }

    #[test]
    fn test_press_and_release_on_frame() {
        let (mut wm, _client, frame) = with_client(Geometry::new(100, 100, 400, 300));

        wm.dispatch(WmEvent::ButtonPress(pointer(frame, 50, 5, 150, 105))).unwrap();
        assert_eq!(wm.session.target(), Some(frame));

        wm.dispatch(WmEvent::MotionNotify(pointer(frame, 0, 0, 250, 205))).unwrap();
        assert_eq!(wm.display.windows[&frame].geometry.x, 200);

        wm.dispatch(WmEvent::ButtonRelease(pointer(frame, 0, 0, 250, 205))).unwrap();
        assert!(wm.session.is_idle());
        wm.dispatch(WmEvent::ButtonRelease(pointer(frame, 0, 0, 250, 205))).unwrap();
        assert!(wm.session.is_idle());
        assert_eq!(wm.display.pointer_grab, None);
    }

    #[test]
    fn test_other_buttons_are_ignored() {
        let (mut wm, _client, frame) = with_client(Geometry::new(100, 100, 400, 300));
        let mut event = pointer(frame, 50, 5, 150, 105);
        event.button = 3;

        wm.dispatch(WmEvent::ButtonPress(event)).unwrap();
        assert!(wm.session.is_idle());
    }

    #[test]
    fn test_configure_request_passes_through() {
        let mut wm = test_wm();
        let stranger = wm.display.add_client(Geometry::new(0, 0, 100, 100), None);
        wm.dispatch(WmEvent::ConfigureRequest {
            window: stranger,
            changes: WindowChanges::size(640, 480),
        })
        .unwrap();
        assert_eq!(wm.display.windows[&stranger].geometry, Geometry::new(0, 0, 640, 480));

        let (mut wm, client, _frame) = with_client(Geometry::new(0, 0, 400, 300));
        wm.dispatch(WmEvent::ConfigureRequest {
            window: client,
            changes: WindowChanges::size(500, 350),
        })
        .unwrap();
        assert_eq!(wm.registry.by_client(client).unwrap().client.geometry, Geometry::new(10, 10, 500, 350));
    }

    #[test]
    fn test_stale_window_errors_are_swallowed() {
        let mut wm = test_wm();
        let flow = wm
            .dispatch(WmEvent::ConfigureRequest {
                window: 0xdead,
                changes: WindowChanges::position(1, 1),
            })
            .unwrap();
        assert_eq!(flow, Flow::Continue);
        assert!(wm.dispatch(WmEvent::MapRequest { window: 0xdead }).is_ok());
    }

    #[test]
    fn test_adopt_existing_windows_ignores_reparent_unmap() {
        let mut wm = test_wm();
        let client = wm.display.add_client(Geometry::new(20, 20, 300, 200), Some("XTerm"));
        wm.display.windows.get_mut(&client).unwrap().mapped = true;

        wm.adopt_existing_windows().unwrap();
        let frame = wm.registry.by_client(client).unwrap().frame.window;
        assert_eq!(wm.display.windows[&frame].parent, ROOT);
        assert_eq!(wm.registry.len(), 1);

        wm.dispatch(WmEvent::UnmapNotify { window: client }).unwrap();
        assert!(wm.display.windows[&frame].mapped);

        // A later unmap is a real one
        wm.dispatch(WmEvent::UnmapNotify { window: client }).unwrap();
        assert!(!wm.display.windows[&frame].mapped);
    }

    #[test]
    fn test_taskbar_skips_untitled_clients() {
        let mut wm = test_wm();
        for title in [Some("XTerm"), None, Some("Firefox")] {
            let client = wm.display.add_client(Geometry::new(0, 0, 200, 100), title);
            wm.dispatch(WmEvent::MapRequest { window: client }).unwrap();
        }
        wm.display.drawn_text.clear();
        wm.redraw_taskbar().unwrap();

        let labels: Vec<&str> = wm.display.drawn_text.iter().map(|t| t.3.as_str()).collect();
        assert_eq!(labels, vec!["XTerm", "Firefox"]);
    }
}
