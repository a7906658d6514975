//! Keyboard Module
//!
//! Fixed keyboard shortcuts, keysym lookup and root key grabs.

use tracing::{debug, warn};

use crate::error::WmResult;
use crate::wm::display::DisplayServer;
use crate::wm::events::Modifiers;

pub type Keysym = u32;

pub const XK_SPACE: Keysym = 0x0020;
pub const XK_E: Keysym = 0x0045;
pub const XK_Q: Keysym = 0x0051;
pub const XK_T: Keysym = 0x0054;
pub const XK_LEFT: Keysym = 0xff51;
pub const XK_UP: Keysym = 0xff52;
pub const XK_RIGHT: Keysym = 0xff53;
pub const XK_DOWN: Keysym = 0xff54;

/// Screen half a frame can be snapped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapDirection {
    Left,
    Right,
    Up,
    Down,
}

/// Keyboard shortcut action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyboardAction {
    LaunchTerminal,
    LaunchFileManager,
    LaunchLauncher,
    Quit,
    Snap(SnapDirection),
}

/// The bindings grabbed on the root: (keysym, modifiers).
pub const BINDINGS: &[(Keysym, Modifiers)] = &[
    (XK_T, Modifiers::CONTROL.union(Modifiers::SHIFT)),
    (XK_LEFT, Modifiers::CONTROL),
    (XK_RIGHT, Modifiers::CONTROL),
    (XK_UP, Modifiers::CONTROL),
    (XK_DOWN, Modifiers::CONTROL),
    (XK_Q, Modifiers::CONTROL),
    (XK_E, Modifiers::CONTROL),
    (XK_SPACE, Modifiers::CONTROL),
];

/// Keycode to keysym table, as reported by the server's keyboard mapping
#[derive(Debug, Clone, Default)]
pub struct KeyboardMap {
    min_keycode: u8,
    keysyms_per_keycode: usize,
    keysyms: Vec<Keysym>,
}

impl KeyboardMap {
    pub fn new(min_keycode: u8, keysyms_per_keycode: u8, keysyms: Vec<Keysym>) -> Self {
        Self {
            min_keycode,
            keysyms_per_keycode: keysyms_per_keycode as usize,
            keysyms,
        }
    }

    /// Keysym in `column` for `keycode` (0 = unshifted, 1 = shifted).
    /// Returns 0 (NoSymbol) for unknown keycodes.
    pub fn keysym(&self, keycode: u8, column: usize) -> Keysym {
        if keycode < self.min_keycode || column >= self.keysyms_per_keycode {
            return 0;
        }
        let index = (keycode - self.min_keycode) as usize * self.keysyms_per_keycode + column;
        self.keysyms.get(index).copied().unwrap_or(0)
    }

    /// First keycode producing `keysym` in any column
    pub fn keycode(&self, keysym: Keysym) -> Option<u8> {
        if self.keysyms_per_keycode == 0 {
            return None;
        }
        self.keysyms
            .iter()
            .position(|&k| k == keysym)
            .map(|index| self.min_keycode + (index / self.keysyms_per_keycode) as u8)
    }

    /// Map a key press to a shortcut action.
    ///
    /// Letter bindings compare the shifted column, Space and the arrows the
    /// unshifted one. Modifiers are tested for presence, so extra modifiers
    /// such as Shift on the arrows do not block a binding.
    pub fn resolve(&self, keycode: u8, state: Modifiers) -> Option<KeyboardAction> {
        if !state.contains(Modifiers::CONTROL) {
            return None;
        }

        let shifted = self.keysym(keycode, 1);
        if shifted == XK_T && state.contains(Modifiers::SHIFT) {
            return Some(KeyboardAction::LaunchTerminal);
        }
        if shifted == XK_Q {
            return Some(KeyboardAction::Quit);
        }
        if shifted == XK_E {
            return Some(KeyboardAction::LaunchFileManager);
        }

        match self.keysym(keycode, 0) {
            XK_SPACE => Some(KeyboardAction::LaunchLauncher),
            XK_LEFT => Some(KeyboardAction::Snap(SnapDirection::Left)),
            XK_RIGHT => Some(KeyboardAction::Snap(SnapDirection::Right)),
            XK_UP => Some(KeyboardAction::Snap(SnapDirection::Up)),
            XK_DOWN => Some(KeyboardAction::Snap(SnapDirection::Down)),
            _ => None,
        }
    }
}

/// Grab every binding on the root window. Keysyms missing from the
/// keyboard layout are skipped with a warning.
pub fn grab_bindings<D: DisplayServer>(display: &mut D, map: &KeyboardMap) -> WmResult<()> {
    for &(keysym, modifiers) in BINDINGS {
        match map.keycode(keysym) {
            Some(keycode) => {
                debug!("Grabbing keycode {} (keysym 0x{:x}) with {:?}", keycode, keysym, modifiers);
                display.grab_key(keycode, modifiers)?;
            }
            None => warn!("No keycode for keysym 0x{:x}, shortcut disabled", keysym),
        }
    }
    Ok(())
}
