//! Taskbar (bottom bar) implementation
//!
//! One button per titled client, laid out left to right in registration
//! order. The layout is never stored: every redraw and every click computes
//! it again from the registry, after re-reading each client's WM_CLASS.

use tracing::debug;

use crate::config::TaskbarConfig;
use crate::error::WmResult;
use crate::shared::{Geometry, WindowId};
use crate::wm::client::resolve_title;
use crate::wm::display::{DisplayServer, GcId, WindowRole, WindowSpec};
use crate::wm::registry::ClientRegistry;

/// Longest title drawn on a button, in characters
const MAX_TITLE_CHARS: usize = 20;

/// Horizontal text padding inside a button
const TEXT_PADDING: i32 = 6;

/// One laid-out taskbar slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskbarButton {
    pub frame: WindowId,
    pub x: i32,
    pub width: u32,
    pub label: String,
    pub active: bool,
}

impl TaskbarButton {
    fn contains(&self, x: i32) -> bool {
        x >= self.x && x < self.x + self.width as i32
    }
}

/// Compute the button row for a taskbar `screen_width` pixels wide.
///
/// Slot width divides the screen by the number of managed pairs, so
/// untitled clients leave their share of the bar empty at the right end.
pub fn layout(screen_width: u32, registry: &ClientRegistry, active: Option<WindowId>) -> Vec<TaskbarButton> {
    if registry.is_empty() {
        return Vec::new();
    }
    let pairs = registry.entry_count() / 2;
    let width = screen_width / pairs as u32;

    registry
        .iter()
        .filter(|managed| managed.has_title())
        .enumerate()
        .map(|(slot, managed)| TaskbarButton {
            frame: managed.frame.window,
            x: slot as i32 * width as i32,
            width,
            label: managed.client.title.chars().take(MAX_TITLE_CHARS).collect(),
            active: active == Some(managed.frame.window),
        })
        .collect()
}

/// Re-read every client's title. Applications may set or change WM_CLASS
/// after they are mapped.
pub fn refresh_titles<D: DisplayServer>(display: &mut D, registry: &mut ClientRegistry) {
    for managed in registry.iter_mut() {
        let title = resolve_title(display, managed.client.window);
        if title != managed.client.title {
            debug!(
                "Client 0x{:x} title changed: '{}' -> '{}'",
                managed.client.window, managed.client.title, title
            );
            managed.client.title = title;
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ColorPair {
    background: GcId,
    foreground: GcId,
}

/// The taskbar window and its drawing state
#[derive(Debug)]
pub struct Taskbar {
    pub window: WindowId,
    pub height: u32,
    screen_width: u32,
    button_border: u32,
    active: ColorPair,
    passive: ColorPair,
}

impl Taskbar {
    /// Create and map the taskbar along the bottom of the screen.
    pub fn create<D: DisplayServer>(display: &mut D, config: &TaskbarConfig) -> WmResult<Self> {
        let (screen_width, screen_height) = display.screen_size();
        let root = display.root();
        let background = display.alloc_color(&config.background_color)?;

        let window = display.create_window(&WindowSpec {
            parent: root,
            geometry: Geometry::new(
                0,
                screen_height.saturating_sub(config.height) as i32,
                screen_width,
                config.height,
            ),
            border_width: 0,
            background,
            role: WindowRole::Taskbar,
        })?;

        let mut pair = |bg: &str, fg: &str| -> WmResult<ColorPair> {
            let bg = display.alloc_color(bg)?;
            let fg = display.alloc_color(fg)?;
            Ok(ColorPair {
                background: display.create_gc(window, bg)?,
                foreground: display.create_gc(window, fg)?,
            })
        };
        let active = pair(
            &config.button_active_background_color,
            &config.button_active_font_color,
        )?;
        let passive = pair(
            &config.button_passive_background_color,
            &config.button_passive_font_color,
        )?;

        display.map_window(window)?;
        debug!("Created taskbar 0x{:x} ({}x{})", window, screen_width, config.height);

        Ok(Self {
            window,
            height: config.height,
            screen_width,
            button_border: config.button_border_width,
            active,
            passive,
        })
    }

    /// Clear the bar and draw the current button row.
    pub fn redraw<D: DisplayServer>(
        &self,
        display: &mut D,
        registry: &mut ClientRegistry,
        active: Option<WindowId>,
    ) -> WmResult<()> {
        refresh_titles(display, registry);
        display.clear_window(self.window)?;

        let bbw = self.button_border;
        let text_y = self.height as i32 / 2 + 5;
        for button in layout(self.screen_width, registry, active) {
            let colors = if button.active { self.active } else { self.passive };
            let rect = Geometry::new(
                button.x + bbw as i32,
                bbw as i32,
                button.width.saturating_sub(2 * bbw),
                self.height.saturating_sub(2 * bbw),
            );
            display.fill_rectangle(self.window, colors.background, rect)?;
            display.draw_text(self.window, colors.foreground, button.x + TEXT_PADDING, text_y, &button.label)?;
        }
        Ok(())
    }

    /// Frame whose button covers taskbar x-offset `x`
    pub fn hit_test<D: DisplayServer>(
        &self,
        display: &mut D,
        x: i32,
        registry: &mut ClientRegistry,
    ) -> Option<WindowId> {
        refresh_titles(display, registry);
        layout(self.screen_width, registry, None)
            .into_iter()
            .find(|button| button.contains(x))
            .map(|button| button.frame)
    }
}
