//! Client Registry
//!
//! Single source of truth for which windows are managed. Each client/frame
//! pair lives in one arena slot; separate indices map the client handle, the
//! frame handle and every button handle to that slot, so a removal through
//! any of them drops all entries together.

use std::collections::HashMap;
use tracing::debug;

use crate::error::{WmError, WmResult};
use crate::shared::WindowId;
use crate::wm::client::{DecorationButton, ManagedWindow};

#[derive(Debug, Default)]
pub struct ClientRegistry {
    slots: Vec<Option<ManagedWindow>>,
    free: Vec<usize>,
    /// Occupied slots in registration order
    order: Vec<usize>,
    by_client: HashMap<WindowId, usize>,
    by_frame: HashMap<WindowId, usize>,
    by_button: HashMap<WindowId, usize>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a client/frame pair.
    ///
    /// Fails with `DuplicateRegistration` if either handle is already known
    /// on either side.
    pub fn register(&mut self, managed: ManagedWindow) -> WmResult<()> {
        for handle in [managed.client.window, managed.frame.window] {
            if self.contains(handle) {
                return Err(WmError::DuplicateRegistration(handle));
            }
        }

        let client = managed.client.window;
        let frame = managed.frame.window;
        let buttons: Vec<WindowId> = managed.frame.buttons.iter().map(|b| b.window).collect();

        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(managed);
                slot
            }
            None => {
                self.slots.push(Some(managed));
                self.slots.len() - 1
            }
        };

        self.order.push(slot);
        self.by_client.insert(client, slot);
        self.by_frame.insert(frame, slot);
        for button in buttons {
            self.by_button.insert(button, slot);
        }

        debug!("Registered client 0x{:x} with frame 0x{:x}", client, frame);
        Ok(())
    }

    /// Whether `handle` is a registered client or frame
    pub fn contains(&self, handle: WindowId) -> bool {
        self.by_client.contains_key(&handle) || self.by_frame.contains_key(&handle)
    }

    pub fn by_client(&self, client: WindowId) -> Option<&ManagedWindow> {
        self.by_client.get(&client).and_then(|&slot| self.slot(slot))
    }

    pub fn by_frame(&self, frame: WindowId) -> Option<&ManagedWindow> {
        self.by_frame.get(&frame).and_then(|&slot| self.slot(slot))
    }

    /// Look up the pair owning `handle`, whichever side it names
    pub fn resolve(&self, handle: WindowId) -> Option<&ManagedWindow> {
        self.slot_of(handle).and_then(|slot| self.slot(slot))
    }

    pub fn resolve_mut(&mut self, handle: WindowId) -> Option<&mut ManagedWindow> {
        let slot = self.slot_of(handle)?;
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// The decoration button with this handle, if any
    pub fn button(&self, handle: WindowId) -> Option<DecorationButton> {
        let managed = self.by_button.get(&handle).and_then(|&slot| self.slot(slot))?;
        managed.frame.buttons.iter().find(|b| b.window == handle).copied()
    }

    /// Remove the pair containing `handle` (client or frame side).
    ///
    /// Idempotent: unknown handles return `None`. The client index is tried
    /// first; a frame handle whose client side went away through another
    /// path still resolves through the frame index.
    pub fn remove_if_present(&mut self, handle: WindowId) -> Option<ManagedWindow> {
        let slot = match self.by_client.get(&handle) {
            Some(&slot) => slot,
            None => {
                let &slot = self.by_frame.get(&handle)?;
                debug!("Handle 0x{:x} is a frame, removing its pair", handle);
                slot
            }
        };

        let managed = self.slots.get_mut(slot)?.take()?;
        self.by_client.remove(&managed.client.window);
        self.by_frame.remove(&managed.frame.window);
        for button in &managed.frame.buttons {
            self.by_button.remove(&button.window);
        }
        self.order.retain(|&s| s != slot);
        self.free.push(slot);

        debug!(
            "Unregistered client 0x{:x} / frame 0x{:x}",
            managed.client.window, managed.frame.window
        );
        Some(managed)
    }

    /// Number of client/frame pairs
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of lookup entries: one per side of each pair
    pub fn entry_count(&self) -> usize {
        self.by_client.len() + self.by_frame.len()
    }

    /// Pairs in registration order
    pub fn iter(&self) -> impl Iterator<Item = &ManagedWindow> {
        self.order.iter().filter_map(|&slot| self.slot(slot))
    }

    /// Pairs in slot order, for in-place updates
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ManagedWindow> {
        self.slots.iter_mut().flatten()
    }

    fn slot_of(&self, handle: WindowId) -> Option<usize> {
        self.by_client
            .get(&handle)
            .or_else(|| self.by_frame.get(&handle))
            .copied()
    }

    fn slot(&self, slot: usize) -> Option<&ManagedWindow> {
        self.slots.get(slot).and_then(Option::as_ref)
    }
}
