use serde::{Deserialize, Serialize};

use super::window::{OutputId, SlotChange, SlotIndex, WindowId};
use crate::common::collections::{HashMap, HashSet};

/// Where a window came from and where we put it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovedEntry {
    pub origin: SlotIndex,
    pub placed: SlotIndex,
    pub output: OutputId,
    pub moved: bool,
}

/// Bookkeeping keyed by window id.
///
/// `moved` holds the windows we relocated and still own a slot for. `handled`
/// holds every window that already went through a placement decision; it
/// only shrinks when the window is destroyed, so a window is placed at most
/// once per lifetime even after its moved entry has been released.
#[derive(Debug, Default)]
pub struct MovedRegistry {
    moved: HashMap<WindowId, MovedEntry>,
    handled: HashSet<WindowId>,
}

impl MovedRegistry {
    pub fn new() -> Self { Self::default() }

    pub fn record(&mut self, window: WindowId, entry: MovedEntry) -> Option<MovedEntry> {
        self.handled.insert(window);
        self.moved.insert(window, entry)
    }

    pub fn get(&self, window: WindowId) -> Option<&MovedEntry> { self.moved.get(&window) }

    pub fn contains(&self, window: WindowId) -> bool { self.moved.contains_key(&window) }

    /// Removes and returns the moved entry, leaving the window marked handled.
    pub fn take(&mut self, window: WindowId) -> Option<MovedEntry> { self.moved.remove(&window) }

    /// Returns `true` if the window was not handled before.
    pub fn mark_handled(&mut self, window: WindowId) -> bool { self.handled.insert(window) }

    pub fn is_handled(&self, window: WindowId) -> bool { self.handled.contains(&window) }

    /// Drops everything known about a window that no longer exists.
    pub fn forget(&mut self, window: WindowId) {
        self.moved.remove(&window);
        self.handled.remove(&window);
    }

    /// Keeps recorded positions on the same slots after the sequence
    /// changed. Positions of a removed slot are left as they were.
    pub fn apply_slot_change(&mut self, change: SlotChange) {
        for entry in self.moved.values_mut() {
            entry.origin = change.apply(entry.origin).unwrap_or(entry.origin);
            entry.placed = change.apply(entry.placed).unwrap_or(entry.placed);
        }
    }

    pub fn clear(&mut self) {
        self.moved.clear();
        self.handled.clear();
    }

    pub fn len(&self) -> usize { self.moved.len() }

    pub fn is_empty(&self) -> bool { self.moved.is_empty() && self.handled.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (WindowId, &MovedEntry)> + '_ {
        self.moved.iter().map(|(id, entry)| (*id, entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(origin: usize, placed: usize) -> MovedEntry {
        MovedEntry {
            origin: SlotIndex::new(origin),
            placed: SlotIndex::new(placed),
            output: OutputId::new(0),
            moved: true,
        }
    }

    #[test]
    fn take_keeps_window_handled() {
        let mut registry = MovedRegistry::new();
        let w = WindowId::new(4);
        assert_eq!(registry.record(w, entry(0, 2)), None);
        assert_eq!(registry.take(w), Some(entry(0, 2)));
        assert!(!registry.contains(w));
        assert!(registry.is_handled(w));
        assert!(!registry.mark_handled(w));
    }

    #[test]
    fn slot_changes_shift_recorded_positions() {
        let mut registry = MovedRegistry::new();
        registry.record(WindowId::new(1), entry(0, 2));
        registry.record(WindowId::new(2), entry(1, 3));

        registry.apply_slot_change(SlotChange::Removed(SlotIndex::new(1)));

        assert_eq!(registry.get(WindowId::new(1)), Some(&entry(0, 1)));
        assert_eq!(registry.get(WindowId::new(2)), Some(&entry(1, 2)));
    }

    #[test]
    fn forget_and_clear_leave_nothing_behind() {
        let mut registry = MovedRegistry::new();
        registry.record(WindowId::new(1), entry(0, 1));
        registry.mark_handled(WindowId::new(2));

        registry.forget(WindowId::new(1));
        assert!(!registry.is_handled(WindowId::new(1)));
        assert_eq!(registry.len(), 0);
        assert!(!registry.is_empty());

        registry.clear();
        assert!(registry.is_empty());
    }
}
