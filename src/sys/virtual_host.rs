//! An in-memory window system.
//!
//! Used by the replay driver and by tests. Slot removal and reordering follow
//! what common desktop compositors do: windows on a removed slot are moved to
//! the slot before it (or the one after it when the first slot is removed),
//! and the active slot follows its slot through reorders.

use tracing::trace;

use super::host::{HandlerId, Host, HostError, Signal};
use crate::actor::placer::Event;
use crate::common::collections::{BTreeMap, HashMap, HashSet};
use crate::model::{OutputId, SlotIndex, WindowFlags, WindowId, WindowInfo};

/// A mutation the engine asked the host to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOp {
    AppendSlot(SlotIndex),
    ReorderSlot { slot: SlotIndex, to: SlotIndex },
    RemoveSlot(SlotIndex),
    ActivateSlot(SlotIndex),
    MoveWindow { window: WindowId, slot: SlotIndex },
    FocusWindow(WindowId),
}

type SlotUid = u64;

#[derive(Debug)]
struct WindowRecord {
    info: WindowInfo,
    /// `None` while pinned to all slots.
    home: Option<SlotUid>,
}

#[derive(Debug)]
pub struct VirtualHost {
    slots: Vec<SlotUid>,
    next_slot_uid: SlotUid,
    active: SlotUid,
    primary_output: OutputId,
    windows: BTreeMap<WindowId, WindowRecord>,
    focused: Option<WindowId>,
    handlers: HashMap<HandlerId, Signal>,
    next_handler: u64,
    failing_signals: HashSet<Signal>,
    fail_next_mutation: Option<HostError>,
    ops: Vec<HostOp>,
}

impl Default for VirtualHost {
    fn default() -> Self { Self::new(1) }
}

impl VirtualHost {
    pub fn new(slots: usize) -> Self {
        let slots: Vec<SlotUid> = (0..slots.max(1) as SlotUid).collect();
        Self {
            next_slot_uid: slots.len() as SlotUid,
            active: slots[0],
            slots,
            primary_output: OutputId::default(),
            windows: BTreeMap::new(),
            focused: None,
            handlers: HashMap::default(),
            next_handler: 1,
            failing_signals: HashSet::default(),
            fail_next_mutation: None,
            ops: Vec::new(),
        }
    }

    pub fn with_primary_output(mut self, output: OutputId) -> Self {
        self.primary_output = output;
        self
    }

    pub fn with_active_slot(mut self, slot: SlotIndex) -> Self {
        if let Some(uid) = self.uid(slot) {
            self.active = uid;
        }
        self
    }

    /// Adds a window without emitting anything, as if it existed before the
    /// engine was enabled. A window without a slot lands on the active slot.
    pub fn insert_window(&mut self, mut info: WindowInfo) {
        let home = if info.is_on_all_slots() {
            None
        } else {
            Some(info.slot.and_then(|slot| self.uid(slot)).unwrap_or(self.active))
        };
        info.slot = None;
        self.windows.insert(info.id, WindowRecord { info, home });
    }

    pub fn map_window(&mut self, info: WindowInfo) -> Option<Event> {
        let id = info.id;
        self.insert_window(info);
        self.emit(Signal::WindowMapped, Event::WindowMapped(id))
    }

    /// Emits another mapped notification for a window that already exists.
    pub fn remap_window(&mut self, id: WindowId) -> Option<Event> {
        if !self.windows.contains_key(&id) {
            return None;
        }
        self.emit(Signal::WindowMapped, Event::WindowMapped(id))
    }

    pub fn destroy_window(&mut self, id: WindowId) -> Option<Event> {
        self.windows.remove(&id)?;
        if self.focused == Some(id) {
            self.focused = None;
        }
        self.emit(Signal::WindowDestroyed, Event::WindowDestroyed(id))
    }

    pub fn minimize_window(&mut self, id: WindowId) -> Option<Event> {
        let record = self.windows.get_mut(&id)?;
        record.info.flags.insert(WindowFlags::MINIMIZED);
        self.emit(Signal::WindowMinimized, Event::WindowMinimized(id))
    }

    pub fn set_app_id(&mut self, id: WindowId, app_id: impl Into<String>) -> bool {
        match self.windows.get_mut(&id) {
            Some(record) => {
                record.info.app_id = Some(app_id.into());
                true
            }
            None => false,
        }
    }

    pub fn config_changed(&self) -> Option<Event> {
        self.is_connected(Signal::ConfigChanged).then_some(Event::ConfigChanged)
    }

    pub fn is_connected(&self, signal: Signal) -> bool {
        self.handlers.values().any(|s| *s == signal)
    }

    pub fn connection_count(&self) -> usize { self.handlers.len() }

    /// Makes the next `connect` for `signal` fail.
    pub fn fail_connect(&mut self, signal: Signal) { self.failing_signals.insert(signal); }

    /// Makes the next mutating call fail with `err`.
    pub fn fail_next_mutation(&mut self, err: HostError) { self.fail_next_mutation = Some(err); }

    pub fn ops(&self) -> &[HostOp] { &self.ops }

    pub fn take_ops(&mut self) -> Vec<HostOp> { std::mem::take(&mut self.ops) }

    pub fn focused(&self) -> Option<WindowId> { self.focused }

    pub fn slot_of(&self, id: WindowId) -> Option<SlotIndex> {
        self.windows.get(&id).and_then(|r| r.home).and_then(|uid| self.index(uid))
    }

    /// Windows homed on each slot, pinned windows excluded.
    pub fn layout(&self) -> Vec<Vec<WindowId>> {
        self.slots
            .iter()
            .map(|uid| {
                self.windows
                    .iter()
                    .filter(|(_, r)| r.home == Some(*uid))
                    .map(|(id, _)| *id)
                    .collect()
            })
            .collect()
    }

    fn emit(&self, signal: Signal, event: Event) -> Option<Event> {
        if self.is_connected(signal) {
            Some(event)
        } else {
            trace!(%signal, "no handler connected; dropping notification");
            None
        }
    }

    fn uid(&self, slot: SlotIndex) -> Option<SlotUid> { self.slots.get(slot.get()).copied() }

    fn index(&self, uid: SlotUid) -> Option<SlotIndex> {
        self.slots.iter().position(|s| *s == uid).map(SlotIndex::new)
    }

    fn check_mutation(&mut self) -> Result<(), HostError> {
        match self.fail_next_mutation.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn require_slot(&self, slot: SlotIndex) -> Result<SlotUid, HostError> {
        self.uid(slot).ok_or(HostError::SlotOutOfRange(slot))
    }
}

impl Host for VirtualHost {
    fn window(&self, id: WindowId) -> Option<WindowInfo> {
        let record = self.windows.get(&id)?;
        let mut info = record.info.clone();
        info.slot = record.home.and_then(|uid| self.index(uid));
        Some(info)
    }

    fn slot_count(&self) -> usize { self.slots.len() }

    fn slot_windows(&self, slot: SlotIndex) -> Vec<WindowId> {
        let Some(uid) = self.uid(slot) else {
            return Vec::new();
        };
        self.windows
            .iter()
            .filter(|(_, r)| r.home.is_none_or(|home| home == uid))
            .map(|(id, _)| *id)
            .collect()
    }

    fn active_slot(&self) -> SlotIndex { self.index(self.active).unwrap_or(SlotIndex::new(0)) }

    fn primary_output(&self) -> OutputId { self.primary_output }

    fn append_slot(&mut self) -> Result<SlotIndex, HostError> {
        self.check_mutation()?;
        let uid = self.next_slot_uid;
        self.next_slot_uid += 1;
        self.slots.push(uid);
        let index = SlotIndex::new(self.slots.len() - 1);
        self.ops.push(HostOp::AppendSlot(index));
        Ok(index)
    }

    fn reorder_slot(&mut self, slot: SlotIndex, to: SlotIndex) -> Result<(), HostError> {
        self.check_mutation()?;
        let uid = self.require_slot(slot)?;
        self.require_slot(to)?;
        self.slots.remove(slot.get());
        self.slots.insert(to.get(), uid);
        self.ops.push(HostOp::ReorderSlot { slot, to });
        Ok(())
    }

    fn remove_slot(&mut self, slot: SlotIndex) -> Result<(), HostError> {
        self.check_mutation()?;
        let uid = self.require_slot(slot)?;
        if self.slots.len() <= 1 {
            return Err(HostError::LastSlot);
        }
        let neighbour = if slot.get() == 0 { self.slots[1] } else { self.slots[slot.get() - 1] };
        for record in self.windows.values_mut() {
            if record.home == Some(uid) {
                record.home = Some(neighbour);
            }
        }
        if self.active == uid {
            self.active = neighbour;
        }
        self.slots.remove(slot.get());
        self.ops.push(HostOp::RemoveSlot(slot));
        Ok(())
    }

    fn activate_slot(&mut self, slot: SlotIndex) -> Result<(), HostError> {
        self.check_mutation()?;
        self.active = self.require_slot(slot)?;
        self.ops.push(HostOp::ActivateSlot(slot));
        Ok(())
    }

    fn move_window(&mut self, window: WindowId, slot: SlotIndex) -> Result<(), HostError> {
        self.check_mutation()?;
        let uid = self.require_slot(slot)?;
        let record = self.windows.get_mut(&window).ok_or(HostError::WindowGone(window))?;
        record.home = Some(uid);
        record.info.flags.remove(WindowFlags::ON_ALL_SLOTS);
        self.ops.push(HostOp::MoveWindow { window, slot });
        Ok(())
    }

    fn focus_window(&mut self, window: WindowId) -> Result<(), HostError> {
        self.check_mutation()?;
        if !self.windows.contains_key(&window) {
            return Err(HostError::WindowGone(window));
        }
        self.focused = Some(window);
        self.ops.push(HostOp::FocusWindow(window));
        Ok(())
    }

    fn connect(&mut self, signal: Signal) -> Result<HandlerId, HostError> {
        if self.failing_signals.remove(&signal) {
            return Err(HostError::Rejected(format!("cannot connect {signal}")));
        }
        let id = HandlerId::new(self.next_handler);
        self.next_handler += 1;
        self.handlers.insert(id, signal);
        Ok(id)
    }

    fn disconnect(&mut self, handler: HandlerId) { self.handlers.remove(&handler); }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::WindowKind;

    fn window(id: u64, slot: usize) -> WindowInfo {
        WindowInfo {
            id: WindowId::new(id),
            kind: WindowKind::Normal,
            transient_for: None,
            flags: WindowFlags::empty(),
            app_id: Some(format!("app{id}")),
            wm_class: None,
            title: String::new(),
            slot: Some(SlotIndex::new(slot)),
            output: OutputId::new(0),
        }
    }

    fn w(id: u64) -> WindowId { WindowId::new(id) }

    #[test]
    fn pinned_windows_show_up_on_every_slot() {
        let mut host = VirtualHost::new(2);
        host.insert_window(window(1, 0));
        let mut pinned = window(2, 0);
        pinned.flags = WindowFlags::ON_ALL_SLOTS;
        host.insert_window(pinned);

        assert_eq!(host.slot_windows(SlotIndex::new(0)), vec![w(1), w(2)]);
        assert_eq!(host.slot_windows(SlotIndex::new(1)), vec![w(2)]);
        assert_eq!(host.window(w(2)).unwrap().slot, None);
        assert_eq!(host.layout(), vec![vec![w(1)], vec![]]);
    }

    #[test]
    fn reorder_keeps_active_slot_and_renumbers_windows() {
        let mut host = VirtualHost::new(4).with_active_slot(SlotIndex::new(3));
        host.insert_window(window(1, 3));
        host.insert_window(window(2, 1));

        host.reorder_slot(SlotIndex::new(3), SlotIndex::new(1)).unwrap();

        assert_eq!(host.active_slot(), SlotIndex::new(1));
        assert_eq!(host.slot_of(w(1)), Some(SlotIndex::new(1)));
        assert_eq!(host.slot_of(w(2)), Some(SlotIndex::new(2)));
    }

    #[test]
    fn removing_a_slot_moves_its_windows_to_the_previous_one() {
        let mut host = VirtualHost::new(3).with_active_slot(SlotIndex::new(1));
        host.insert_window(window(1, 1));
        host.insert_window(window(2, 2));

        host.remove_slot(SlotIndex::new(1)).unwrap();
        assert_eq!(host.slot_count(), 2);
        assert_eq!(host.slot_of(w(1)), Some(SlotIndex::new(0)));
        assert_eq!(host.slot_of(w(2)), Some(SlotIndex::new(1)));
        assert_eq!(host.active_slot(), SlotIndex::new(0));

        host.remove_slot(SlotIndex::new(0)).unwrap();
        assert_eq!(host.layout(), vec![vec![w(1), w(2)]]);
        assert_eq!(host.remove_slot(SlotIndex::new(0)), Err(HostError::LastSlot));
    }

    #[test]
    fn notifications_require_a_connected_handler() {
        let mut host = VirtualHost::new(1);
        assert_eq!(host.map_window(window(1, 0)), None);

        let handler = host.connect(Signal::WindowDestroyed).unwrap();
        assert_eq!(host.destroy_window(w(1)), Some(Event::WindowDestroyed(w(1))));

        host.disconnect(handler);
        assert_eq!(host.connection_count(), 0);
        assert_eq!(host.map_window(window(2, 0)), None);
    }

    #[test]
    fn injected_failures_fire_once() {
        let mut host = VirtualHost::new(1);
        host.fail_connect(Signal::WindowMapped);
        assert!(host.connect(Signal::WindowMapped).is_err());
        assert!(host.connect(Signal::WindowMapped).is_ok());

        host.fail_next_mutation(HostError::Rejected("busy".into()));
        assert!(host.append_slot().is_err());
        assert_eq!(host.append_slot(), Ok(SlotIndex::new(1)));
        assert_eq!(host.ops(), &[HostOp::AppendSlot(SlotIndex::new(1))]);
    }

    #[test]
    fn stale_references_are_reported() {
        let mut host = VirtualHost::new(1);
        assert_eq!(
            host.move_window(w(9), SlotIndex::new(0)),
            Err(HostError::WindowGone(w(9)))
        );
        assert_eq!(
            host.activate_slot(SlotIndex::new(4)),
            Err(HostError::SlotOutOfRange(SlotIndex::new(4)))
        );
        assert!(host.slot_windows(SlotIndex::new(4)).is_empty());
    }
}
