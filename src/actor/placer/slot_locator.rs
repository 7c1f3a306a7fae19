use tracing::debug;

use crate::common::config::SlotScopeMode;
use crate::model::{OutputId, SlotIndex, WindowId, WindowInfo};
use crate::sys::host::{Host, HostError};

/// Which windows count when deciding whether a slot is occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotScope {
    Global,
    Output(OutputId),
}

impl SlotScope {
    pub fn for_window(mode: SlotScopeMode, window: &WindowInfo) -> Self {
        match mode {
            SlotScopeMode::Global => SlotScope::Global,
            SlotScopeMode::PerOutput => SlotScope::Output(window.output),
        }
    }

    /// Pinned windows are on every slot and never occupy one.
    pub fn contains(&self, window: &WindowInfo) -> bool {
        if window.is_on_all_slots() {
            return false;
        }
        match self {
            SlotScope::Global => true,
            SlotScope::Output(output) => window.output == *output,
        }
    }
}

pub struct SlotLocator<'a, H: Host> {
    host: &'a H,
}

impl<'a, H: Host> SlotLocator<'a, H> {
    pub fn new(host: &'a H) -> Self { Self { host } }

    /// Windows on `slot` that count as occupants within `scope`.
    pub fn occupants(
        &self,
        slot: SlotIndex,
        scope: SlotScope,
        exclude: Option<WindowId>,
    ) -> impl Iterator<Item = WindowInfo> + '_ {
        self.host
            .slot_windows(slot)
            .into_iter()
            .filter(move |id| Some(*id) != exclude)
            .filter_map(move |id| self.host.window(id))
            .filter(move |info| scope.contains(info))
    }

    pub fn is_empty(&self, slot: SlotIndex, scope: SlotScope, exclude: Option<WindowId>) -> bool {
        self.occupants(slot, scope, exclude).next().is_none()
    }

    /// First empty slot, scanning upwards from index 0.
    pub fn find_empty(&self, scope: SlotScope, exclude: Option<WindowId>) -> Option<SlotIndex> {
        (0..self.host.slot_count())
            .map(SlotIndex::new)
            .find(|slot| self.is_empty(*slot, scope, exclude))
    }

    /// Nearest occupied slot, scanning strictly downwards from `origin`
    /// first and strictly upwards after that.
    pub fn nearest_occupied(
        &self,
        origin: SlotIndex,
        scope: SlotScope,
        exclude: Option<WindowId>,
    ) -> Option<SlotIndex> {
        let below = (0..origin.get()).rev();
        let above = origin.get() + 1..self.host.slot_count();
        below
            .chain(above)
            .map(SlotIndex::new)
            .find(|slot| !self.is_empty(*slot, scope, exclude))
    }
}

/// Appends a new slot. This is the only way the engine creates slots.
pub fn create_slot<H: Host>(host: &mut H) -> Result<SlotIndex, HostError> {
    let slot = host.append_slot()?;
    debug!(%slot, "appended slot");
    Ok(slot)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{WindowFlags, WindowKind};
    use crate::sys::virtual_host::VirtualHost;

    fn window(id: u64, slot: usize, output: u32) -> WindowInfo {
        WindowInfo {
            id: WindowId::new(id),
            kind: WindowKind::Normal,
            transient_for: None,
            flags: WindowFlags::empty(),
            app_id: Some("app".into()),
            wm_class: None,
            title: String::new(),
            slot: Some(SlotIndex::new(slot)),
            output: OutputId::new(output),
        }
    }

    fn host() -> VirtualHost {
        // #0: w1 (output 0), #1: w2 (output 1), #2: pinned only, #3: w3 (output 0)
        let mut host = VirtualHost::new(4);
        host.insert_window(window(1, 0, 0));
        host.insert_window(window(2, 1, 1));
        let mut pinned = window(9, 2, 0);
        pinned.flags = WindowFlags::ON_ALL_SLOTS;
        host.insert_window(pinned);
        host.insert_window(window(3, 3, 0));
        host
    }

    const OUT0: SlotScope = SlotScope::Output(OutputId::new(0));

    #[test]
    fn emptiness_respects_scope_pins_and_exclusion() {
        let host = host();
        let locator = SlotLocator::new(&host);

        assert!(locator.is_empty(SlotIndex::new(1), OUT0, None));
        assert!(!locator.is_empty(SlotIndex::new(1), SlotScope::Global, None));
        assert!(locator.is_empty(SlotIndex::new(2), SlotScope::Global, None));
        assert!(locator.is_empty(SlotIndex::new(3), OUT0, Some(WindowId::new(3))));
        assert!(locator.is_empty(SlotIndex::new(7), SlotScope::Global, None));
    }

    #[test]
    fn find_empty_scans_upwards() {
        let host = host();
        let locator = SlotLocator::new(&host);

        assert_eq!(locator.find_empty(OUT0, None), Some(SlotIndex::new(1)));
        assert_eq!(locator.find_empty(SlotScope::Global, None), Some(SlotIndex::new(2)));
        assert_eq!(
            locator.find_empty(SlotScope::Global, Some(WindowId::new(1))),
            Some(SlotIndex::new(0))
        );
    }

    #[test]
    fn find_empty_reports_none_when_full() {
        let mut host = VirtualHost::new(2);
        host.insert_window(window(1, 0, 0));
        host.insert_window(window(2, 1, 0));
        assert_eq!(SlotLocator::new(&host).find_empty(SlotScope::Global, None), None);

        assert_eq!(create_slot(&mut host), Ok(SlotIndex::new(2)));
        assert_eq!(
            SlotLocator::new(&host).find_empty(SlotScope::Global, None),
            Some(SlotIndex::new(2))
        );
    }

    #[test]
    fn nearest_occupied_looks_down_before_up() {
        let host = host();
        let locator = SlotLocator::new(&host);

        assert_eq!(
            locator.nearest_occupied(SlotIndex::new(2), SlotScope::Global, None),
            Some(SlotIndex::new(1))
        );
        assert_eq!(
            locator.nearest_occupied(SlotIndex::new(2), OUT0, None),
            Some(SlotIndex::new(0))
        );
        assert_eq!(
            locator.nearest_occupied(SlotIndex::new(0), OUT0, None),
            Some(SlotIndex::new(3))
        );
        assert_eq!(
            locator.nearest_occupied(SlotIndex::new(3), OUT0, Some(WindowId::new(1))),
            None
        );
    }
}
