use super::Placer;
use crate::common::config::ConfigSource;
use crate::model::SlotIndex;
use crate::model::server::{SlotData, WindowData};
use crate::sys::host::Host;

impl<H: Host, C: ConfigSource> Placer<H, C> {
    /// The slots as the host currently has them, annotated with what we moved.
    pub fn snapshot(&self) -> Vec<SlotData> {
        let active = self.host.active_slot();
        (0..self.host.slot_count())
            .map(SlotIndex::new)
            .map(|slot| {
                let windows: Vec<WindowData> = self
                    .host
                    .slot_windows(slot)
                    .into_iter()
                    .filter_map(|id| self.host.window(id))
                    .map(|info| {
                        let moved_from = self.moved.get(info.id).map(|entry| entry.origin);
                        WindowData::from_info(&info, moved_from)
                    })
                    .collect();
                SlotData {
                    index: slot.get(),
                    is_active: slot == active,
                    window_count: windows.len(),
                    windows,
                }
            })
            .collect()
    }
}
