use tracing::{debug, info, trace};

use super::{Action, Placer};
use super::slot_locator::{SlotLocator, SlotScope};
use crate::common::config::{ConfigSource, SlotScopeMode};
use crate::model::{SlotChange, WindowId};
use crate::sys::host::{Host, HostError};

impl<H: Host, C: ConfigSource> Placer<H, C> {
    /// Forgets a window we moved and collects the slot it leaves behind.
    ///
    /// The vacated slot is moved up next to the nearest occupied slot below
    /// it, or removed when the nearest occupied slot is above it or there is
    /// none. The last remaining slot is never removed.
    pub(super) fn release_window(&mut self, window: WindowId) -> Result<(), HostError> {
        let Some(entry) = self.moved.take(window) else {
            trace!(%window, "window was not moved by us");
            return Ok(());
        };

        // A destroyed window is usually already gone from the host.
        let info = self.host.window(window);
        let vacated = info.as_ref().and_then(|info| info.slot).unwrap_or(entry.placed);
        let output = info.as_ref().map_or(entry.output, |info| info.output);
        let scope = match self.settings.slot_scope {
            SlotScopeMode::Global => SlotScope::Global,
            SlotScopeMode::PerOutput => SlotScope::Output(output),
        };

        let count = self.host.slot_count();
        if vacated.get() >= count {
            trace!(%window, slot = %vacated, "vacated slot no longer exists");
            return Ok(());
        }
        let locator = SlotLocator::new(&self.host);
        if !locator.is_empty(vacated, scope, Some(window)) {
            trace!(%window, slot = %vacated, "vacated slot still in use");
            return Ok(());
        }
        if self.source.policy().dynamic_workspaces {
            debug!(slot = %vacated, "leaving empty slot to the host");
            return Ok(());
        }

        match locator.nearest_occupied(vacated, scope, Some(window)) {
            Some(lower) if lower < vacated => {
                let to = lower.next();
                if to != vacated {
                    self.host.reorder_slot(vacated, to)?;
                    self.slots_changed(SlotChange::Reordered { from: vacated, to });
                    info!(slot = %vacated, %to, "moved empty slot next to occupied slot");
                }
            }
            Some(_) => {
                self.host.remove_slot(vacated)?;
                self.slots_changed(SlotChange::Removed(vacated));
                info!(slot = %vacated, "removed empty slot");
            }
            None if count > 1 => {
                self.host.remove_slot(vacated)?;
                self.slots_changed(SlotChange::Removed(vacated));
                info!(slot = %vacated, "removed empty slot");
            }
            None => debug!(slot = %vacated, "keeping the last slot"),
        }
        Ok(())
    }

    /// Re-targets everything that remembers a slot by position. A focus
    /// restore aimed at a removed slot is dropped.
    fn slots_changed(&mut self, change: SlotChange) {
        self.moved.apply_slot_change(change);
        self.scheduler.retain(|action| match action {
            Action::RestoreFocus { slot } => match change.apply(*slot) {
                Some(moved) => {
                    *slot = moved;
                    true
                }
                None => false,
            },
            Action::Place { .. } => true,
        });
    }
}
