use std::time::Duration;

use tracing::{debug, info, trace};

use super::classifier::{Classification, classify};
use super::slot_locator::{SlotLocator, SlotScope, create_slot};
use super::{Action, Placer};
use crate::common::config::ConfigSource;
use crate::model::{MatcherEntry, MovedEntry, SlotIndex, WindowId, WindowInfo};
use crate::sys::host::{Host, HostError};

/// Lower bound on the retry interval so a retry always lands in a later
/// scheduler pass.
const MIN_RETRY_DELAY: Duration = Duration::from_millis(1);

impl<H: Host, C: ConfigSource> Placer<H, C> {
    /// Schedules a placement, replacing any the window already had.
    pub(super) fn schedule_placement(&mut self, window: WindowId, delay: Duration, attempt: u32) {
        let key = self.scheduler.schedule(delay, Action::Place { window, attempt });
        if let Some(previous) = self.pending.insert(window, key) {
            self.scheduler.cancel(previous);
        }
    }

    /// The deferred half of a mapped event: look at the window again now
    /// that it has settled and act on what it turned out to be.
    pub(super) fn run_placement(&mut self, window: WindowId, attempt: u32) -> Result<(), HostError> {
        let Some(info) = self.host.window(window) else {
            trace!(%window, "window gone before placement");
            return Ok(());
        };
        if self.moved.is_handled(window) {
            trace!(%window, "window already handled");
            return Ok(());
        }

        match classify(&info, &self.matchers) {
            Classification::Ineligible(reason) => {
                trace!(%window, %reason, "window became ineligible");
                self.moved.mark_handled(window);
                Ok(())
            }
            Classification::Transient(parent) => {
                self.moved.mark_handled(window);
                self.follow_parent(&info, parent)
            }
            Classification::Unresolved => {
                if self.settings.retry_limit().is_some_and(|limit| attempt >= limit) {
                    debug!(%window, attempts = attempt, "application never resolved; giving up");
                    self.moved.mark_handled(window);
                    return Ok(());
                }
                trace!(%window, attempt, "application not resolved yet");
                let delay = self.settings.app_retry_delay.max(MIN_RETRY_DELAY);
                self.schedule_placement(window, delay, attempt + 1);
                Ok(())
            }
            Classification::NoMatch => {
                trace!(%window, app = ?info.app_key(), "no matcher for window");
                self.moved.mark_handled(window);
                Ok(())
            }
            Classification::Match(entry) => {
                self.moved.mark_handled(window);
                self.place(&info, &entry)
            }
        }
    }

    /// Moves a matching window onto the first empty slot, appending one if
    /// there is none.
    pub(super) fn place(&mut self, info: &WindowInfo, entry: &MatcherEntry) -> Result<(), HostError> {
        let window = info.id;
        let Some(current) = info.slot else {
            trace!(%window, "window is on all slots");
            return Ok(());
        };
        let policy = self.source.policy();
        let scope = SlotScope::for_window(self.settings.slot_scope, info);
        let locator = SlotLocator::new(&self.host);

        if let Some(sibling) =
            locator.occupants(current, scope, Some(window)).find(|other| other.same_app(info))
        {
            debug!(%window, sibling = %sibling.id, slot = %current, "application already on slot");
            return Ok(());
        }

        if policy.workspaces_only_on_primary && info.output != self.host.primary_output() {
            debug!(%window, output = %info.output, "slots only exist on the primary output");
            return Ok(());
        }

        let origin_active = self.host.active_slot();
        let empty = locator.find_empty(scope, Some(window));
        let target = match empty {
            Some(slot) => slot,
            None => create_slot(&mut self.host)?,
        };
        if target == current {
            debug!(%window, slot = %current, "window already has its slot to itself");
            return Ok(());
        }

        self.host.move_window(window, target)?;
        self.moved.record(window, MovedEntry {
            origin: current,
            placed: target,
            output: info.output,
            moved: true,
        });
        info!(%window, pattern = %entry.pattern, from = %current, to = %target, "moved window");

        if entry.background {
            // The host may follow the moved window; put the user back where
            // they were once things settle.
            self.scheduler
                .schedule(self.settings.focus_grace, Action::RestoreFocus { slot: origin_active });
        } else if policy.focus_new_slot {
            self.host.activate_slot(target)?;
            self.host.focus_window(window)?;
        }
        Ok(())
    }

    /// Moves a transient window to its parent's slot.
    pub(super) fn follow_parent(&mut self, info: &WindowInfo, parent: WindowId) -> Result<(), HostError> {
        let window = info.id;
        let Some(parent_info) = self.host.window(parent) else {
            trace!(%window, %parent, "parent window gone");
            return Ok(());
        };
        let Some(slot) = parent_info.slot else {
            trace!(%window, %parent, "parent is on all slots");
            return Ok(());
        };
        if info.is_on_all_slots() || info.slot == Some(slot) {
            return Ok(());
        }

        self.host.move_window(window, slot)?;
        self.host.activate_slot(slot)?;
        debug!(%window, %parent, %slot, "moved transient window to its parent");
        Ok(())
    }

    pub(super) fn restore_focus(&mut self, slot: SlotIndex) -> Result<(), HostError> {
        if slot.get() >= self.host.slot_count() {
            trace!(%slot, "slot to restore no longer exists");
            return Ok(());
        }
        debug!(%slot, "restoring active slot");
        self.host.activate_slot(slot)
    }
}
