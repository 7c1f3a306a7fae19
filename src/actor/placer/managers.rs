use tracing::trace;

use super::scheduler::TimerKey;
use crate::common::collections::HashMap;
use crate::model::WindowId;
use crate::sys::host::{HandlerId, Host};

/// Signal handlers connected while the engine is enabled.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    handles: Vec<HandlerId>,
}

impl SubscriptionManager {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, handle: HandlerId) { self.handles.push(handle); }

    /// Disconnects every handler. Safe to call with nothing connected.
    pub fn disconnect_all<H: Host>(&mut self, host: &mut H) {
        for handle in self.handles.drain(..) {
            trace!(%handle, "disconnecting");
            host.disconnect(handle);
        }
    }

    pub fn len(&self) -> usize { self.handles.len() }

    pub fn is_empty(&self) -> bool { self.handles.is_empty() }
}

/// The outstanding placement timer of each window, at most one per window.
#[derive(Debug, Default)]
pub struct PendingManager {
    by_window: HashMap<WindowId, TimerKey>,
}

impl PendingManager {
    pub fn new() -> Self { Self::default() }

    /// Returns the key this one replaced, which the caller must cancel.
    pub fn insert(&mut self, window: WindowId, key: TimerKey) -> Option<TimerKey> {
        self.by_window.insert(window, key)
    }

    pub fn take(&mut self, window: WindowId) -> Option<TimerKey> { self.by_window.remove(&window) }

    /// Forgets the window's timer only if it is still `key`; a fired timer
    /// must not drop a newer one scheduled in its place.
    pub fn remove_if(&mut self, window: WindowId, key: TimerKey) -> bool {
        if self.by_window.get(&window) == Some(&key) {
            self.by_window.remove(&window);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, window: WindowId) -> bool { self.by_window.contains_key(&window) }

    pub fn clear(&mut self) { self.by_window.clear(); }

    pub fn len(&self) -> usize { self.by_window.len() }

    pub fn is_empty(&self) -> bool { self.by_window.is_empty() }
}
