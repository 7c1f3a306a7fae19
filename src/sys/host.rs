//! The window system as seen by the engine.

use std::fmt;

use strum::Display;

use crate::model::{OutputId, SlotIndex, WindowId, WindowInfo};

/// Host notifications the engine subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Signal {
    WindowMapped,
    WindowDestroyed,
    WindowMinimized,
    ConfigChanged,
}

impl Signal {
    pub const ALL: [Signal; 4] = [
        Signal::WindowMapped,
        Signal::WindowDestroyed,
        Signal::WindowMinimized,
        Signal::ConfigChanged,
    ];
}

/// A connected signal handler, returned by [`Host::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    pub const fn new(id: u64) -> Self { Self(id) }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "handler{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("window {0} no longer exists")]
    WindowGone(WindowId),
    #[error("slot {0} does not exist")]
    SlotOutOfRange(SlotIndex),
    #[error("refusing to remove the last remaining slot")]
    LastSlot,
    #[error("host rejected the request: {0}")]
    Rejected(String),
}

impl HostError {
    /// The referent disappeared between reading it and acting on it. These
    /// are expected and are not worth more than a trace line.
    pub fn is_stale(&self) -> bool {
        matches!(self, HostError::WindowGone(_) | HostError::SlotOutOfRange(_))
    }
}

/// Query and mutation primitives the engine needs from the window system.
///
/// Every id or index handed in may be stale by the time the host sees it;
/// implementations report that with [`HostError::WindowGone`] or
/// [`HostError::SlotOutOfRange`] rather than panicking.
pub trait Host {
    /// `None` means the window is gone.
    fn window(&self, id: WindowId) -> Option<WindowInfo>;

    /// Never zero.
    fn slot_count(&self) -> usize;

    /// Windows on `slot`, including windows pinned to all slots. Empty for an
    /// out of range slot.
    fn slot_windows(&self, slot: SlotIndex) -> Vec<WindowId>;

    fn active_slot(&self) -> SlotIndex;

    fn primary_output(&self) -> OutputId;

    /// Appends a slot at the end of the sequence and returns its index.
    fn append_slot(&mut self) -> Result<SlotIndex, HostError>;

    /// Moves `slot` so that it ends up at index `to`.
    fn reorder_slot(&mut self, slot: SlotIndex, to: SlotIndex) -> Result<(), HostError>;

    fn remove_slot(&mut self, slot: SlotIndex) -> Result<(), HostError>;

    fn activate_slot(&mut self, slot: SlotIndex) -> Result<(), HostError>;

    fn move_window(&mut self, window: WindowId, slot: SlotIndex) -> Result<(), HostError>;

    fn focus_window(&mut self, window: WindowId) -> Result<(), HostError>;

    fn connect(&mut self, signal: Signal) -> Result<HandlerId, HostError>;

    fn disconnect(&mut self, handler: HandlerId);
}
