use std::cmp::Ordering;
use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Host-assigned window identity. Stable for the lifetime of the window and
/// never reused while we might still hold it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct WindowId(u64);

impl WindowId {
    pub const fn new(id: u64) -> Self { Self(id) }

    pub const fn get(self) -> u64 { self.0 }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "w{}", self.0) }
}

/// Position of a slot in the host's slot sequence. Positions shift as slots
/// are reordered or removed, so an index is only meaningful at the moment it
/// was read.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct SlotIndex(usize);

impl SlotIndex {
    pub const fn new(index: usize) -> Self { Self(index) }

    pub const fn get(self) -> usize { self.0 }

    pub const fn next(self) -> Self { Self(self.0 + 1) }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "#{}", self.0) }
}

/// A change the engine made to the slot sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotChange {
    Removed(SlotIndex),
    Reordered { from: SlotIndex, to: SlotIndex },
}

impl SlotChange {
    /// Where the slot that was at `slot` sits after this change, or `None`
    /// if it was the one removed.
    pub fn apply(self, slot: SlotIndex) -> Option<SlotIndex> {
        let s = slot.get();
        match self {
            SlotChange::Removed(removed) => match s.cmp(&removed.get()) {
                Ordering::Less => Some(slot),
                Ordering::Equal => None,
                Ordering::Greater => Some(SlotIndex::new(s - 1)),
            },
            SlotChange::Reordered { from, to } => {
                let (from, to) = (from.get(), to.get());
                let s = if s == from {
                    to
                } else if from < to && (from + 1..=to).contains(&s) {
                    s - 1
                } else if to < from && (to..from).contains(&s) {
                    s + 1
                } else {
                    s
                };
                Some(SlotIndex::new(s))
            }
        }
    }
}

/// A physical output (monitor).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(transparent)]
pub struct OutputId(u32);

impl OutputId {
    pub const fn new(id: u32) -> Self { Self(id) }

    pub const fn get(self) -> u32 { self.0 }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "output{}", self.0) }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WindowKind {
    #[default]
    Normal,
    Dialog,
    ModalDialog,
    Utility,
    Splash,
    Menu,
    Tooltip,
    Notification,
    OverrideRedirect,
    Other,
}

bitflags! {
    #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[serde(transparent)]
    pub struct WindowFlags: u8 {
        /// Hidden from the task switcher.
        const SKIP_TASKBAR = 1 << 0;
        /// Pinned so it shows on every slot.
        const ON_ALL_SLOTS = 1 << 1;
        const MINIMIZED = 1 << 2;
    }
}

/// What the host currently knows about a window.
///
/// Fields other than `id` may change between two reads; right after a window
/// is mapped `app_id` in particular is often still missing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub id: WindowId,
    #[serde(default)]
    pub kind: WindowKind,
    #[serde(default)]
    pub transient_for: Option<WindowId>,
    #[serde(default)]
    pub flags: WindowFlags,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub wm_class: Option<String>,
    #[serde(default)]
    pub title: String,
    /// `None` for windows pinned to all slots.
    #[serde(default)]
    pub slot: Option<SlotIndex>,
    #[serde(default)]
    pub output: OutputId,
}

impl WindowInfo {
    pub fn is_on_all_slots(&self) -> bool { self.flags.contains(WindowFlags::ON_ALL_SLOTS) }

    pub fn skips_taskbar(&self) -> bool { self.flags.contains(WindowFlags::SKIP_TASKBAR) }

    pub fn is_minimized(&self) -> bool { self.flags.contains(WindowFlags::MINIMIZED) }

    /// The best available application identity: the resolved app id, or the
    /// window class when the app id is unknown.
    pub fn app_key(&self) -> Option<&str> {
        self.app_id.as_deref().or(self.wm_class.as_deref()).filter(|s| !s.is_empty())
    }

    pub fn same_app(&self, other: &WindowInfo) -> bool {
        match (self.app_key(), other.app_key()) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        }
    }

    /// Every identity string a matcher pattern may be compared against.
    pub fn identity_fields(&self) -> impl Iterator<Item = &str> + '_ {
        self.app_id
            .as_deref()
            .into_iter()
            .chain(self.wm_class.as_deref())
            .chain(Some(self.title.as_str()))
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> WindowInfo {
        WindowInfo {
            id: WindowId::new(1),
            kind: WindowKind::Normal,
            transient_for: None,
            flags: WindowFlags::empty(),
            app_id: None,
            wm_class: Some("Gedit".into()),
            title: String::new(),
            slot: Some(SlotIndex::new(0)),
            output: OutputId::new(0),
        }
    }

    #[test]
    fn slot_change_tracks_slots_across_removal_and_reorder() {
        let at = SlotIndex::new;
        let removed = SlotChange::Removed(at(1));
        assert_eq!(removed.apply(at(0)), Some(at(0)));
        assert_eq!(removed.apply(at(1)), None);
        assert_eq!(removed.apply(at(3)), Some(at(2)));

        let up = SlotChange::Reordered { from: at(3), to: at(1) };
        assert_eq!(
            (0..4).map(|i| up.apply(at(i))).collect::<Vec<_>>(),
            vec![Some(at(0)), Some(at(2)), Some(at(3)), Some(at(1))]
        );

        let down = SlotChange::Reordered { from: at(0), to: at(2) };
        assert_eq!(
            (0..4).map(|i| down.apply(at(i))).collect::<Vec<_>>(),
            vec![Some(at(2)), Some(at(0)), Some(at(1)), Some(at(3))]
        );
    }

    #[test]
    fn app_key_falls_back_to_wm_class() {
        let mut a = info();
        assert_eq!(a.app_key(), Some("Gedit"));
        a.app_id = Some("org.gnome.gedit".into());
        assert_eq!(a.app_key(), Some("org.gnome.gedit"));
    }

    #[test]
    fn windows_without_identity_are_never_the_same_app() {
        let mut a = info();
        let mut b = info();
        a.wm_class = None;
        b.wm_class = None;
        assert!(!a.same_app(&b));
    }

    #[test]
    fn identity_fields_skip_empty_values() {
        let a = info();
        assert_eq!(a.identity_fields().collect::<Vec<_>>(), vec!["Gedit"]);
    }

    #[test]
    fn flags_deserialize_from_names() {
        let flags: WindowFlags = ron::from_str(r#""SKIP_TASKBAR | ON_ALL_SLOTS""#).unwrap();
        assert!(flags.contains(WindowFlags::SKIP_TASKBAR));
        assert!(flags.contains(WindowFlags::ON_ALL_SLOTS));
        assert!(!flags.contains(WindowFlags::MINIMIZED));
    }
}
