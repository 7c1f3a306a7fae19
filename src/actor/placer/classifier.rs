use strum::Display;

use crate::model::{MatcherEntry, MatcherRegistry, WindowId, WindowInfo, WindowKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum IneligibleReason {
    NotNormal,
    OnAllSlots,
    SkipTaskbar,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Ineligible(IneligibleReason),
    /// Follows its parent instead of being placed.
    Transient(WindowId),
    /// The owning application is not known yet; ask again later.
    Unresolved,
    NoMatch,
    Match(MatcherEntry),
}

/// Decides what to do with a window, evaluating in order: transient parent,
/// window kind, pinned to all slots, skip taskbar, unresolved application,
/// matcher lookup.
///
/// Transient windows are routed first regardless of kind, since dialogs are
/// usually not of normal kind and are often hidden from the taskbar.
pub fn classify(window: &WindowInfo, matchers: &MatcherRegistry) -> Classification {
    if let Some(parent) = window.transient_for {
        return Classification::Transient(parent);
    }
    if window.kind != WindowKind::Normal {
        return Classification::Ineligible(IneligibleReason::NotNormal);
    }
    if window.is_on_all_slots() {
        return Classification::Ineligible(IneligibleReason::OnAllSlots);
    }
    if window.skips_taskbar() {
        return Classification::Ineligible(IneligibleReason::SkipTaskbar);
    }
    if window.app_id.is_none() {
        return Classification::Unresolved;
    }
    match matchers.lookup(window) {
        Some(entry) => Classification::Match(entry.clone()),
        None => Classification::NoMatch,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{OutputId, SlotIndex, WindowFlags};

    fn registry() -> MatcherRegistry {
        let mut r = MatcherRegistry::new();
        r.rebuild(["editor.X", "chat:background"]);
        r
    }

    fn window(app_id: Option<&str>) -> WindowInfo {
        WindowInfo {
            id: WindowId::new(1),
            kind: WindowKind::Normal,
            transient_for: None,
            flags: WindowFlags::empty(),
            app_id: app_id.map(str::to_owned),
            wm_class: None,
            title: String::new(),
            slot: Some(SlotIndex::new(0)),
            output: OutputId::new(0),
        }
    }

    #[test]
    fn matching_window() {
        assert_eq!(
            classify(&window(Some("org.Editor.x")), &registry()),
            Classification::Match(MatcherEntry::new("editor.X", false))
        );
        assert_eq!(
            classify(&window(Some("Chat")), &registry()),
            Classification::Match(MatcherEntry::new("chat", true))
        );
        assert_eq!(classify(&window(Some("terminal")), &registry()), Classification::NoMatch);
    }

    #[test]
    fn transient_wins_over_every_other_check() {
        let mut w = window(None);
        w.kind = WindowKind::ModalDialog;
        w.flags = WindowFlags::SKIP_TASKBAR;
        w.transient_for = Some(WindowId::new(7));
        assert_eq!(classify(&w, &registry()), Classification::Transient(WindowId::new(7)));
    }

    #[test]
    fn rejections_in_order() {
        let r = registry();
        let mut w = window(Some("editor.X"));
        w.kind = WindowKind::Utility;
        w.flags = WindowFlags::ON_ALL_SLOTS | WindowFlags::SKIP_TASKBAR;
        assert_eq!(classify(&w, &r), Classification::Ineligible(IneligibleReason::NotNormal));

        w.kind = WindowKind::Normal;
        assert_eq!(classify(&w, &r), Classification::Ineligible(IneligibleReason::OnAllSlots));

        w.flags = WindowFlags::SKIP_TASKBAR;
        assert_eq!(classify(&w, &r), Classification::Ineligible(IneligibleReason::SkipTaskbar));
    }

    #[test]
    fn missing_app_id_is_unresolved_even_if_class_matches() {
        let mut w = window(None);
        w.wm_class = Some("editor.X".into());
        assert_eq!(classify(&w, &registry()), Classification::Unresolved);
    }
}
