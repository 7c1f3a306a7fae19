use serde::{Deserialize, Serialize};

use super::window::{OutputId, SlotIndex, WindowId, WindowInfo, WindowKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotData {
    pub index: usize,
    pub is_active: bool,
    pub window_count: usize,
    pub windows: Vec<WindowData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowData {
    pub id: WindowId,
    pub kind: WindowKind,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub app_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub wm_class: Option<String>,
    pub title: String,
    pub output: OutputId,
    pub on_all_slots: bool,
    /// Slot the window was moved away from, if we moved it.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub moved_from: Option<SlotIndex>,
}

impl WindowData {
    pub fn from_info(info: &WindowInfo, moved_from: Option<SlotIndex>) -> Self {
        Self {
            id: info.id,
            kind: info.kind,
            app_id: info.app_id.clone(),
            wm_class: info.wm_class.clone(),
            title: info.title.clone(),
            output: info.output,
            on_all_slots: info.is_on_all_slots(),
            moved_from,
        }
    }

    pub fn label(&self) -> String {
        let app = self.app_id.as_deref().or(self.wm_class.as_deref()).unwrap_or("?");
        let mut label = format!("{} {app}", self.id);
        if !self.title.is_empty() {
            label.push_str(&format!(" \"{}\"", self.title));
        }
        if let Some(from) = self.moved_from {
            label.push_str(&format!(" (moved from {from})"));
        }
        label
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::window::WindowFlags;

    #[test]
    fn slot_data_serializes_with_expected_shape() {
        let info = WindowInfo {
            id: WindowId::new(12),
            kind: WindowKind::Normal,
            transient_for: None,
            flags: WindowFlags::empty(),
            app_id: Some("org.gnome.TextEditor".into()),
            wm_class: None,
            title: "notes.txt".into(),
            slot: Some(SlotIndex::new(3)),
            output: OutputId::new(1),
        };
        let data = SlotData {
            index: 3,
            is_active: true,
            window_count: 1,
            windows: vec![WindowData::from_info(&info, Some(SlotIndex::new(0)))],
        };

        let value = serde_json::to_value(&data).expect("serialize SlotData");
        let expected = json!({
            "index": 3,
            "is_active": true,
            "window_count": 1,
            "windows": [{
                "id": 12,
                "kind": "normal",
                "app_id": "org.gnome.TextEditor",
                "title": "notes.txt",
                "output": 1,
                "on_all_slots": false,
                "moved_from": 0,
            }],
        });
        assert_eq!(value, expected);
        assert_eq!(
            data.windows[0].label(),
            "w12 org.gnome.TextEditor \"notes.txt\" (moved from #0)"
        );
    }
}
