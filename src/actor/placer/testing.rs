use std::time::Duration;

use super::{Event, Placer};
use crate::common::config::{Config, SharedConfig};
use crate::model::{OutputId, SlotIndex, WindowFlags, WindowId, WindowInfo, WindowKind};
use crate::sys::host::Host;
use crate::sys::virtual_host::{HostOp, VirtualHost};

pub fn w(id: u64) -> WindowId { WindowId::new(id) }

pub fn slot(index: usize) -> SlotIndex { SlotIndex::new(index) }

/// A normal window with a resolved application id.
pub fn window(id: u64, slot: usize, app: &str) -> WindowInfo {
    WindowInfo {
        id: WindowId::new(id),
        kind: WindowKind::Normal,
        transient_for: None,
        flags: WindowFlags::empty(),
        app_id: Some(app.to_string()),
        wm_class: None,
        title: String::new(),
        slot: Some(SlotIndex::new(slot)),
        output: OutputId::new(0),
    }
}

pub fn dialog(id: u64, slot: usize, parent: u64) -> WindowInfo {
    WindowInfo {
        kind: WindowKind::ModalDialog,
        transient_for: Some(WindowId::new(parent)),
        flags: WindowFlags::SKIP_TASKBAR,
        app_id: None,
        ..window(id, slot, "")
    }
}

pub fn config(apps: &[&str]) -> Config {
    let mut config = Config::default();
    config.apps = apps.iter().map(|s| s.to_string()).collect();
    config
}

pub struct Harness {
    pub placer: Placer<VirtualHost, SharedConfig>,
    pub config: SharedConfig,
}

impl Harness {
    /// `slots` slots, each holding one window of a distinct filler app
    /// (ids 1..=slots), with the placer enabled.
    pub fn new(slots: usize, apps: &[&str]) -> Self {
        let mut host = VirtualHost::new(slots);
        for i in 0..slots {
            host.insert_window(window(i as u64 + 1, i, &format!("filler{i}")));
        }
        Self::with_host(host, config(apps))
    }

    pub fn with_host(host: VirtualHost, config: Config) -> Self {
        let mut harness = Self::disabled(host, SharedConfig::new(config));
        harness.placer.enable().unwrap();
        harness
    }

    pub fn disabled(host: VirtualHost, config: SharedConfig) -> Self {
        Self {
            placer: Placer::new(host, config.clone()),
            config,
        }
    }

    pub fn host(&self) -> &VirtualHost { self.placer.host() }

    pub fn host_mut(&mut self) -> &mut VirtualHost { self.placer.host_mut() }

    fn deliver(&mut self, event: Option<Event>) {
        if let Some(event) = event {
            self.placer.handle_event(event);
        }
    }

    pub fn map(&mut self, info: WindowInfo) {
        let event = self.host_mut().map_window(info);
        self.deliver(event);
    }

    pub fn remap(&mut self, id: u64) {
        let event = self.host_mut().remap_window(w(id));
        self.deliver(event);
    }

    pub fn destroy(&mut self, id: u64) {
        let event = self.host_mut().destroy_window(w(id));
        self.deliver(event);
    }

    pub fn minimize(&mut self, id: u64) {
        let event = self.host_mut().minimize_window(w(id));
        self.deliver(event);
    }

    pub fn set_apps(&mut self, apps: &[&str]) {
        self.config.update(|config| config.apps = apps.iter().map(|s| s.to_string()).collect());
        let event = self.host().config_changed();
        self.deliver(event);
    }

    pub fn advance_ms(&mut self, ms: u64) { self.placer.advance(Duration::from_millis(ms)); }

    /// Lets the settle delay pass.
    pub fn settle(&mut self) {
        let delay = self.placer.settings().settle_delay;
        self.placer.advance(delay);
    }

    /// Maps a window and lets it settle.
    pub fn open(&mut self, info: WindowInfo) {
        self.map(info);
        self.settle();
    }

    pub fn slot_of(&self, id: u64) -> Option<SlotIndex> { self.host().slot_of(w(id)) }

    pub fn slot_count(&self) -> usize { self.host().slot_count() }

    pub fn take_ops(&mut self) -> Vec<HostOp> { self.host_mut().take_ops() }
}
