//! Scripted host activity for replaying against the engine.
//!
//! A scenario describes an initial set of slots and windows, the
//! configuration to run with, and a sequence of steps. Scenarios are written
//! in RON.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::window::{OutputId, SlotIndex, WindowFlags, WindowId, WindowInfo, WindowKind};
use crate::common::config::{Config, HostPolicy};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default = "Config::default")]
    pub config: Config,
    #[serde(default = "one")]
    pub slots: usize,
    #[serde(default)]
    pub active_slot: usize,
    #[serde(default)]
    pub primary_output: OutputId,
    /// Windows that already exist before the engine is enabled.
    #[serde(default)]
    pub windows: Vec<WindowSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WindowSpec {
    pub id: WindowId,
    #[serde(default)]
    pub slot: Option<SlotIndex>,
    #[serde(default)]
    pub kind: WindowKind,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub wm_class: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub transient_for: Option<WindowId>,
    #[serde(default)]
    pub flags: WindowFlags,
    #[serde(default)]
    pub output: OutputId,
}

impl WindowSpec {
    pub fn to_info(&self) -> WindowInfo {
        WindowInfo {
            id: self.id,
            kind: self.kind,
            transient_for: self.transient_for,
            flags: self.flags,
            app_id: self.app_id.clone(),
            wm_class: self.wm_class.clone(),
            title: self.title.clone(),
            slot: self.slot,
            output: self.output,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Step {
    Map(WindowSpec),
    Destroy(WindowId),
    Minimize(WindowId),
    /// Let the given number of milliseconds pass.
    Wait(u64),
    ResolveApp { window: WindowId, app_id: String },
    SetApps(Vec<String>),
    SetPolicy(HostPolicy),
    Disable,
    Enable,
}

impl Scenario {
    pub fn parse(buf: &str) -> anyhow::Result<Scenario> {
        ron::from_str(buf).context("parsing scenario")
    }

    pub fn read(path: &Path) -> anyhow::Result<Scenario> {
        let buf = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::parse(&buf)
    }
}

fn one() -> usize { 1 }
