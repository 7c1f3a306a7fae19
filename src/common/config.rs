use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};
use strum::{Display, EnumString};

use super::collections::HashSet;
use crate::model::matcher::{MatcherEntry, MatcherParseError};

const MAX_DELAY: Duration = Duration::from_secs(10);

pub fn config_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("isle")
        .join("config.toml")
}

/// Whether empty-slot searches only look at windows on the same output as the
/// window being placed.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SlotScopeMode {
    #[default]
    PerOutput,
    Global,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// How long a freshly mapped window is left alone before it is placed.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "settle_delay_ms", default = "default_settle_delay")]
    pub settle_delay: Duration,
    /// Delay after a background placement before focus is re-affirmed on the
    /// slot the user was looking at.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "focus_grace_ms", default = "default_focus_grace")]
    pub focus_grace: Duration,
    /// Interval between attempts while the owning application is unknown.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "app_retry_delay_ms", default = "default_app_retry_delay")]
    pub app_retry_delay: Duration,
    /// `0` retries until the window goes away.
    #[serde(default = "default_max_app_retries")]
    pub max_app_retries: u32,
    #[serde(default)]
    pub slot_scope: SlotScopeMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            settle_delay: default_settle_delay(),
            focus_grace: default_focus_grace(),
            app_retry_delay: default_app_retry_delay(),
            max_app_retries: default_max_app_retries(),
            slot_scope: SlotScopeMode::default(),
        }
    }
}

/// Behaviour flags owned by the host environment rather than by us.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(deny_unknown_fields)]
pub struct HostPolicy {
    /// The host removes empty slots on its own; we must not race it.
    #[serde(default = "no")]
    pub dynamic_workspaces: bool,
    #[serde(default = "yes")]
    pub focus_new_slot: bool,
    #[serde(default = "no")]
    pub workspaces_only_on_primary: bool,
}

impl Default for HostPolicy {
    fn default() -> Self {
        Self {
            dynamic_workspaces: false,
            focus_new_slot: true,
            workspaces_only_on_primary: false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Matcher strings of the form `pattern[:flag,flag]`.
    #[serde(default)]
    pub apps: Vec<String>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub policy: HostPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration source is unavailable")]
    Unavailable,
    #[error("configuration is malformed: {0}")]
    Malformed(String),
}

/// Where the engine gets its matcher list and policy flags from.
///
/// Implementations are read on `enable` and again every time a
/// configuration change is delivered.
pub trait ConfigSource {
    fn matcher_strings(&self) -> Result<Vec<String>, ConfigError>;
    fn policy(&self) -> HostPolicy;
    fn settings(&self) -> Settings;
}

impl ConfigSource for Config {
    fn matcher_strings(&self) -> Result<Vec<String>, ConfigError> { Ok(self.apps.clone()) }

    fn policy(&self) -> HostPolicy { self.policy }

    fn settings(&self) -> Settings { self.settings.clone() }
}

/// A config handle that can be updated from another thread (the file
/// watcher) while the engine reads it.
#[derive(Clone, Debug, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<Option<Config>>>,
}

impl SharedConfig {
    pub fn new(config: Config) -> Self { Self { inner: Arc::new(RwLock::new(Some(config))) } }

    pub fn unavailable() -> Self { Self::default() }

    pub fn replace(&self, config: Config) { *self.inner.write() = Some(config); }

    pub fn clear(&self) { *self.inner.write() = None; }

    pub fn update(&self, f: impl FnOnce(&mut Config)) {
        if let Some(config) = self.inner.write().as_mut() {
            f(config);
        }
    }

    pub fn snapshot(&self) -> Option<Config> { self.inner.read().clone() }
}

impl ConfigSource for SharedConfig {
    fn matcher_strings(&self) -> Result<Vec<String>, ConfigError> {
        self.inner.read().as_ref().map(|c| c.apps.clone()).ok_or(ConfigError::Unavailable)
    }

    fn policy(&self) -> HostPolicy {
        self.inner.read().as_ref().map(|c| c.policy).unwrap_or_default()
    }

    fn settings(&self) -> Settings {
        self.inner.read().as_ref().map(|c| c.settings.clone()).unwrap_or_default()
    }
}

impl Settings {
    pub fn retry_limit(&self) -> Option<u32> {
        (self.max_app_retries > 0).then_some(self.max_app_retries)
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for (name, value) in [
            ("settle_delay_ms", self.settle_delay),
            ("focus_grace_ms", self.focus_grace),
            ("app_retry_delay_ms", self.app_retry_delay),
        ] {
            if value > MAX_DELAY {
                issues.push(format!(
                    "{name} should not exceed {}ms, got {}ms",
                    MAX_DELAY.as_millis(),
                    value.as_millis()
                ));
            }
        }

        if self.app_retry_delay.is_zero() {
            issues.push("app_retry_delay_ms must be positive".to_string());
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if self.settle_delay > MAX_DELAY {
            self.settle_delay = default_settle_delay();
            fixes += 1;
        }
        if self.focus_grace > MAX_DELAY {
            self.focus_grace = default_focus_grace();
            fixes += 1;
        }
        if self.app_retry_delay.is_zero() || self.app_retry_delay > MAX_DELAY {
            self.app_retry_delay = default_app_retry_delay();
            fixes += 1;
        }

        fixes
    }
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&buf).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn default() -> Config {
        Self::parse(include_str!("../../isle.default.toml")).unwrap_or_else(|_| Config {
            apps: Vec::new(),
            settings: Settings::default(),
            policy: HostPolicy::default(),
        })
    }

    pub fn default_toml() -> &'static str { include_str!("../../isle.default.toml") }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating config directory {}", parent.display()))?;
        }
        let buf = toml::to_string_pretty(self).context("serializing config")?;
        std::fs::write(path, buf).with_context(|| format!("writing config file {}", path.display()))
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let mut seen = HashSet::default();

        for (index, raw) in self.apps.iter().enumerate() {
            match MatcherEntry::parse(raw) {
                Ok(parsed) => {
                    for flag in &parsed.unknown_flags {
                        issues.push(format!("App entry {index} ('{raw}') has unknown flag '{flag}'"));
                    }
                    if !seen.insert(parsed.entry.key()) {
                        issues.push(format!(
                            "Duplicate app pattern '{}' in entry {index}",
                            parsed.entry.pattern
                        ));
                    }
                }
                Err(MatcherParseError::EmptyPattern) => {
                    issues.push(format!("App entry {index} ('{raw}') has an empty pattern"));
                }
            }
        }

        issues.extend(self.settings.validate());
        issues
    }

    /// Repairs what can be repaired without guessing at user intent and
    /// returns the number of changes made.
    pub fn auto_fix_values(&mut self) -> usize {
        let before = self.apps.len();
        self.apps.retain(|raw| MatcherEntry::parse(raw).is_ok());
        let dropped = before - self.apps.len();

        dropped + self.settings.auto_fix_values()
    }

    fn parse(buf: &str) -> anyhow::Result<Config> {
        let config: Config = toml::from_str(buf)?;
        Ok(config)
    }
}

fn yes() -> bool { true }

fn no() -> bool { false }

fn default_settle_delay() -> Duration { Duration::from_millis(200) }

fn default_focus_grace() -> Duration { Duration::from_millis(300) }

fn default_app_retry_delay() -> Duration { Duration::from_millis(100) }

fn default_max_app_retries() -> u32 { 50 }
