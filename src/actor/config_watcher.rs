//! Reloads the configuration file when it changes on disk.
//!
//! The watcher observes the file's directory rather than the file itself, as
//! editors commonly replace files by renaming a temporary over them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use tracing::{debug, info, warn};

use crate::actor::placer;
use crate::common::config::{Config, ConfigError, SharedConfig};

const DEBOUNCE: Duration = Duration::from_millis(250);

/// Reads, validates and repairs a configuration file.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::Unavailable);
    }
    let mut config =
        Config::read(path).map_err(|err| ConfigError::Malformed(format!("{err:#}")))?;

    let issues = config.validate();
    if !issues.is_empty() {
        for issue in &issues {
            warn!(path = %path.display(), "{issue}");
        }
        let fixed = config.auto_fix_values();
        if fixed > 0 {
            info!(fixed, "corrected invalid configuration values");
        }
    }
    Ok(config)
}

/// Keeps watching for as long as it is alive.
pub struct ConfigWatcher {
    path: PathBuf,
    _debouncer: Debouncer<RecommendedWatcher>,
}

impl ConfigWatcher {
    pub fn spawn(
        path: PathBuf,
        config: SharedConfig,
        events_tx: placer::Sender,
    ) -> anyhow::Result<ConfigWatcher> {
        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();
        let file_name = path.file_name().map(ToOwned::to_owned);
        let reload_path = path.clone();

        let mut debouncer = new_debouncer(DEBOUNCE, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    let touched = events
                        .iter()
                        .any(|event| event.path.file_name() == file_name.as_deref());
                    if touched {
                        reload(&reload_path, &config, &events_tx);
                    }
                }
                Err(err) => warn!(?err, "config watcher error"),
            }
        })
        .context("creating config watcher")?;

        debouncer
            .watcher()
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("watching {}", dir.display()))?;
        debug!(path = %path.display(), "watching config file");

        Ok(ConfigWatcher { path, _debouncer: debouncer })
    }

    pub fn path(&self) -> &Path { &self.path }
}

/// Replaces the shared configuration and tells the placer. A file that
/// cannot be read leaves the previous configuration in place.
pub fn reload(path: &Path, config: &SharedConfig, events_tx: &placer::Sender) {
    match load(path) {
        Ok(new) => {
            config.replace(new);
            info!(path = %path.display(), "configuration reloaded");
            events_tx.send(placer::Event::ConfigChanged);
        }
        Err(err) => warn!(path = %path.display(), %err, "keeping previous configuration"),
    }
}
