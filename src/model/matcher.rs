//! The set of applications that get a slot of their own.
//!
//! Entries come from the configuration as `pattern[:flag,flag]` strings. A
//! pattern matches a window when it is a case-insensitive substring of any of
//! the window's identity fields (app id, window class, title). Identity
//! fields differ wildly between toolkits, so matching is deliberately loose.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::window::WindowInfo;
use crate::common::collections::HashMap;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MatcherEntry {
    pub pattern: String,
    /// Place the window without switching away from the current slot.
    #[serde(default)]
    pub background: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMatcher {
    pub entry: MatcherEntry,
    pub unknown_flags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MatcherParseError {
    #[error("matcher pattern is empty")]
    EmptyPattern,
}

impl MatcherEntry {
    pub fn new(pattern: impl Into<String>, background: bool) -> Self {
        Self { pattern: pattern.into(), background }
    }

    pub fn parse(raw: &str) -> Result<ParsedMatcher, MatcherParseError> {
        let (pattern, flags) = match raw.rsplit_once(':') {
            Some((pattern, flags)) => (pattern, flags),
            None => (raw, ""),
        };
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(MatcherParseError::EmptyPattern);
        }

        let mut background = false;
        let mut unknown_flags = Vec::new();
        for flag in flags.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            match flag.to_ascii_lowercase().as_str() {
                "background" | "bg" => background = true,
                _ => unknown_flags.push(flag.to_string()),
            }
        }

        Ok(ParsedMatcher {
            entry: MatcherEntry::new(pattern, background),
            unknown_flags,
        })
    }

    /// Registry key; patterns differing only in case are the same entry.
    pub fn key(&self) -> String { self.pattern.to_lowercase() }

    pub fn matches(&self, window: &WindowInfo) -> bool {
        let needle = self.key();
        window.identity_fields().any(|field| field.to_lowercase().contains(&needle))
    }
}

#[derive(Debug, Default, Clone)]
pub struct MatcherRegistry {
    entries: HashMap<String, MatcherEntry>,
}

impl MatcherRegistry {
    pub fn new() -> Self { Self::default() }

    /// Replaces the whole registry with the given matcher strings. Returns the
    /// number of entries kept.
    pub fn rebuild<I, S>(&mut self, raw: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.entries.clear();
        for raw in raw {
            let raw = raw.as_ref();
            match MatcherEntry::parse(raw) {
                Ok(parsed) => {
                    if !parsed.unknown_flags.is_empty() {
                        warn!(entry = raw, flags = ?parsed.unknown_flags, "ignoring unknown matcher flags");
                    }
                    let entry = parsed.entry;
                    if let Some(previous) = self.entries.insert(entry.key(), entry) {
                        debug!(pattern = %previous.pattern, "duplicate matcher replaced");
                    }
                }
                Err(err) => warn!(entry = raw, %err, "skipping matcher"),
            }
        }
        self.entries.len()
    }

    pub fn clear(&mut self) { self.entries.clear(); }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn get(&self, pattern: &str) -> Option<&MatcherEntry> {
        self.entries.get(&pattern.to_lowercase())
    }

    /// The entry matching `window`. When several match, the longest pattern
    /// wins, then the lexicographically smallest, so the answer does not
    /// depend on hash order.
    pub fn lookup(&self, window: &WindowInfo) -> Option<&MatcherEntry> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.matches(window))
            .max_by(|(ka, _), (kb, _)| ka.len().cmp(&kb.len()).then_with(|| kb.cmp(ka)))
            .map(|(_, entry)| entry)
    }
}
