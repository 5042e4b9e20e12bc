//! Persisted key-value state
//!
//! The enabled/disabled toggle must survive across save cycles and across
//! invocations (`onsave disable` from another terminal takes effect on the
//! watcher's next cycle), so it lives in a small JSON map next to the config
//! file. The store is injected into the orchestrator as a trait, keeping the
//! core testable without touching the filesystem.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// File holding persisted state, created next to the config file.
pub const STATE_FILENAME: &str = ".onsave-state.json";

/// Key for the process-wide enabled flag. Missing means enabled.
pub const ENABLED_KEY: &str = "enabled";

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Unable to write state file {path}: {source}")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("Unable to serialize state: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value persistence for orchestrator state.
pub trait StateStore {
    fn get_bool(&self, key: &str) -> Option<bool>;

    /// # Errors
    ///
    /// Returns `StateError` if the value cannot be persisted.
    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), StateError>;
}

/// State store persisting a flat map as JSON on disk.
///
/// Reads go back to the file every time so changes made by other onsave
/// processes are picked up on the next save cycle.
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the conventional location next to a config file.
    #[must_use]
    pub fn for_config_dir(dir: &Path) -> Self {
        Self::new(dir.join(STATE_FILENAME))
    }

    fn read_map(&self) -> HashMap<String, bool> {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|contents| serde_json::from_str(&contents).ok())
            .unwrap_or_default()
    }
}

impl StateStore for JsonStateStore {
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.read_map().get(key).copied()
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), StateError> {
        let mut map = self.read_map();
        map.insert(key.to_string(), value);
        let contents = serde_json::to_string_pretty(&map)?;
        std::fs::write(&self.path, contents).map_err(|e| StateError::Io {
            source: e,
            path: self.path.clone(),
        })
    }
}

/// In-memory store for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    values: HashMap<String, bool>,
}

impl StateStore for MemoryStateStore {
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).copied()
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), StateError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonStateStore::for_config_dir(dir.path());

        assert_eq!(store.get_bool(ENABLED_KEY), None);
        store.set_bool(ENABLED_KEY, false).unwrap();
        assert_eq!(store.get_bool(ENABLED_KEY), Some(false));

        // A second store over the same file sees the persisted value
        let other = JsonStateStore::for_config_dir(dir.path());
        assert_eq!(other.get_bool(ENABLED_KEY), Some(false));
    }

    #[test]
    fn test_json_store_tolerates_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(STATE_FILENAME), "not json").unwrap();
        let mut store = JsonStateStore::for_config_dir(dir.path());
        assert_eq!(store.get_bool(ENABLED_KEY), None);
        store.set_bool(ENABLED_KEY, true).unwrap();
        assert_eq!(store.get_bool(ENABLED_KEY), Some(true));
    }
}
