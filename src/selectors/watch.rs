//! Save-event detection via filesystem watching
//!
//! One editor save surfaces as a burst of filesystem events, so raw notify
//! events are coalesced over a short window into a single save event per
//! file. Distinct saves remain distinct cycles; there is no cross-save
//! debouncing. Events touching the config file become `ConfigChanged`
//! instead of saves, and the state file is ignored entirely so toggling
//! the enabled flag never triggers a cycle.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{error, info};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{DebounceEventResult, Debouncer, RecommendedCache, new_debouncer};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config_file::FILENAMES;
use crate::state::STATE_FILENAME;

/// Window for coalescing the filesystem event burst of a single save.
const SAVE_COALESCE_WINDOW: Duration = Duration::from_millis(250);

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Error starting file watcher: {0}")]
    Watch(#[from] notify::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Events delivered to the orchestrator's loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A file under a workspace root was written.
    Saved(PathBuf),
    /// The configuration file changed.
    ConfigChanged,
}

/// Classify one changed path; `None` for paths the watcher ignores.
fn classify(path: &Path, config_path: &Path) -> Option<WatchEvent> {
    if path == config_path {
        return Some(WatchEvent::ConfigChanged);
    }
    let file_name = path.file_name()?.to_string_lossy();
    // Another onsave process editing config/state is not a save
    if file_name == STATE_FILENAME || FILENAMES.contains(&file_name.as_ref()) {
        return None;
    }
    if !path.is_file() {
        return None;
    }
    Some(WatchEvent::Saved(path.to_path_buf()))
}

type WatchHandle = (
    mpsc::Receiver<WatchEvent>,
    Debouncer<RecommendedWatcher, RecommendedCache>,
);

/// Start watching the workspace roots. Returns the event receiver and the
/// debouncer, which must be kept alive for the watch to continue.
///
/// # Errors
///
/// Returns `WatchError::Watch` if the file watcher fails to start or a root
/// cannot be watched.
pub fn watch_roots(roots: &[PathBuf], config_path: &Path) -> Result<WatchHandle, WatchError> {
    info!("Starting file watcher");
    let (event_tx, event_rx) = mpsc::channel(100);
    let config_path = config_path.to_path_buf();

    let mut debouncer = new_debouncer(
        SAVE_COALESCE_WINDOW,
        None,
        move |res: DebounceEventResult| match res {
            Ok(events) => {
                let mut saves: Vec<WatchEvent> = Vec::new();
                for event in &events {
                    if !(event.event.kind.is_create() || event.event.kind.is_modify()) {
                        continue;
                    }
                    for path in &event.paths {
                        if let Some(ev) = classify(path, &config_path)
                            && !saves.contains(&ev)
                        {
                            saves.push(ev);
                        }
                    }
                }
                for ev in saves {
                    if let Err(e) = event_tx.blocking_send(ev) {
                        error!("Failed to send watch event: {e}");
                    }
                }
            }
            Err(e) => error!("Watch error: {e:?}"),
        },
    )
    .map_err(WatchError::Watch)?;

    for root in roots {
        info!("Watching workspace root: {}", root.display());
        debouncer
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| {
                error!("Failed to watch root {}: {e}", root.display());
                WatchError::Watch(e)
            })?;
    }

    Ok((event_rx, debouncer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join(".onsave.yaml");
        std::fs::write(&config, "commands: []\n").unwrap();
        assert_eq!(classify(&config, &config), Some(WatchEvent::ConfigChanged));
    }

    #[test]
    fn test_classify_state_file_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join(STATE_FILENAME);
        std::fs::write(&state, "{}").unwrap();
        let config = dir.path().join(".onsave.yaml");
        assert_eq!(classify(&state, &config), None);
    }

    #[test]
    fn test_classify_ordinary_file_is_save() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("main.py");
        std::fs::write(&file, "print()").unwrap();
        let config = dir.path().join(".onsave.yaml");
        assert_eq!(
            classify(&file, &config),
            Some(WatchEvent::Saved(file.clone()))
        );
    }

    #[test]
    fn test_classify_directory_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        let config = dir.path().join(".onsave.yaml");
        assert_eq!(classify(&sub, &config), None);
    }

    #[test]
    fn test_config_file_in_other_directory_ignored() {
        // A second project's config inside the watched tree is neither a
        // save nor this process's config change
        let dir = tempfile::tempdir().unwrap();
        let other = dir.path().join("nested").join(".onsave.json");
        std::fs::create_dir_all(other.parent().unwrap()).unwrap();
        std::fs::write(&other, "{}").unwrap();
        let config = dir.path().join(".onsave.yaml");
        assert_eq!(classify(&other, &config), None);
    }
}
