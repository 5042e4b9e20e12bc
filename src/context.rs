//! Per-save context for placeholder substitution
//!
//! A [`SaveContext`] is built once per save event and discarded when the
//! cycle completes. It snapshots everything substitution needs: the path
//! split into its components, the process working directory, and — when the
//! file is owned by a workspace folder — the workspace root, display name,
//! and `./`-prefixed relative path.

use std::path::{MAIN_SEPARATOR, Path};

use crate::workspace::WorkspaceFolder;

/// Workspace-scoped parts of a save context.
#[derive(Debug, Clone)]
pub struct WorkspaceContext {
    pub root: String,
    pub name: String,
    /// Path relative to the workspace root, prefixed with `.`
    /// (e.g. `./src/a.py`).
    pub relative_file: String,
}

/// Snapshot of a saved document used for command materialization.
#[derive(Debug, Clone)]
pub struct SaveContext {
    /// Absolute file path.
    pub file: String,
    /// File name including extension.
    pub file_basename: String,
    /// File name excluding extension.
    pub file_basename_no_ext: String,
    /// Containing directory path.
    pub file_dirname: String,
    /// Extension including the leading dot, empty when there is none.
    pub file_extname: String,
    /// Process working directory at context-creation time.
    pub cwd: String,
    pub workspace: Option<WorkspaceContext>,
}

impl SaveContext {
    #[must_use]
    pub fn new(path: &Path, folder: Option<&WorkspaceFolder>) -> Self {
        let file_basename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_basename_no_ext = path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_extname = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let file_dirname = path
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let cwd = std::env::current_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        let workspace = folder.and_then(|folder| {
            let relative = path.strip_prefix(&folder.root).ok()?;
            Some(WorkspaceContext {
                root: folder.root.display().to_string(),
                name: folder.name.clone(),
                relative_file: format!(".{MAIN_SEPARATOR}{}", relative.display()),
            })
        });

        Self {
            file: path.display().to_string(),
            file_basename,
            file_basename_no_ext,
            file_dirname,
            file_extname,
            cwd,
            workspace,
        }
    }
}
