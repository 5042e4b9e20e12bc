//! Workspace-root resolution
//!
//! A saved file belongs to the workspace folder whose root is its longest
//! prefix. Files outside every root have no workspace context, which makes
//! workspace-scoped placeholders unavailable for them.

use std::path::{Path, PathBuf};

/// A named folder that can own saved files and a terminal session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceFolder {
    pub root: PathBuf,
    pub name: String,
}

impl WorkspaceFolder {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        let name = root
            .file_name()
            .map_or_else(|| root.display().to_string(), |n| n.to_string_lossy().into_owned());
        Self { root, name }
    }
}

/// Resolves saved paths to their owning workspace folder.
#[derive(Debug, Default)]
pub struct WorkspaceResolver {
    folders: Vec<WorkspaceFolder>,
}

impl WorkspaceResolver {
    #[must_use]
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            folders: roots.into_iter().map(WorkspaceFolder::new).collect(),
        }
    }

    #[must_use]
    pub fn folders(&self) -> &[WorkspaceFolder] {
        &self.folders
    }

    /// Find the folder owning `path`. With nested roots the deepest match
    /// wins, so files resolve to their closest enclosing workspace.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> Option<&WorkspaceFolder> {
        self.folders
            .iter()
            .filter(|folder| path.starts_with(&folder.root))
            .max_by_key(|folder| folder.root.components().count())
    }
}
