//! Terminal session registry and dispatch
//!
//! The [`Dispatcher`] owns the only mapping from session names to live
//! session handles; no other component may hold a handle, which keeps
//! close notifications from leaving dangling references behind. Sessions
//! are created lazily and reused across save cycles, one per workspace
//! folder name. Dispatch is fire-and-forget: command text is written to
//! the session as if typed, and no exit status is observed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

use crate::template::MaterializedCommand;

pub mod messages;
pub mod pty;

/// Errors raised by a session host. Any of these aborts dispatch for the
/// current save cycle only.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Unable to open PTY: {0}")]
    Pty(String),
    #[error("Unable to spawn shell for session '{name}': {reason}")]
    Spawn { name: String, reason: String },
    #[error("Session '{0}' is no longer accepting input")]
    Disconnected(String),
}

/// Host interface for named terminal sessions.
///
/// The production implementation is [`pty::PtySessionHost`]; tests substitute
/// a recording fake, keeping the dispatch policy testable without a live
/// terminal.
pub trait SessionHost {
    type Handle;

    /// Create a new named session rooted at `cwd`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the session cannot be created.
    fn create(&mut self, name: &str, cwd: &Path) -> Result<Self::Handle, SessionError>;

    /// Write command text to the session as if typed, followed by execute.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the session no longer accepts input.
    fn send_text(&mut self, handle: &Self::Handle, text: &str) -> Result<(), SessionError>;

    /// Bring the session into view.
    fn show(&mut self, handle: &Self::Handle);

    /// Tear the session down. Used on shutdown of one-shot runs; hosts wait
    /// for the underlying shell so already-dispatched commands finish.
    fn close(&mut self, name: &str, handle: Self::Handle);
}

/// Owns the name → session registry and routes materialized commands.
pub struct Dispatcher<H: SessionHost> {
    host: H,
    sessions: HashMap<String, H::Handle>,
}

impl<H: SessionHost> Dispatcher<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            sessions: HashMap::new(),
        }
    }

    /// Send one command to the named session, creating the session on first
    /// use. When the command is not silent, the session is surfaced first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the session cannot be created or written to.
    pub fn dispatch(
        &mut self,
        name: &str,
        cwd: &Path,
        command: &MaterializedCommand,
    ) -> Result<(), SessionError> {
        if !self.sessions.contains_key(name) {
            info!("Creating session '{name}' in {}", cwd.display());
            let handle = self.host.create(name, cwd)?;
            self.sessions.insert(name.to_string(), handle);
        }
        // Registry invariant: exactly one session per name, inserted above
        let Some(handle) = self.sessions.get(name) else {
            return Err(SessionError::Disconnected(name.to_string()));
        };
        if !command.silent {
            self.host.show(handle);
        }
        debug!("Dispatching to '{name}': {}", command.text);
        self.host.send_text(handle, &command.text)
    }

    /// Deregister a session the host reported as closed, so the next
    /// dispatch creates a fresh one instead of reusing a dead handle.
    pub fn on_session_closed(&mut self, name: &str) {
        if self.sessions.remove(name).is_some() {
            info!("Session '{name}' closed");
        }
    }

    #[must_use]
    pub fn has_session(&self, name: &str) -> bool {
        self.sessions.contains_key(name)
    }

    /// Close every session and wait for the underlying shells to finish.
    pub fn close_all(&mut self) {
        let names: Vec<String> = self.sessions.keys().cloned().collect();
        for name in names {
            if let Some(handle) = self.sessions.remove(&name) {
                self.host.close(&name, handle);
            }
        }
    }
}

/// Derive the session name for a save cycle from the owning workspace
/// folder, falling back to the saved file's parent directory name when the
/// file is outside every configured root.
#[must_use]
pub fn session_name(folder_name: Option<&str>, file: &Path) -> String {
    let name = folder_name.map_or_else(
        || {
            file.parent()
                .and_then(Path::file_name)
                .map_or_else(|| "onsave".to_string(), |n| n.to_string_lossy().into_owned())
        },
        str::to_string,
    );
    format!("Run {name}")
}

/// Working directory for a session: the workspace root when known, else the
/// saved file's parent directory.
#[must_use]
pub fn session_cwd(root: Option<&Path>, file: &Path) -> PathBuf {
    root.map_or_else(
        || file.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf),
        Path::to_path_buf,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeHost {
        created: Vec<String>,
        sent: Vec<(String, String)>,
        shown: Vec<String>,
        closed: Vec<String>,
    }

    impl SessionHost for FakeHost {
        type Handle = String;

        fn create(&mut self, name: &str, _cwd: &Path) -> Result<Self::Handle, SessionError> {
            self.created.push(name.to_string());
            Ok(name.to_string())
        }

        fn send_text(&mut self, handle: &String, text: &str) -> Result<(), SessionError> {
            self.sent.push((handle.clone(), text.to_string()));
            Ok(())
        }

        fn show(&mut self, handle: &String) {
            self.shown.push(handle.clone());
        }

        fn close(&mut self, name: &str, _handle: String) {
            self.closed.push(name.to_string());
        }
    }

    fn cmd(text: &str, silent: bool) -> MaterializedCommand {
        MaterializedCommand {
            text: text.to_string(),
            silent,
        }
    }

    #[test]
    fn test_session_created_once_and_reused() {
        let mut dispatcher = Dispatcher::new(FakeHost::default());
        let cwd = Path::new("/proj");
        dispatcher.dispatch("Run proj", cwd, &cmd("make one", false)).unwrap();
        dispatcher.dispatch("Run proj", cwd, &cmd("make two", false)).unwrap();

        assert_eq!(dispatcher.host.created, vec!["Run proj"]);
        assert_eq!(dispatcher.host.sent.len(), 2);
        assert_eq!(dispatcher.host.sent[0].1, "make one");
        assert_eq!(dispatcher.host.sent[1].1, "make two");
    }

    #[test]
    fn test_silent_command_not_shown() {
        let mut dispatcher = Dispatcher::new(FakeHost::default());
        let cwd = Path::new("/proj");
        dispatcher.dispatch("Run proj", cwd, &cmd("make", true)).unwrap();
        assert!(dispatcher.host.shown.is_empty());
        dispatcher.dispatch("Run proj", cwd, &cmd("make", false)).unwrap();
        assert_eq!(dispatcher.host.shown.len(), 1);
    }

    #[test]
    fn test_closed_session_recreated() {
        let mut dispatcher = Dispatcher::new(FakeHost::default());
        let cwd = Path::new("/proj");
        dispatcher.dispatch("Run proj", cwd, &cmd("make", false)).unwrap();
        assert!(dispatcher.has_session("Run proj"));

        dispatcher.on_session_closed("Run proj");
        assert!(!dispatcher.has_session("Run proj"));

        dispatcher.dispatch("Run proj", cwd, &cmd("make", false)).unwrap();
        assert_eq!(dispatcher.host.created, vec!["Run proj", "Run proj"]);
    }

    #[test]
    fn test_close_all_drains_registry() {
        let mut dispatcher = Dispatcher::new(FakeHost::default());
        let cwd = Path::new("/proj");
        dispatcher.dispatch("Run a", cwd, &cmd("make", true)).unwrap();
        dispatcher.dispatch("Run b", cwd, &cmd("make", true)).unwrap();
        dispatcher.close_all();
        assert!(!dispatcher.has_session("Run a"));
        assert!(!dispatcher.has_session("Run b"));
        assert_eq!(dispatcher.host.closed.len(), 2);
    }

    #[test]
    fn test_session_name_fallbacks() {
        assert_eq!(
            session_name(Some("proj"), Path::new("/proj/a.py")),
            "Run proj"
        );
        assert_eq!(session_name(None, Path::new("/tmp/scratch/a.py")), "Run scratch");
    }
}
