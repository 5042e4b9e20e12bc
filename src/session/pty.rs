//! PTY-backed session host
//!
//! Each session is a long-lived interactive shell spawned in a
//! pseudo-terminal, rooted at its workspace folder. A writer thread feeds
//! typed text into the PTY; a reader thread drains output, mirrors it to
//! stdout while the session is surfaced, and reports the session name on
//! the closed channel when the shell exits — the hook that lets the
//! dispatcher drop the dead handle.

use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::spawn;

use log::{debug, error};
use portable_pty::{
    Child, CommandBuilder, ExitStatus, MasterPty, PtySize, native_pty_system,
};
use tokio::sync::mpsc;

use super::{SessionError, SessionHost, messages};

const DEFAULT_SHELL: &str = "sh";

fn shell_command(shell: &str, cwd: &Path) -> CommandBuilder {
    let mut builder = CommandBuilder::new(shell);
    for (key, value) in std::env::vars() {
        builder.env(key, value);
    }
    builder.env("TERM", "xterm-256color");
    builder.cwd(cwd);
    builder
}

type SpawnedPty = (Box<dyn Child + Send + Sync>, Box<dyn MasterPty + Send>);

fn spawn_shell(shell: &str, name: &str, cwd: &Path) -> Result<SpawnedPty, SessionError> {
    debug!("Spawning '{shell}' for session '{name}' in {}", cwd.display());

    let pty_system = native_pty_system();
    let pair = pty_system
        .openpty(PtySize {
            rows: 24,
            cols: 80,
            pixel_width: 0,
            pixel_height: 0,
        })
        .map_err(|e| SessionError::Pty(e.to_string()))?;

    let child = pair
        .slave
        .spawn_command(shell_command(shell, cwd))
        .map_err(|e| SessionError::Spawn {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

    drop(pair.slave); // This will make the reader close when the shell exits

    Ok((child, pair.master))
}

/// Spawn a thread that drains PTY output, mirroring it to stdout while the
/// session is surfaced. On EOF it waits for the shell and reports the
/// session as closed.
fn spawn_session_reader(
    mut reader: Box<dyn Read + Send>,
    mut shell: Box<dyn Child + Send + Sync>,
    name: String,
    surfaced: Arc<AtomicBool>,
    closed_tx: mpsc::Sender<String>,
) -> crossbeam_channel::Receiver<ExitStatus> {
    let (status_tx, status_rx) = crossbeam_channel::bounded(1);

    spawn(move || {
        let mut buf = [0u8; 1024];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => {
                    debug!("Session '{name}' reader EOF");
                    break;
                }
                Ok(n) => {
                    if surfaced.load(Ordering::Acquire) {
                        let mut stdout = std::io::stdout().lock();
                        let _ = stdout.write_all(&buf[..n]);
                        let _ = stdout.flush();
                    }
                }
                Err(e) => {
                    error!("Session '{name}' reader error: {e:?}");
                    break;
                }
            }
        }

        match shell.wait() {
            Ok(status) => {
                let _ = status_tx.send(status);
            }
            Err(e) => error!("Failed to wait for session '{name}' shell: {e:?}"),
        }

        if closed_tx.blocking_send(name.clone()).is_err() {
            debug!("Session '{name}' closed after the event loop shut down");
        }
    });

    status_rx
}

/// Spawn a thread owning the PTY writer and master. The master must stay
/// alive as long as the session does; dropping it hangs up the shell.
fn spawn_session_writer(
    mut writer: Box<dyn Write + Send>,
    master: Box<dyn MasterPty + Send>,
) -> crossbeam_channel::Sender<Vec<u8>> {
    let (input_tx, input_rx) = crossbeam_channel::bounded::<Vec<u8>>(1000);

    spawn(move || {
        while let Ok(input) = input_rx.recv() {
            if let Err(e) = writer.write_all(&input) {
                error!("Failed to write to session PTY: {e:?}");
                break;
            }
            let _ = writer.flush();
        }
        debug!("Session writer thread EOF");
        drop(master);
    });

    input_tx
}

/// Handle to one live shell session.
pub struct PtySession {
    name: String,
    input_tx: crossbeam_channel::Sender<Vec<u8>>,
    surfaced: Arc<AtomicBool>,
    status_rx: crossbeam_channel::Receiver<ExitStatus>,
}

/// Session host backed by real pseudo-terminals.
pub struct PtySessionHost {
    shell: String,
    closed_tx: mpsc::Sender<String>,
}

impl PtySessionHost {
    /// `shell` comes from the `shell` config option; `closed_tx` receives
    /// the name of every session whose shell exits.
    #[must_use]
    pub fn new(shell: Option<String>, closed_tx: mpsc::Sender<String>) -> Self {
        Self {
            shell: shell.unwrap_or_else(|| DEFAULT_SHELL.to_string()),
            closed_tx,
        }
    }
}

impl SessionHost for PtySessionHost {
    type Handle = PtySession;

    fn create(&mut self, name: &str, cwd: &Path) -> Result<PtySession, SessionError> {
        let (shell, master) = spawn_shell(&self.shell, name, cwd)?;
        let reader = master
            .try_clone_reader()
            .map_err(|e| SessionError::Pty(format!("Failed to clone PTY reader: {e}")))?;
        let writer = master
            .take_writer()
            .map_err(|e| SessionError::Pty(format!("Failed to take PTY writer: {e}")))?;

        let surfaced = Arc::new(AtomicBool::new(false));
        let status_rx = spawn_session_reader(
            reader,
            shell,
            name.to_string(),
            Arc::clone(&surfaced),
            self.closed_tx.clone(),
        );
        let input_tx = spawn_session_writer(writer, master);

        Ok(PtySession {
            name: name.to_string(),
            input_tx,
            surfaced,
            status_rx,
        })
    }

    fn send_text(&mut self, handle: &PtySession, text: &str) -> Result<(), SessionError> {
        if handle.surfaced.load(Ordering::Acquire) {
            let mut stdout = std::io::stdout().lock();
            let _ = stdout.write_all(messages::format_dispatch_message(&handle.name, text).as_bytes());
            let _ = stdout.flush();
        }
        handle
            .input_tx
            .send(format!("{text}\n").into_bytes())
            .map_err(|_| SessionError::Disconnected(handle.name.clone()))
    }

    fn show(&mut self, handle: &PtySession) {
        handle.surfaced.store(true, Ordering::Release);
    }

    fn close(&mut self, name: &str, handle: PtySession) {
        debug!("Closing session '{name}'");
        // Ask the shell to exit, then wait so dispatched commands finish.
        // The shell processes its input in order; there is deliberately no
        // timeout, matching fire-and-forget dispatch with no recovery path.
        if handle.input_tx.send(b"exit\n".to_vec()).is_ok() {
            let _ = handle.status_rx.recv();
        }
    }
}
