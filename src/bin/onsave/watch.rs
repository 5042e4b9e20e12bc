use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use log::info;
use tokio::sync::mpsc;

use onsave::config_file::RunConfig;
use onsave::orchestrator::Orchestrator;
use onsave::selectors::watch::{WatchEvent, watch_roots};
use onsave::session::pty::PtySessionHost;
use onsave::state::JsonStateStore;
use onsave::workspace::WorkspaceResolver;

/// Watch mode: one task owns the orchestrator, and every event source —
/// saves, session-closed notifications, ctrl-c — is serialized through the
/// `select!` below, so cycles never overlap.
pub async fn run(
    config: &RunConfig,
    config_path: &Path,
    roots: Vec<PathBuf>,
) -> Result<ExitCode, Box<dyn Error>> {
    let resolver = WorkspaceResolver::new(roots.clone());
    let (closed_tx, mut closed_rx) = mpsc::channel(16);
    let host = PtySessionHost::new(config.shell.clone(), closed_tx);
    let state = JsonStateStore::for_config_dir(
        config_path.parent().unwrap_or_else(|| Path::new(".")),
    );
    let mut orchestrator = Orchestrator::new(config_path.to_path_buf(), resolver, host, state);

    // The debouncer must stay alive for the watch to continue
    let (mut watch_rx, _debouncer) = watch_roots(&roots, config_path)?;

    info!(
        "Watching {} root(s), {} rule(s) configured",
        roots.len(),
        config.rules.len()
    );

    loop {
        tokio::select! {
            event = watch_rx.recv() => match event {
                Some(WatchEvent::Saved(path)) => orchestrator.handle_save(&path),
                Some(WatchEvent::ConfigChanged) => orchestrator.handle_config_changed(),
                None => break,
            },
            name = closed_rx.recv() => match name {
                Some(name) => orchestrator.handle_session_closed(&name),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
