use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Args;
use tokio::sync::mpsc;

use onsave::config_file::RunConfig;
use onsave::orchestrator::Orchestrator;
use onsave::session::pty::PtySessionHost;
use onsave::state::JsonStateStore;
use onsave::workspace::WorkspaceResolver;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// File to run shortcut-only rules against (its on-disk content is used)
    pub file: PathBuf,
}

/// Execute-now: run `useShortcut` rules against one file, then close the
/// sessions and wait for their shells so the commands actually finish.
pub fn run(
    args: &RunArgs,
    config: &RunConfig,
    cwd: &Path,
    config_path: &Path,
    roots: &[PathBuf],
) -> Result<ExitCode, Box<dyn Error>> {
    // Placeholders expand to absolute paths
    let file = args.file.canonicalize()?;

    let (closed_tx, closed_rx) = mpsc::channel(16);
    let host = PtySessionHost::new(config.shell.clone(), closed_tx);
    let resolver = WorkspaceResolver::new(roots.to_vec());
    let state = JsonStateStore::for_config_dir(cwd);
    let mut orchestrator = Orchestrator::new(config_path.to_path_buf(), resolver, host, state);

    orchestrator.handle_run_request(&file);
    orchestrator.shutdown();
    drop(closed_rx);

    Ok(ExitCode::SUCCESS)
}
