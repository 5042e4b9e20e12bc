//! Save orchestration
//!
//! The orchestrator is the reactive core: each save event, run request,
//! config change, or session-closed notification is handled to completion
//! before the next one, so no locking is needed around the session registry.
//! A save cycle reloads configuration from disk (rules may have just
//! changed), filters rules, materializes their templates, and dispatches
//! the results to the owning folder's session in declaration order. No
//! failure is fatal: cycles log their errors and the orchestrator returns
//! to an idle, ready-for-next-event state.

use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use thiserror::Error;

use crate::config_file::{Config, ConfigError, RunConfig};
use crate::context::SaveContext;
use crate::rules::RunMode;
use crate::selectors::select_rules;
use crate::session::{Dispatcher, SessionError, SessionHost, messages, session_cwd, session_name};
use crate::state::{ENABLED_KEY, StateStore};
use crate::template::{MaterializedCommand, materialize};
use crate::workspace::WorkspaceResolver;

#[derive(Error, Debug)]
enum CycleError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Reacts to save and lifecycle events by running command cycles.
pub struct Orchestrator<H: SessionHost, S: StateStore> {
    config_path: PathBuf,
    resolver: WorkspaceResolver,
    dispatcher: Dispatcher<H>,
    state: S,
}

impl<H: SessionHost, S: StateStore> Orchestrator<H, S> {
    pub fn new(config_path: PathBuf, resolver: WorkspaceResolver, host: H, state: S) -> Self {
        Self {
            config_path,
            resolver,
            dispatcher: Dispatcher::new(host),
            state,
        }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher<H> {
        &self.dispatcher
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.state.get_bool(ENABLED_KEY).unwrap_or(true)
    }

    /// Persist the enabled flag and log a status message.
    pub fn set_enabled(&mut self, enabled: bool) {
        match self.state.set_bool(ENABLED_KEY, enabled) {
            Ok(()) => info!(
                "Run on save {}",
                if enabled { "enabled" } else { "disabled" }
            ),
            Err(e) => error!("Failed to persist enabled flag: {e}"),
        }
    }

    /// Configuration changed on disk: reload and report, run nothing.
    pub fn handle_config_changed(&self) {
        info!("Reloading config");
        match self.load_run_config() {
            Ok(config) => info!("Config reloaded: {} rules", config.rules.len()),
            Err(e) => error!("Config reload failed: {e}"),
        }
    }

    /// An ordinary save event.
    pub fn handle_save(&mut self, path: &Path) {
        if let Err(e) = self.run_cycle(path, RunMode::Normal) {
            error!("Save cycle for {} failed: {e}", path.display());
        }
    }

    /// An explicit "run now" request: only `shortcutOnly` rules fire.
    pub fn handle_run_request(&mut self, path: &Path) {
        if let Err(e) = self.run_cycle(path, RunMode::ShortcutOnly) {
            error!("Run request for {} failed: {e}", path.display());
        }
    }

    /// The host reported a session's shell as exited.
    pub fn handle_session_closed(&mut self, name: &str) {
        self.dispatcher.on_session_closed(name);
    }

    /// Close every session and wait for the shells to finish. Used by
    /// one-shot runs so dispatched commands execute before exit.
    pub fn shutdown(&mut self) {
        self.dispatcher.close_all();
    }

    fn load_run_config(&self) -> Result<RunConfig, ConfigError> {
        Config::from_file(&self.config_path)?.try_into()
    }

    fn run_cycle(&mut self, path: &Path, mode: RunMode) -> Result<(), CycleError> {
        // Never cached: rules may have changed since the last cycle
        let config = self.load_run_config()?;

        if config.auto_clear_console {
            let mut stdout = std::io::stdout().lock();
            let _ = stdout.write_all(messages::CLEAR_CONSOLE.as_bytes());
            let _ = stdout.flush();
        }

        if !self.is_enabled() {
            info!("Run on save is disabled, ignoring {}", path.display());
            return Ok(());
        }
        if config.rules.is_empty() {
            info!("No rules configured");
            return Ok(());
        }

        let path_str = path.to_string_lossy();
        let selected = select_rules(&config.rules, &path_str, mode);
        if selected.is_empty() {
            debug!("Nothing to run for {path_str}");
            return Ok(());
        }

        let folder = self.resolver.resolve(path);
        let ctx = SaveContext::new(path, folder);

        let mut commands = Vec::new();
        for rule in selected {
            match materialize(&rule.cmd, &ctx) {
                Ok(text) => commands.push(MaterializedCommand {
                    text,
                    silent: rule.silent,
                }),
                // Partial failure: one bad rule never blocks its siblings
                Err(e) => warn!("Skipping rule '{}': {e}", rule.label()),
            }
        }
        if commands.is_empty() {
            return Ok(());
        }

        let name = session_name(folder.map(|f| f.name.as_str()), path);
        let cwd = session_cwd(folder.map(|f| f.root.as_path()), path);
        for command in &commands {
            self.dispatcher.dispatch(&name, &cwd, command)?;
        }
        Ok(())
    }
}
