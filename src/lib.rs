//! Core implementation of the onsave command runner
//!
//! onsave watches workspace folders for file saves and runs configured
//! shell commands in reusable per-folder terminal sessions. Rules are
//! regex-gated command templates; saved-path and environment placeholders
//! are expanded before dispatch, and dispatch is fire-and-forget — the
//! command's exit status is never observed.

use std::path::PathBuf;

use log::{debug, warn};

use crate::config_file::{Config, ConfigError, RunConfig};

pub mod config_file;
pub mod context;
pub mod logger;
pub mod orchestrator;
pub mod rules;
pub mod selectors;
pub mod session;
pub mod state;
pub mod template;
pub mod workspace;

/// Load configuration from a file (or auto-detect), returning the compiled
/// `RunConfig`, the config file's directory, and the config file path.
///
/// # Errors
///
/// Returns `ConfigError` if the config file is not found, cannot be parsed,
/// contains an invalid regex, or fails validation.
pub fn load_config(config_file: Option<&str>) -> Result<(RunConfig, PathBuf, PathBuf), ConfigError> {
    let config_path = match config_file {
        Some(file) => {
            let config_path = PathBuf::from(file);
            if !config_path.exists() {
                return Err(ConfigError::ConfigNotFound(config_path));
            }
            config_path
        }
        None => Config::find_config()?,
    };
    let cwd = config_path
        .parent()
        .ok_or_else(|| ConfigError::ConfigNotFound(config_path.clone()))?
        .to_path_buf();
    debug!(
        "Loading config file: {} (cwd: {})",
        config_path.display(),
        cwd.display()
    );
    let config: RunConfig = Config::from_file(&config_path)?.try_into()?;
    validate_rules(&config)?;
    Ok((config, cwd, config_path))
}

/// Validate the compiled rule list. Zero rules is legal (saves become
/// no-ops), but a rule with an empty command template is a config error.
fn validate_rules(config: &RunConfig) -> Result<(), ConfigError> {
    for rule in &config.rules {
        if rule.cmd.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Rule '{}' has an empty cmd string",
                rule.label()
            )));
        }
    }
    if config.rules.is_empty() {
        warn!("No commands configured, saves will be ignored");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;

    fn make_config(rules: Vec<Rule>) -> RunConfig {
        RunConfig {
            rules,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_cmd_rejected() {
        let config = make_config(vec![Rule {
            name: Some("broken".to_string()),
            cmd: "   ".to_string(),
            ..Default::default()
        }]);
        match validate_rules(&config) {
            Err(ConfigError::Validation(msg)) => assert!(msg.contains("broken")),
            other => panic!("Expected Validation error, got: {other:?}"),
        }
    }

    #[test]
    fn test_zero_rules_is_legal() {
        assert!(validate_rules(&make_config(vec![])).is_ok());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config(Some("/nonexistent/.onsave.yaml"));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_load_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".onsave.yaml");
        std::fs::write(
            &path,
            "autoClearConsole: true\ncommands:\n  - match: '\\.rs$'\n    cmd: cargo check\n",
        )
        .unwrap();
        let path_str = path.to_string_lossy().to_string();
        let (config, cwd, config_path) = load_config(Some(&path_str)).unwrap();
        assert!(config.auto_clear_console);
        assert_eq!(config.rules.len(), 1);
        assert_eq!(cwd, dir.path());
        assert_eq!(config_path, path);
    }
}
