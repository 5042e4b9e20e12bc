//! Configuration file handling for onsave
//!
//! The on-disk format keeps the key names users already know from editor
//! "run on save" extensions (`match`, `notMatch`, `cmd`, `useShortcut`,
//! `silent`, `autoClearConsole`), while the runtime model compiles every
//! pattern up front so an invalid regex is rejected at load time with a
//! message naming the offending rule.

use std::path::{Path, PathBuf};

use log::{debug, info};
use regex_cache::LazyRegex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rules::{Rule, RunMode};

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No config file found in current directory or its parents: {0}")]
    ConfigNotFound(PathBuf),
    #[error("Unknown working directory: {0}")]
    UnknownWorkingDirectory(String),
    #[error("Unable to parse YAML config file {path}: {source}")]
    Yaml {
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("Unable to parse JSON config file {path}: {source}")]
    Json {
        source: serde_json::Error,
        path: PathBuf,
    },
    #[error("Invalid regex pattern `{pattern}` in rule '{rule}': {source}")]
    Regex {
        source: regex::Error,
        pattern: String,
        rule: String,
    },
    #[error("Invalid config: {0}")]
    Validation(String),
}

fn parse_pattern(pattern: Option<String>, rule: &str) -> Result<Option<LazyRegex>, ConfigError> {
    pattern
        .filter(|p| !p.is_empty())
        .map(|p| {
            LazyRegex::new(&p).map_err(|e| ConfigError::Regex {
                source: e,
                pattern: p,
                rule: rule.to_string(),
            })
        })
        .transpose()
}

/// Configuration for a single save rule
#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRule {
    pub name: Option<String>,
    /// Regex the saved path must match for the rule to apply.
    #[serde(rename = "match")]
    pub match_pattern: Option<String>,
    /// Regex that excludes the rule when it matches, overriding `match`.
    pub not_match: Option<String>,
    pub cmd: String,
    /// Accepted for compatibility with older configs; dispatch to a terminal
    /// session never waits, so the flag has no effect.
    pub is_async: Option<bool>,
    /// When true the rule only runs on an explicit `onsave run` request.
    pub use_shortcut: Option<bool>,
    pub silent: Option<bool>,
}

impl TryFrom<ConfigRule> for Rule {
    type Error = ConfigError;

    fn try_from(config: ConfigRule) -> Result<Self, Self::Error> {
        let label = config.name.clone().unwrap_or_else(|| config.cmd.clone());
        if config.is_async.is_some() {
            debug!("Rule '{label}': isAsync is advisory and has no effect");
        }
        let run_mode = if config.use_shortcut == Some(true) {
            RunMode::ShortcutOnly
        } else {
            RunMode::Normal
        };
        Ok(Rule {
            match_pattern: parse_pattern(config.match_pattern, &label)?,
            not_match: parse_pattern(config.not_match, &label)?,
            name: config.name,
            cmd: config.cmd,
            run_mode,
            silent: config.silent.unwrap_or(false),
        })
    }
}

/// Root configuration structure as read from disk
#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Shell program used for new sessions. Advisory: existing sessions are
    /// not restarted when it changes.
    pub shell: Option<String>,
    pub auto_clear_console: Option<bool>,
    pub commands: Option<Vec<ConfigRule>>,
}

/// Runtime configuration with compiled rules
#[derive(Debug, Default)]
pub struct RunConfig {
    pub shell: Option<String>,
    pub auto_clear_console: bool,
    pub rules: Vec<Rule>,
}

impl TryFrom<Config> for RunConfig {
    type Error = ConfigError;

    fn try_from(config: Config) -> Result<Self, Self::Error> {
        let rules = config
            .commands
            .unwrap_or_default()
            .into_iter()
            .map(Rule::try_from)
            .collect::<Result<Vec<Rule>, ConfigError>>()?;
        Ok(RunConfig {
            shell: config.shell,
            auto_clear_console: config.auto_clear_console.unwrap_or(false),
            rules,
        })
    }
}

/// List of supported configuration file names
pub const FILENAMES: [&str; 3] = [".onsave.json", ".onsave.yaml", ".onsave.yml"];

impl Config {
    /// Loads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if the file cannot be read, or
    /// `ConfigError::Yaml`/`ConfigError::Json` if parsing fails.
    pub fn from_file(file: &Path) -> Result<Config, ConfigError> {
        let contents = std::fs::read_to_string(file)
            .map_err(|_| ConfigError::ConfigNotFound(file.to_path_buf()))?;
        let config: Config = if file.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&contents).map_err(|e| ConfigError::Json {
                source: e,
                path: file.to_path_buf(),
            })?
        } else {
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Yaml {
                source: e,
                path: file.to_path_buf(),
            })?
        };
        Ok(config)
    }

    /// Searches for a configuration file in the current directory and its parents.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownWorkingDirectory` if the cwd cannot be determined,
    /// or `ConfigError::ConfigNotFound` if no config file is found.
    pub fn find_config() -> Result<PathBuf, ConfigError> {
        let config_path = std::env::current_dir()
            .map_err(|e| ConfigError::UnknownWorkingDirectory(e.to_string()))?;
        let mut path = config_path.clone();
        debug!("Searching for config file in {}", config_path.display());
        loop {
            for file in &FILENAMES {
                let config_path = path.join(file);
                if config_path.exists() {
                    info!("Found config file: {}", config_path.display());
                    return Ok(config_path);
                }
            }
            if !path.pop() {
                return Err(ConfigError::ConfigNotFound(config_path));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_file_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".onsave.json");
        std::fs::write(
            &path,
            r#"{
                "autoClearConsole": true,
                "commands": [{"match": "\\.py$", "cmd": "python ${file}"}]
            }"#,
        )
        .unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.auto_clear_console, Some(true));
        assert_eq!(config.commands.unwrap().len(), 1);
    }

    #[test]
    fn test_from_file_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".onsave.yaml");
        std::fs::write(
            &path,
            "shell: bash\ncommands:\n  - match: '\\.rs$'\n    cmd: cargo check\n    useShortcut: true\n",
        )
        .unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.shell.as_deref(), Some("bash"));
        let run: RunConfig = config.try_into().unwrap();
        assert_eq!(run.rules[0].run_mode, RunMode::ShortcutOnly);
    }

    #[test]
    fn test_regex_error_names_rule() {
        let config = ConfigRule {
            name: Some("broken".to_string()),
            match_pattern: Some("[invalid".to_string()),
            cmd: "echo hi".to_string(),
            ..Default::default()
        };
        match Rule::try_from(config) {
            Err(ConfigError::Regex { pattern, rule, .. }) => {
                assert_eq!(pattern, "[invalid");
                assert_eq!(rule, "broken");
            }
            other => panic!("Expected ConfigError::Regex, got: {other:?}"),
        }
    }

    #[test]
    fn test_empty_pattern_treated_as_absent() {
        let config = ConfigRule {
            match_pattern: Some(String::new()),
            cmd: "echo hi".to_string(),
            ..Default::default()
        };
        let rule = Rule::try_from(config).unwrap();
        assert!(rule.match_pattern.is_none());
    }

    #[test]
    fn test_silent_defaults_to_false() {
        let config = ConfigRule {
            cmd: "echo hi".to_string(),
            ..Default::default()
        };
        let rule = Rule::try_from(config).unwrap();
        assert!(!rule.silent);
        assert_eq!(rule.run_mode, RunMode::Normal);
    }
}
