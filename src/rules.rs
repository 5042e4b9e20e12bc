//! Runtime rule model
//!
//! A [`Rule`] is one configured command template together with the regex gates
//! that decide whether it applies to a saved path. Patterns are compiled once
//! at configuration load, so selection never fails at runtime.

use regex_cache::LazyRegex;

/// When a rule fires: on ordinary saves, or only on an explicit run request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Normal,
    ShortcutOnly,
}

/// A configured command template with its matching rules.
#[derive(Debug, Clone, Default)]
pub struct Rule {
    pub name: Option<String>,
    /// If present, the rule applies only to paths matching this pattern.
    pub match_pattern: Option<LazyRegex>,
    /// If present and matching, the rule is excluded regardless of
    /// `match_pattern` (veto semantics).
    pub not_match: Option<LazyRegex>,
    /// Shell command template, may contain `${...}` placeholders.
    pub cmd: String,
    pub run_mode: RunMode,
    /// Whether the target session should stay in the background.
    pub silent: bool,
}

impl Rule {
    /// Label used when naming this rule in logs and error messages.
    #[must_use]
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_prefers_name() {
        let rule = Rule {
            name: Some("lint".to_string()),
            cmd: "cargo clippy".to_string(),
            ..Default::default()
        };
        assert_eq!(rule.label(), "lint");
    }

    #[test]
    fn test_label_falls_back_to_cmd() {
        let rule = Rule {
            cmd: "cargo clippy".to_string(),
            ..Default::default()
        };
        assert_eq!(rule.label(), "cargo clippy");
    }
}
