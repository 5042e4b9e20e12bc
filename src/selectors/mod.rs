//! Selection of rules applicable to a save event
//!
//! Rule selection is a stable filter over the configured order: a rule is
//! kept when its `match` pattern is absent or matches the saved path, its
//! `notMatch` pattern does not veto it, and its run mode equals the mode of
//! the triggering event. Selection cannot fail — patterns were compiled when
//! the configuration was loaded.

use log::debug;

use crate::rules::{Rule, RunMode};

pub mod watch;

/// Filter `rules` down to those that apply to `path` in the given `mode`.
///
/// Order is preserved from configuration; an empty result means "nothing to
/// run for this save" and is not an error.
#[must_use]
pub fn select_rules<'a>(rules: &'a [Rule], path: &str, mode: RunMode) -> Vec<&'a Rule> {
    let selected: Vec<&Rule> = rules
        .iter()
        .filter(|rule| {
            let is_match = rule
                .match_pattern
                .as_ref()
                .is_none_or(|re| re.is_match(path));
            let is_negated = rule.not_match.as_ref().is_some_and(|re| re.is_match(path));
            is_match && !is_negated && rule.run_mode == mode
        })
        .collect();

    debug!(
        "Selected {}/{} rules for {path} ({mode:?})",
        selected.len(),
        rules.len()
    );
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex_cache::LazyRegex;

    fn make_rule(pattern: Option<&str>, not_match: Option<&str>, mode: RunMode) -> Rule {
        Rule {
            match_pattern: pattern.map(|p| LazyRegex::new(p).unwrap()),
            not_match: not_match.map(|p| LazyRegex::new(p).unwrap()),
            cmd: "echo test".to_string(),
            run_mode: mode,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_patterns_matches_every_path() {
        let rules = vec![make_rule(None, None, RunMode::Normal)];
        for path in ["/proj/a.py", "/x", "weird name.txt"] {
            assert_eq!(select_rules(&rules, path, RunMode::Normal).len(), 1);
        }
    }

    #[test]
    fn test_match_pattern_filters() {
        let rules = vec![make_rule(Some(r"\.py$"), None, RunMode::Normal)];
        assert_eq!(select_rules(&rules, "/proj/a.py", RunMode::Normal).len(), 1);
        assert_eq!(select_rules(&rules, "/proj/a.rs", RunMode::Normal).len(), 0);
    }

    #[test]
    fn test_not_match_vetoes_positive_match() {
        let rules = vec![make_rule(Some(r"\.py$"), Some("test_"), RunMode::Normal)];
        assert_eq!(
            select_rules(&rules, "/proj/test_a.py", RunMode::Normal).len(),
            0
        );
        assert_eq!(select_rules(&rules, "/proj/a.py", RunMode::Normal).len(), 1);
    }

    #[test]
    fn test_mode_must_match() {
        let rules = vec![
            make_rule(None, None, RunMode::Normal),
            make_rule(None, None, RunMode::ShortcutOnly),
        ];
        let normal = select_rules(&rules, "/proj/a.py", RunMode::Normal);
        assert_eq!(normal.len(), 1);
        assert_eq!(normal[0].run_mode, RunMode::Normal);
        let shortcut = select_rules(&rules, "/proj/a.py", RunMode::ShortcutOnly);
        assert_eq!(shortcut.len(), 1);
        assert_eq!(shortcut[0].run_mode, RunMode::ShortcutOnly);
    }

    #[test]
    fn test_order_preserved() {
        let mut first = make_rule(None, None, RunMode::Normal);
        first.cmd = "first".to_string();
        let mut skipped = make_rule(Some(r"\.rs$"), None, RunMode::Normal);
        skipped.cmd = "skipped".to_string();
        let mut second = make_rule(None, None, RunMode::Normal);
        second.cmd = "second".to_string();

        let rules = vec![first, skipped, second];
        let selected = select_rules(&rules, "/proj/a.py", RunMode::Normal);
        let cmds: Vec<&str> = selected.iter().map(|r| r.cmd.as_str()).collect();
        assert_eq!(cmds, vec!["first", "second"]);
    }
}
