//! Floating rule matching.
//!
//! Windows are classified at map time against an ordered rule list: built-in
//! defaults first, then user rules in declaration order. The first matching
//! rule's outcome wins; an unmatched window is managed (tiled).

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Which metadata field a rule matches against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchField {
    Class,
    Title,
}

/// A single floating rule: exact match on one metadata field, with an
/// explicit outcome so an early rule can pin a window managed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloatRule {
    pub match_field: MatchField,
    pub pattern: String,
    #[serde(default = "default_floating")]
    pub floating: bool,
}

fn default_floating() -> bool {
    true
}

impl FloatRule {
    pub fn class(pattern: impl Into<String>) -> Self {
        Self {
            match_field: MatchField::Class,
            pattern: pattern.into(),
            floating: true,
        }
    }

    pub fn title(pattern: impl Into<String>) -> Self {
        Self {
            match_field: MatchField::Title,
            pattern: pattern.into(),
            floating: true,
        }
    }

    fn matches(&self, class: &str, title: &str) -> bool {
        match self.match_field {
            MatchField::Class => self.pattern == class,
            MatchField::Title => self.pattern == title,
        }
    }
}

/// Built-in float rules for transient window classes. User rules are
/// appended after these, never ahead of them.
pub static DEFAULT_RULES: Lazy<Vec<FloatRule>> = Lazy::new(|| {
    [
        "confirm",
        "dialog",
        "download",
        "error",
        "file_progress",
        "notification",
        "splash",
        "toolbar",
    ]
    .into_iter()
    .map(FloatRule::class)
    .collect()
});

/// Decide whether a window floats. Rules are evaluated strictly in order,
/// defaults before `user_rules`, short-circuiting on the first match.
pub fn classify(class: &str, title: &str, user_rules: &[FloatRule]) -> bool {
    DEFAULT_RULES
        .iter()
        .chain(user_rules.iter())
        .find(|rule| rule.matches(class, title))
        .map(|rule| rule.floating)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_window_is_managed() {
        assert!(!classify("firefox", "Mozilla Firefox", &[]));
    }

    #[test]
    fn test_default_rules_float_dialogs() {
        assert!(classify("dialog", "anything", &[]));
        assert!(classify("splash", "", &[]));
    }

    #[test]
    fn test_user_class_rule() {
        let rules = vec![FloatRule::class("ssh-askpass")];
        assert!(classify("ssh-askpass", "OpenSSH", &rules));
        assert!(!classify("ssh", "OpenSSH", &rules));
    }

    #[test]
    fn test_user_title_rule() {
        let rules = vec![FloatRule::title("pinentry")];
        assert!(classify("gcr-prompter", "pinentry", &rules));
        assert!(!classify("gcr-prompter", "unlock", &rules));
    }

    #[test]
    fn test_first_matching_rule_wins() {
        // both rules match; the first declares managed, and wins
        let rules = vec![
            FloatRule {
                match_field: MatchField::Class,
                pattern: "scratch".to_string(),
                floating: false,
            },
            FloatRule::class("scratch"),
        ];
        assert!(!classify("scratch", "", &rules));

        // reversed declaration order flips the outcome
        let reversed: Vec<FloatRule> = rules.into_iter().rev().collect();
        assert!(classify("scratch", "", &reversed));
    }

    #[test]
    fn test_defaults_precede_user_rules() {
        // a user rule cannot reorder itself ahead of the built-ins
        let rules = vec![FloatRule {
            match_field: MatchField::Class,
            pattern: "dialog".to_string(),
            floating: false,
        }];
        assert!(classify("dialog", "", &rules));
    }

    #[test]
    fn test_rule_serde_defaults_floating_true() {
        let rule: FloatRule =
            toml::from_str(r#"match_field = "class"
pattern = "mpv""#)
            .unwrap();
        assert!(rule.floating);
        assert_eq!(rule.match_field, MatchField::Class);
    }
}
