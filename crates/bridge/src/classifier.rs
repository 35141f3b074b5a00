//! Error classification for raw interpreter failures.
//!
//! Rules are matched case-insensitively against the message followed by the
//! auxiliary diagnostic text. The first rule with a matching needle wins;
//! nothing matching yields `Unknown`.
//!
//! Rule two matches the substring "not found", which has nothing to do with
//! the `NOT_FOUND` code that lookup scripts emit in their own envelope.

use focusbridge_types::{ErrorInfo, ErrorKind};

/// One ordered classification rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationRule {
    /// Lower-case substrings, any of which selects `kind`.
    pub needles: &'static [&'static str],
    pub kind: ErrorKind,
}

impl ClassificationRule {
    fn matches(&self, haystack: &str) -> bool {
        self.needles.iter().any(|needle| haystack.contains(needle))
    }
}

/// Classification rules in evaluation order.
pub const RULES: &[ClassificationRule] = &[
    ClassificationRule {
        needles: &["not authorized", "permission"],
        kind: ErrorKind::Permission,
    },
    ClassificationRule {
        needles: &["application is not running", "not found"],
        kind: ErrorKind::AppUnavailable,
    },
    ClassificationRule {
        needles: &["syntax error", "execution error"],
        kind: ErrorKind::ScriptError,
    },
];

/// Kind selected by the rule table for `text`.
pub fn classify_kind(message: &str, auxiliary: &str) -> ErrorKind {
    let haystack = format!("{} {}", message, auxiliary).to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.matches(&haystack))
        .map(|rule| rule.kind)
        .unwrap_or(ErrorKind::Unknown)
}

/// Classify a failure; the returned message is `message` unchanged.
pub fn classify(message: &str, auxiliary: &str) -> ErrorInfo {
    ErrorInfo::new(classify_kind(message, auxiliary), message)
}
