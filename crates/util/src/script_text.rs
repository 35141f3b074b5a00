//! Script text preparation: parameter injection and invocation escaping.
//!
//! Callers must inject parameters before escaping the finished script for
//! the shell. Injected string literals carry their own quotes, and those
//! quotes only survive if the shell escaping sees them.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use tracing::debug;

static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([A-Za-z_][A-Za-z0-9_]*)\}\}").expect("placeholder regex should compile"));

/// Substitute every `{{name}}` token whose name is a key of `params`.
///
/// Strings are injected as double-quoted literals, every other value as its
/// JSON encoding. Tokens without a matching parameter are left in place.
pub fn inject_parameters(script: &str, params: &Map<String, Value>) -> String {
    // Single pass: injected text is never rescanned for tokens.
    let mut missing: Vec<String> = Vec::new();
    let injected = PLACEHOLDER_REGEX
        .replace_all(script, |caps: &Captures| match params.get(&caps[1]) {
            Some(Value::String(text)) => quote_string_literal(text),
            Some(other) => other.to_string(),
            None => {
                missing.push(caps[1].to_string());
                caps[0].to_string()
            }
        })
        .into_owned();

    if !missing.is_empty() {
        debug!(placeholders = ?missing, "script contains placeholders without parameters");
    }
    injected
}

/// Render `text` as a double-quoted script string literal.
pub fn quote_string_literal(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

/// Quote `text` as a single POSIX shell word.
pub fn shell_single_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "'\\''"))
}

/// Names of `{{name}}` tokens still present in `script`.
pub fn unresolved_placeholders(script: &str) -> Vec<String> {
    PLACEHOLDER_REGEX
        .captures_iter(script)
        .map(|capture| capture[1].to_string())
        .collect()
}
