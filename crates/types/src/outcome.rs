//! Outcome envelope and classified error information.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::fmt;

/// Stable machine-readable error codes.
pub mod codes {
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    pub const APP_UNAVAILABLE: &str = "APP_UNAVAILABLE";
    pub const SCRIPT_ERROR: &str = "SCRIPT_ERROR";
    pub const TIMEOUT: &str = "TIMEOUT";
    pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";
    /// Supplied by scripts for single-entity lookups, never by the classifier.
    pub const NOT_FOUND: &str = "NOT_FOUND";
}

/// Category of a failed invocation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Automation permission was not granted to the interpreter.
    Permission,
    /// The application is not running or could not be reached.
    AppUnavailable,
    /// The script itself is malformed or failed while executing.
    ScriptError,
    /// The invocation exceeded its wall-clock budget.
    Timeout,
    /// Anything the classifier could not place.
    Unknown,
}

impl ErrorKind {
    /// Default error code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Permission => codes::PERMISSION_DENIED,
            ErrorKind::AppUnavailable => codes::APP_UNAVAILABLE,
            ErrorKind::ScriptError => codes::SCRIPT_ERROR,
            ErrorKind::Timeout => codes::TIMEOUT,
            ErrorKind::Unknown => codes::UNKNOWN_ERROR,
        }
    }

    /// Parse the wire `type` string; unrecognized values map to `Unknown`.
    pub fn from_wire(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "PERMISSION" | "PERMISSION_DENIED" => ErrorKind::Permission,
            "APP_UNAVAILABLE" => ErrorKind::AppUnavailable,
            "SCRIPT_ERROR" => ErrorKind::ScriptError,
            "TIMEOUT" => ErrorKind::Timeout,
            _ => ErrorKind::Unknown,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorKind::Permission => "permission",
            ErrorKind::AppUnavailable => "app unavailable",
            ErrorKind::ScriptError => "script error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(text)
    }
}

/// Classified failure carried by a [`ScriptOutcome`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Machine-readable token, see [`codes`].
    pub code: String,

    /// Error category.
    #[serde(rename = "type")]
    pub kind: ErrorKind,

    /// The original diagnostic text, unmodified.
    #[serde(rename = "originalMessage")]
    pub message: String,
}

impl ErrorInfo {
    /// Build an error using the default code for `kind`.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            code: kind.code().to_string(),
            kind,
            message: message.into(),
        }
    }

    /// Build an error with an explicit code, as scripts do for `NOT_FOUND`.
    pub fn with_code(code: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            kind,
            message: message.into(),
        }
    }

    /// Whether a script reported the requested entity as missing.
    pub fn is_not_found(&self) -> bool {
        self.code == codes::NOT_FOUND
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result envelope produced once per script invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScriptOutcome<T = Value> {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl<T> ScriptOutcome<T> {
    /// Successful outcome; `None` data is a valid absence result.
    pub fn ok(data: Option<T>) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    /// Failed outcome.
    pub fn failed(error: ErrorInfo) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }

    /// Kind of the carried error, if any.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|error| error.kind)
    }

    /// Convert into a `Result`. Successful outcomes yield their (optional) data.
    pub fn into_result(self) -> Result<Option<T>, ErrorInfo> {
        if self.success {
            return Ok(self.data);
        }
        Err(self
            .error
            .unwrap_or_else(|| ErrorInfo::new(ErrorKind::Unknown, "script failed without error details")))
    }
}

impl ScriptOutcome<Value> {
    /// Decode the JSON payload into a concrete type.
    pub fn decode<T: DeserializeOwned>(self) -> Result<ScriptOutcome<T>, serde_json::Error> {
        let data = match self.data {
            Some(value) => Some(serde_json::from_value(value)?),
            None => None,
        };
        Ok(ScriptOutcome {
            success: self.success,
            data,
            error: self.error,
        })
    }
}
