//! Error types for bridge operations.

use focusbridge_types::{ErrorInfo, ErrorKind, codes};
use thiserror::Error;

/// Error surfaced to callers of the client.
///
/// `Script` and `Connectivity` display the underlying diagnostic text
/// verbatim so nothing is lost between the interpreter and the caller.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("{0}")]
    Script(ErrorInfo),

    #[error("{message}")]
    Connectivity { message: String },

    #[error("Failed to decode {operation} response: {source}")]
    Decode {
        operation: String,
        #[source]
        source: serde_json::Error,
    },
}

impl BridgeError {
    /// Create a connectivity error.
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::Connectivity { message: message.into() }
    }

    /// Create a decode error.
    pub fn decode(operation: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            operation: operation.into(),
            source,
        }
    }

    /// Classified error information, when the failure came from a script.
    pub fn error_info(&self) -> Option<&ErrorInfo> {
        match self {
            BridgeError::Script(info) => Some(info),
            _ => None,
        }
    }

    /// Stable error code for envelopes and logs.
    pub fn code(&self) -> &str {
        match self {
            BridgeError::Script(info) => &info.code,
            BridgeError::Connectivity { .. } => codes::APP_UNAVAILABLE,
            BridgeError::Decode { .. } => codes::SCRIPT_ERROR,
        }
    }

    /// Error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::Script(info) => info.kind,
            BridgeError::Connectivity { .. } => ErrorKind::AppUnavailable,
            BridgeError::Decode { .. } => ErrorKind::ScriptError,
        }
    }

    /// Whether a script reported the requested entity as missing.
    pub fn is_not_found(&self) -> bool {
        self.error_info().is_some_and(ErrorInfo::is_not_found)
    }
}

impl From<ErrorInfo> for BridgeError {
    fn from(info: ErrorInfo) -> Self {
        Self::Script(info)
    }
}

/// Errors resolving a named script to its source text.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Invalid script name '{name}': names may not contain path separators")]
    InvalidName { name: String },

    #[error("Failed to load script '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Script '{name}' is not registered")]
    Unknown { name: String },
}

impl LoadError {
    /// Create an invalid name error.
    pub fn invalid_name(name: impl Into<String>) -> Self {
        Self::InvalidName { name: name.into() }
    }

    /// Create an unknown script error.
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::Unknown { name: name.into() }
    }
}
