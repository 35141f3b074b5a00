//! Configuration validation.

use crate::config::ClientConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

/// Validate the entire configuration.
pub fn validate_config(config: &ClientConfig) -> Result<(), ValidationError> {
    validate_application_name(&config.application)?;

    if config.interpreter.trim().is_empty() {
        return Err(ValidationError::Empty {
            field: "interpreter".to_string(),
        });
    }
    if config.max_attempts == 0 {
        return Err(ValidationError::OutOfRange {
            field: "maxAttempts".to_string(),
            reason: "at least one attempt is required".to_string(),
        });
    }
    if config.invocation_timeout_ms == 0 {
        return Err(ValidationError::OutOfRange {
            field: "invocationTimeoutMs".to_string(),
            reason: "must be positive".to_string(),
        });
    }
    if config.probe_interval_secs == 0 {
        return Err(ValidationError::OutOfRange {
            field: "probeIntervalSecs".to_string(),
            reason: "must be positive".to_string(),
        });
    }
    if config.cache.max_entries == 0 {
        return Err(ValidationError::OutOfRange {
            field: "cache.maxEntries".to_string(),
            reason: "the cache must hold at least one entry".to_string(),
        });
    }

    debug!(application = %config.application, "validated client configuration");
    Ok(())
}

static APPLICATION_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9 ._-]+$").expect("application name regex should compile"));

/// Validate an application name. The name ends up inside probe scripts.
pub fn validate_application_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::Empty {
            field: "application".to_string(),
        });
    }

    if !APPLICATION_NAME_REGEX.is_match(name) {
        return Err(ValidationError::InvalidApplicationName {
            name: name.to_string(),
            reason: "Application name must contain only letters, numbers, spaces, dots, underscores, and hyphens"
                .to_string(),
        });
    }

    Ok(())
}

/// Errors that can occur during validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid application name '{name}': {reason}")]
    InvalidApplicationName { name: String, reason: String },

    #[error("Field '{field}' cannot be empty")]
    Empty { field: String },

    #[error("Field '{field}' is out of range: {reason}")]
    OutOfRange { field: String, reason: String },
}
