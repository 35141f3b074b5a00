//! Data model for client configuration.

use focusbridge_cache::CacheConfig;
use focusbridge_util::expand_tilde;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::config::default_scripts_dir;
use crate::script::BridgeSettings;

/// Settings for a [`FocusClient`](crate::FocusClient).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ClientConfig {
    /// Name of the scripted application, injected into probe scripts.
    pub application: String,
    /// Interpreter command the escaped script is appended to.
    pub interpreter: String,
    /// Directory holding named scripts (`<name>.js`). Defaults to
    /// `<config_dir>/focusbridge/scripts`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scripts_dir: Option<PathBuf>,
    pub invocation_timeout_ms: u64,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub unavailable_retry_delay_ms: u64,
    pub probe_interval_secs: u64,
    pub cache: CacheConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            application: "OmniFocus".to_string(),
            interpreter: "osascript -l JavaScript".to_string(),
            scripts_dir: None,
            invocation_timeout_ms: 10_000,
            max_attempts: 3,
            backoff_base_ms: 1_000,
            unavailable_retry_delay_ms: 1_000,
            probe_interval_secs: 30,
            cache: CacheConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn invocation_timeout(&self) -> Duration {
        Duration::from_millis(self.invocation_timeout_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn unavailable_retry_delay(&self) -> Duration {
        Duration::from_millis(self.unavailable_retry_delay_ms)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }

    /// Resolved script directory, with `~` expanded.
    pub fn resolved_scripts_dir(&self) -> PathBuf {
        match &self.scripts_dir {
            Some(dir) => expand_tilde(&dir.to_string_lossy()),
            None => default_scripts_dir(),
        }
    }

    /// Settings for the script bridge derived from this configuration.
    pub fn bridge_settings(&self) -> BridgeSettings {
        BridgeSettings {
            interpreter: self.interpreter.clone(),
            invocation_timeout: self.invocation_timeout(),
            unavailable_retry_delay: self.unavailable_retry_delay(),
        }
    }
}

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] crate::config::ValidationError),
}
