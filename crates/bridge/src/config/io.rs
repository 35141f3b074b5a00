//! Configuration IO helpers.

use crate::config::{ClientConfig, ConfigError, validate_config};
use dirs_next::config_dir;
use focusbridge_util::expand_tilde;
use std::env;
use std::fs;
use std::fs::{create_dir_all, write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Returns the default path for the configuration file.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var("FOCUSBRIDGE_CONFIG_PATH")
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    base_dir().join("focusbridge.json")
}

/// Returns the directory named scripts are read from when none is configured.
pub fn default_scripts_dir() -> PathBuf {
    base_dir().join("scripts")
}

fn base_dir() -> PathBuf {
    config_dir().unwrap_or_else(|| PathBuf::from(".")).join("focusbridge")
}

/// Loads configuration from the default path.
pub fn load_config() -> Result<ClientConfig, ConfigError> {
    let path = default_config_path();
    load_config_from_path(&path)
}

/// Loads configuration from a specific path. A missing file yields defaults.
pub fn load_config_from_path(path: &Path) -> Result<ClientConfig, ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), "no configuration file, using defaults");
        return Ok(ClientConfig::default());
    }

    let content = fs::read_to_string(path)?;
    let config: ClientConfig = serde_json::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Saves configuration to a specific path.
pub fn save_config_to_path(config: &ClientConfig, path: &Path) -> Result<(), ConfigError> {
    validate_config(config)?;
    if let Some(parent_directory) = path.parent() {
        create_dir_all(parent_directory)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    write(path, content)?;
    Ok(())
}
