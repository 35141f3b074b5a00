//! Client configuration.
//! This module handles parsing, validation and persistence of the
//! ~/.config/focusbridge/focusbridge.json configuration file.

mod io;
mod model;
mod validation;

pub use io::{default_config_path, default_scripts_dir, load_config, load_config_from_path, save_config_to_path};
pub use model::{ClientConfig, ConfigError};
pub use validation::{ValidationError, validate_application_name, validate_config};
