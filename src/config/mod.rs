//! Configuration file loading and parsing.
//!
//! This module handles loading the configuration file from disk and parsing
//! it into validated, type-safe structures.
//!
//! # Configuration File Locations
//!
//! The configuration file is searched in the following order:
//!
//! 1. Path specified via `--config` CLI flag (must exist)
//! 2. Default location (optional, defaults are used when absent):
//!    - **Linux/macOS:** `~/.via-fanout/config.json`
//!    - **Windows:** `%USERPROFILE%\.via-fanout\config.json`
//!
//! # Example Configuration
//!
//! ```json
//! {
//!   "placement": { "grid_spacing": 5.0, "default_pitch": 40.0 },
//!   "picking": { "snap_distance_px": 10.0, "zoom_scale": 10.0 },
//!   "validation": { "strict_references": false },
//!   "logging": { "level": "warn" }
//! }
//! ```

mod settings;

pub use settings::{Config, LoggingConfig, PickingConfig, PlacementConfig, ValidationConfig};

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Returns the default configuration directory.
///
/// - **Linux/macOS:** `~/.via-fanout/`
/// - **Windows:** `%USERPROFILE%\.via-fanout\`
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".via-fanout"))
}

/// Returns the platform-specific default configuration file path.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join("config.json"))
}

/// Loads and parses a configuration file.
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist
/// - The file cannot be read
/// - The JSON is malformed
/// - Any value fails validation
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: Config = serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    // Validate the configuration
    config.validate()?;

    tracing::debug!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Loads the explicit configuration file, or the default one if present.
///
/// An explicit path must exist. A missing default file (or no home
/// directory) yields the built-in defaults.
///
/// # Errors
///
/// Returns an error if the chosen file cannot be loaded or is invalid.
pub fn load_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = path {
        return load_config(path);
    }

    match default_config_path() {
        Some(default) if default.exists() => load_config(&default),
        _ => {
            tracing::debug!("No configuration file, using defaults");
            Ok(Config::default())
        }
    }
}
