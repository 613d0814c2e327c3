//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::PlacementOptions;

/// Log levels accepted in `logging.level`.
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Root configuration structure.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Placement defaults.
    #[serde(default)]
    pub placement: PlacementConfig,

    /// Snapping and zoom settings.
    #[serde(default)]
    pub picking: PickingConfig,

    /// Reference validation settings.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("placement.grid_spacing", self.placement.grid_spacing),
            ("placement.default_pitch", self.placement.default_pitch),
            ("picking.zoom_scale", self.picking.zoom_scale),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::ValidationError {
                    message: format!("{field} must be a positive number, got {value}"),
                });
            }
        }

        let snap = self.picking.snap_distance_px;
        if !(snap.is_finite() && snap >= 0.0) {
            return Err(ConfigError::ValidationError {
                message: format!("picking.snap_distance_px must not be negative, got {snap}"),
            });
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            });
        }
        Ok(())
    }

    /// Placement options derived from the `placement` section.
    #[must_use]
    pub const fn placement_options(&self) -> PlacementOptions {
        PlacementOptions {
            grid_spacing: self.placement.grid_spacing,
            default_pitch: self.placement.default_pitch,
        }
    }
}

/// Placement configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlacementConfig {
    /// Grid new instances snap to.
    #[serde(default = "default_grid_spacing")]
    pub grid_spacing: f64,

    /// Via pitch for newly placed differential pairs.
    #[serde(default = "default_pitch")]
    pub default_pitch: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            grid_spacing: default_grid_spacing(),
            default_pitch: default_pitch(),
        }
    }
}

const fn default_grid_spacing() -> f64 {
    5.0
}

const fn default_pitch() -> f64 {
    40.0
}

/// Picking configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PickingConfig {
    /// Snap reach in screen pixels.
    #[serde(default = "default_snap_distance")]
    pub snap_distance_px: f64,

    /// Pixels per board unit used to convert the snap reach.
    #[serde(default = "default_zoom_scale")]
    pub zoom_scale: f64,
}

impl Default for PickingConfig {
    fn default() -> Self {
        Self {
            snap_distance_px: default_snap_distance(),
            zoom_scale: default_zoom_scale(),
        }
    }
}

const fn default_snap_distance() -> f64 {
    10.0
}

const fn default_zoom_scale() -> f64 {
    10.0
}

/// Reference validation configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Refuse to route designs with broken references.
    #[serde(default)]
    pub strict_references: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
