//! Error types for via-fanout.
//!
//! Geometry never fails; these errors only cover loading configuration and
//! design files and the strict reference check. Store mutations have their
//! own [`StoreError`](crate::model::StoreError).

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Errors that can occur while loading or checking a design file.
#[derive(Error, Debug)]
pub enum ProjectError {
    /// Design file could not be read.
    #[error("failed to read design file: {path}")]
    ReadError {
        /// Path to the design file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Design file could not be parsed.
    #[error("failed to parse design file: {path}")]
    ParseError {
        /// Path to the design file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Strict mode found broken references.
    #[error("design has {count} reference issue(s)")]
    StrictReferences {
        /// Number of issues found.
        count: usize,
    },
}
