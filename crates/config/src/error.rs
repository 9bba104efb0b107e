//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        /// Path that was attempted
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The TOML could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range or internally inconsistent.
    #[error("invalid config: {0}")]
    Invalid(String),
}
