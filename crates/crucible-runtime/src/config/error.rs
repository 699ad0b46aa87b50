//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or reading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// A configuration source could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// A value the caller declared mandatory is absent from every source.
    #[error("Required configuration value '{path}' is missing")]
    MissingRequired {
        /// Full dotted path of the missing value.
        path: String,
    },

    /// A value the caller declared mandatory is present but shape-invalid.
    #[error("Configuration value '{path}' is invalid: {reason}")]
    InvalidValue {
        /// Full dotted path of the invalid value.
        path: String,
        /// Why deserialization rejected it.
        reason: String,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
