//! Bootstrap error types.

use thiserror::Error;

use crate::config::ConfigError;
use crate::plugin::PluginError;
use crucible_core::RegistryError;

/// Any fatal condition encountered while composing the service graph.
///
/// There is no partial-success mode: a bootstrap either registers the full
/// graph or the host must exit non-zero with this diagnostic.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// A mandatory setting is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A structural registry error (duplicate factory, cycle, missing
    /// producer) or a failed factory.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A plugin contract violation or plugin-raised failure.
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// A backend selection string names no known implementation.
    #[error("Unknown {slot} backend '{value}'")]
    UnknownBackend {
        /// Which selection the value came from (e.g. "storage").
        slot: &'static str,
        /// The configured value.
        value: String,
    },
}

/// Result type for bootstrap operations.
pub type BootstrapResult<T> = Result<T, BootstrapError>;
