//! Plugin protocol error types.

use thiserror::Error;

/// Errors raised while applying configured plugins.
///
/// A plugin that is simply not installed is *not* an error — the host skips
/// it.  These variants cover the fatal paths: a declared plugin that cannot
/// be invoked, and a plugin whose own extension logic failed.
#[derive(Error, Debug)]
pub enum PluginError {
    /// The unit loaded but exposes no callable extension entry point.
    #[error("Plugin '{plugin}' declares no extension entry point")]
    MissingEntryPoint {
        /// The configured plugin name.
        plugin: String,
    },

    /// The plugin's extension function failed while extending the registry.
    #[error("Plugin '{plugin}' failed while extending the service graph")]
    Extension {
        /// The configured plugin name.
        plugin: String,
        /// The plugin's own error.
        #[source]
        source: anyhow::Error,
    },
}

/// Result type for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;
