//! Crucible Runtime - configuration, plugins, and the bootstrap composition root.
//!
//! This crate provides:
//! - Layered configuration with scoped views (`config`)
//! - The plugin extension protocol (`plugin`)
//! - Baseline service surfaces and well-known keys (`services`)
//! - The composition root that wires it all together (`bootstrap`)
//! - Logging initialization from configuration (`logging`)
//!
//! # Composing a host
//!
//! ```rust,ignore
//! use crucible_runtime::bootstrap::build_runtime;
//! use crucible_runtime::config::ConfigLoader;
//! use crucible_runtime::plugin::LinkedPluginLoader;
//! use crucible_runtime::services::keys;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new()
//!         .with_current_dir()
//!         .args(std::env::args().skip(1))
//!         .load()?;
//!
//!     let registry = build_runtime(&config, &LinkedPluginLoader).await?;
//!
//!     // Nothing was constructed yet; this resolves the adapter and its
//!     // whole dependency chain on first access.
//!     let adapter = registry.resolve_as::<Adapter>(keys::ADAPTER).await?;
//!     Ok(())
//! }
//! ```

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod logging;
pub mod plugin;
pub mod services;

// Re-exports
pub use bootstrap::build_runtime;
pub use config::{ConfigError, ConfigLoader, ConfigResult, ConfigView, Configuration, Profile};
pub use error::{BootstrapError, BootstrapResult};
pub use plugin::{
    ExtensionFn, ExtensionFuture, LinkedPluginLoader, PLUGIN_REGISTRY, PluginError, PluginLoad,
    PluginLoader, PluginRegistration, PluginSetting, StaticPluginLoader, apply_plugins,
};
pub use services::keys;
