//! # Crucible
//!
//! A composition-root kernel for conversational runtimes.
//!
//! ## Overview
//!
//! Crucible builds a graph of named, lazily-constructed services from layered
//! configuration, and lets independently developed plugins extend that graph
//! at bootstrap time without recompilation of the host.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐    ┌──────────────────┐    ┌─────────────────────────┐
//! │ Configuration │───▶│   Bootstrap      │───▶│ ServiceRegistry         │
//! │ (cli/env/file │    │ (baseline        │    │  factories + composers  │
//! │  + overrides) │    │  factories, then │    │  resolved lazily,       │
//! └───────────────┘    │  plugins in      │    │  memoized per key       │
//!                      │  listed order)   │    └─────────────────────────┘
//!                      └──────────────────┘
//! ```
//!
//! - **Registry**: one flat name-keyed store; one initial factory per key,
//!   any number of order-preserving composers
//! - **Configuration**: precedence-ordered immutable sources plus a mutable
//!   override layer, projected through prefix-bound views
//! - **Plugins**: loaded by an injectable loader, invoked sequentially with
//!   the registry and their own configuration sub-tree
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use crucible::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().with_current_dir().load()?;
//!     let registry = build_runtime(&config, &LinkedPluginLoader).await?;
//!
//!     let adapter = registry.resolve_as::<Adapter>(keys::ADAPTER).await?;
//!     let bot = registry.resolve_as::<Shared<dyn Bot>>(keys::BOT).await?;
//!
//!     let responses = adapter
//!         .process_activity(Activity::message("hello"), bot.0.as_ref())
//!         .await?;
//!     Ok(())
//! }
//! ```

pub use crucible_core as core;
pub use crucible_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use crucible::prelude::*;
/// ```
pub mod prelude {
    // Registry - the composition core
    pub use crucible_core::{
        RegistryError, ResolvedServices, ServiceInstance, ServiceRegistry, Shared, into_instance,
    };

    // Configuration - layered sources and scoped views
    pub use crucible_runtime::config::{ConfigLoader, ConfigView, Configuration};

    // Plugin protocol - registration records and loaders
    pub use crucible_runtime::plugin::{
        ExtensionFn, ExtensionFuture, LinkedPluginLoader, PLUGIN_REGISTRY, PluginRegistration,
        StaticPluginLoader,
    };

    // Bootstrap - the composition root
    pub use crucible_runtime::bootstrap::build_runtime;
    pub use crucible_runtime::error::{BootstrapError, BootstrapResult};

    // Baseline service surfaces and their well-known keys
    pub use crucible_runtime::services::keys;
    pub use crucible_runtime::services::{
        Activity, Adapter, Bot, Middleware, MiddlewareSet, Storage, Telemetry, TurnContext,
    };
}
