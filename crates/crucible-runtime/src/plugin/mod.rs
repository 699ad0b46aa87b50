//! Plugin extension protocol.
//!
//! # Architecture
//!
//! Plugins extend the service graph at bootstrap time without being compiled
//! into the composition root.  The protocol has three separable pieces:
//!
//! - A **descriptor** from configuration (`plugins` list) naming each unit
//!   and, optionally, the configuration prefix it is confined to.
//! - A **loader capability** ([`PluginLoader`]) that maps a name to a
//!   definite outcome — not installed, installed-but-uninvocable, or a ready
//!   [`ExtensionFn`].  The uncertain lookup step lives entirely behind this
//!   trait, so the host logic stays deterministic and testable.
//! - The **host** ([`apply_plugins`]) that walks the configured list in
//!   order and invokes each loaded entry point with the live registry and a
//!   view bound to its own settings sub-tree, awaiting each before the next.
//!
//! A plugin that is not installed is skipped — "not installed" and
//! "misconfigured" are deliberately different outcomes.  A unit that loads
//! but cannot be invoked, and any error a plugin raises itself, abort the
//! bootstrap naming the plugin.
//!
//! # Shipping a plugin
//!
//! ```rust,ignore
//! use crucible_runtime::plugin::{PLUGIN_REGISTRY, PluginRegistration};
//! use linkme::distributed_slice;
//!
//! fn entry(registry: Arc<ServiceRegistry>, config: ConfigView) -> ExtensionFuture {
//!     Box::pin(async move {
//!         registry.compose_factory(keys::MIDDLEWARES, &[], |_, current| async move {
//!             Ok(into_instance(MiddlewareSet::from_instance(current)?.with(MyMiddleware)))
//!         });
//!         Ok(())
//!     })
//! }
//!
//! #[distributed_slice(PLUGIN_REGISTRY)]
//! static MY_PLUGIN: PluginRegistration = PluginRegistration { name: "my-plugin", entry };
//! ```

pub mod descriptor;
pub mod error;
pub mod host;
pub mod loader;

pub use descriptor::{
    ExtensionFn, ExtensionFuture, PLUGIN_REGISTRY, PluginRegistration, PluginSetting,
};
pub use error::{PluginError, PluginResult};
pub use host::{PLUGINS_PATH, apply_plugins};
pub use loader::{LinkedPluginLoader, PluginLoad, PluginLoader, StaticPluginLoader};
