//! Plugin registration records and the extension entry-point contract.

use std::sync::Arc;

use crucible_core::ServiceRegistry;
use futures::future::BoxFuture;
use linkme::distributed_slice;
use serde::Deserialize;

use crate::config::ConfigView;

/// Future returned by a plugin entry point.
pub type ExtensionFuture = BoxFuture<'static, anyhow::Result<()>>;

/// The extension entry point: invoked with the live registry and a
/// configuration view bound to the plugin's settings prefix.
///
/// The entry point may register factories, compose existing keys, and read
/// or write its own configuration sub-tree.  It runs to completion before
/// the next plugin is invoked.
pub type ExtensionFn = fn(Arc<ServiceRegistry>, ConfigView) -> ExtensionFuture;

/// Static registration record for a plugin linked into the binary.
///
/// ```rust,ignore
/// #[distributed_slice(PLUGIN_REGISTRY)]
/// static SHOUT: PluginRegistration = PluginRegistration {
///     name: "shout",
///     entry: shout_entry,
/// };
/// ```
pub struct PluginRegistration {
    /// Name the plugin is addressed by in the configured plugin list.
    pub name: &'static str,
    /// The extension entry point.
    pub entry: ExtensionFn,
}

/// Registry of linked plugin entry points.  Each crate that ships a plugin
/// contributes one entry.
#[distributed_slice]
pub static PLUGIN_REGISTRY: [PluginRegistration];

/// One plugin descriptor from the configured `plugins` list.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginSetting {
    /// Name of the loadable unit.
    pub name: String,
    /// Configuration prefix the plugin is bound to; defaults to the name.
    #[serde(default)]
    pub settings_prefix: Option<String>,
}

impl PluginSetting {
    /// The configuration prefix this plugin's view is bound to.
    pub fn prefix(&self) -> &str {
        self.settings_prefix.as_deref().unwrap_or(&self.name)
    }
}
