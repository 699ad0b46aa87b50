//! Plugin loader capability.
//!
//! Loading a plugin is the only uncertain, environment-dependent step of the
//! extension protocol, so it is isolated behind the [`PluginLoader`] trait:
//! a loader maps a configured name to a definite outcome, and the host
//! applies whatever the loader found.  Tests and embedders inject
//! [`StaticPluginLoader`]; production binaries use [`LinkedPluginLoader`],
//! which consults the link-time [`PLUGIN_REGISTRY`] slice.

use std::collections::HashMap;

use tracing::warn;

use super::descriptor::{ExtensionFn, PLUGIN_REGISTRY};

/// Outcome of looking up one plugin by name.
pub enum PluginLoad {
    /// The named unit is not installed.  The host skips it.
    NotFound,
    /// The unit exists but exposes no callable entry point.  Fatal: the
    /// operator declared a plugin that cannot be invoked.
    NoEntryPoint,
    /// The unit's extension entry point, ready to invoke.
    Loaded(ExtensionFn),
}

/// Maps a plugin name to a loadable extension entry point.
pub trait PluginLoader: Send + Sync {
    /// Looks up `name` and reports what was found.
    fn load(&self, name: &str) -> PluginLoad;
}

/// Loader over the entry points linked into the current binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkedPluginLoader;

impl PluginLoader for LinkedPluginLoader {
    fn load(&self, name: &str) -> PluginLoad {
        let mut matches = PLUGIN_REGISTRY.iter().filter(|reg| reg.name == name);
        let Some(first) = matches.next() else {
            return PluginLoad::NotFound;
        };
        if matches.next().is_some() {
            warn!(plugin = %name, "Duplicate plugin registration - first one wins");
        }
        PluginLoad::Loaded(first.entry)
    }
}

/// Explicit name-to-entry-point map, for tests and embedders that assemble
/// their plugin set programmatically.
#[derive(Default)]
pub struct StaticPluginLoader {
    entries: HashMap<String, Option<ExtensionFn>>,
}

impl StaticPluginLoader {
    /// Creates an empty loader; every lookup reports `NotFound`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an invocable entry point under `name`.
    pub fn with_plugin(mut self, name: impl Into<String>, entry: ExtensionFn) -> Self {
        self.entries.insert(name.into(), Some(entry));
        self
    }

    /// Registers a unit that loads but exposes no entry point — the fatal
    /// contract-violation case.
    pub fn with_opaque_unit(mut self, name: impl Into<String>) -> Self {
        self.entries.insert(name.into(), None);
        self
    }
}

impl PluginLoader for StaticPluginLoader {
    fn load(&self, name: &str) -> PluginLoad {
        match self.entries.get(name) {
            None => PluginLoad::NotFound,
            Some(None) => PluginLoad::NoEntryPoint,
            Some(Some(entry)) => PluginLoad::Loaded(*entry),
        }
    }
}
