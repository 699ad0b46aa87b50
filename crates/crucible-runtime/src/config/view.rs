//! The merged configuration store and its scoped views.
//!
//! [`Configuration`] owns an ordered list of immutable [`ConfigSource`]
//! layers (highest precedence first) plus one mutable *override* layer that
//! outranks them all.  [`ConfigView`] is a path-scoped projection over that
//! shared store: `bind(prefix)` produces a view whose reads and writes are
//! implicitly prefixed, which is how a plugin is confined to its own
//! configuration sub-tree.
//!
//! Typed reads are fail-soft: a value that is present but shape-invalid is
//! treated as absent, so optional structured settings can simply be omitted.
//! Callers that require a value use [`ConfigView::require_typed`], which
//! converts absence (or invalidity) into a fatal error naming the path.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use super::error::{ConfigError, ConfigResult};
use super::source::{ConfigSource, insert_at, split_path, value_at};

struct ConfigStore {
    /// Bootstrap-computed values; checked before every configured source.
    overrides: RwLock<Value>,
    /// Configured sources, highest precedence first.
    layers: Vec<ConfigSource>,
}

/// Handle to one merged configuration store.
#[derive(Clone)]
pub struct Configuration {
    store: Arc<ConfigStore>,
}

impl Configuration {
    /// Builds a configuration from precedence-ordered layers (highest first).
    pub fn new(layers: Vec<ConfigSource>) -> Self {
        Self {
            store: Arc::new(ConfigStore {
                overrides: RwLock::new(Value::Object(Map::new())),
                layers,
            }),
        }
    }

    /// A configuration with no sources; reads come back absent until `set`.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Returns the root (unprefixed) view over this store.
    pub fn view(&self) -> ConfigView {
        ConfigView {
            store: Arc::clone(&self.store),
            prefix: Vec::new(),
        }
    }
}

/// A scoped read/write projection over a shared [`Configuration`] store.
///
/// Views are cheap to clone; every view over one store observes the same
/// override writes.  `bind` composition is associative:
/// `view.bind("a").bind("b")` reads exactly what `view.bind("a.b")` reads.
#[derive(Clone)]
pub struct ConfigView {
    store: Arc<ConfigStore>,
    prefix: Vec<String>,
}

impl ConfigView {
    /// Returns a view whose paths are implicitly prefixed by `prefix`.
    pub fn bind(&self, prefix: &str) -> ConfigView {
        let mut full = self.prefix.clone();
        full.extend(split_path(prefix));
        ConfigView {
            store: Arc::clone(&self.store),
            prefix: full,
        }
    }

    /// Returns the raw value at `path`, taken from the override layer first
    /// and otherwise from the highest-precedence source that defines it.
    pub fn get(&self, path: &str) -> Option<Value> {
        let full = self.full_path(path);

        {
            let overrides = self.store.overrides.read();
            if let Some(value) = value_at(&overrides, &full) {
                return Some(value.clone());
            }
        }

        self.store
            .layers
            .iter()
            .find_map(|layer| value_at(layer.tree(), &full).cloned())
    }

    /// Returns the typed value at `path`, or `None` when it is absent *or*
    /// fails shape validation.  The two cases are deliberately merged so
    /// optional sections can be omitted outright; a malformed value is still
    /// distinguishable in traces via the debug diagnostic emitted here.
    pub fn get_typed<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        let raw = self.get(path)?;
        match serde_json::from_value(raw) {
            Ok(value) => Some(value),
            Err(error) => {
                debug!(
                    path = %self.dotted(path),
                    %error,
                    "Configuration value failed shape validation - treated as absent"
                );
                None
            }
        }
    }

    /// Returns the typed value at `path`, converting absence or invalidity
    /// into a fatal [`ConfigError`] naming the full dotted path.
    pub fn require_typed<T: DeserializeOwned>(&self, path: &str) -> ConfigResult<T> {
        let dotted = self.dotted(path);
        let raw = self.get(path).ok_or(ConfigError::MissingRequired {
            path: dotted.clone(),
        })?;
        serde_json::from_value(raw).map_err(|error| ConfigError::InvalidValue {
            path: dotted,
            reason: error.to_string(),
        })
    }

    /// Writes `value` at `path` into the override layer, which outranks every
    /// configured source.  Visible to all views over the same store.
    pub fn set(&self, path: &str, value: impl Into<Value>) {
        let full = self.full_path(path);
        let mut overrides = self.store.overrides.write();
        insert_at(&mut overrides, &full, value.into());
    }

    /// Serializes `value` and writes it like [`set`](Self::set).  Returns the
    /// serialization error instead of writing on failure.
    pub fn set_serialized<T: Serialize>(&self, path: &str, value: &T) -> ConfigResult<()> {
        let raw = serde_json::to_value(value).map_err(|error| ConfigError::InvalidValue {
            path: self.dotted(path),
            reason: error.to_string(),
        })?;
        self.set(path, raw);
        Ok(())
    }

    /// The dotted absolute path this view would read for `path`.
    pub fn dotted(&self, path: &str) -> String {
        self.full_path(path).join(".")
    }

    fn full_path(&self, path: &str) -> Vec<String> {
        let mut full = self.prefix.clone();
        full.extend(split_path(path));
        full
    }
}
