//! Immutable configuration source layers.
//!
//! A [`ConfigSource`] is one loaded layer of configuration: the parsed
//! command line, the process environment, or a structured JSON file.  Each
//! layer is a `serde_json::Value` tree, frozen once loaded; precedence between
//! layers is decided by their order inside
//! [`Configuration`](super::Configuration), not by merging — the merged view
//! walks the layers and returns the first one that defines a path, so
//! per-source provenance stays observable.

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Json};
use serde_json::{Map, Value};

use super::error::{ConfigError, ConfigResult};

/// One immutable configuration layer.
pub struct ConfigSource {
    label: String,
    tree: Value,
}

impl ConfigSource {
    /// Builds a layer directly from a value tree.  Used by tests and by
    /// embedders that assemble configuration programmatically.
    pub fn from_values(label: impl Into<String>, tree: Value) -> Self {
        Self {
            label: label.into(),
            tree,
        }
    }

    /// Parses command-line arguments into a layer.
    ///
    /// Recognized forms: `--a.b.c=value`, `--a.b.c value`, and a bare
    /// `--a.b.c` flag (treated as `true`).  Dotted keys nest; scalar values
    /// are parsed as JSON where possible and fall back to strings.  Tokens
    /// that are not flags are ignored; a later occurrence of the same key
    /// overwrites an earlier one.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tree = Value::Object(Map::new());
        let mut iter = args.into_iter().map(Into::into).peekable();

        while let Some(arg) = iter.next() {
            let Some(flag) = arg.strip_prefix("--") else {
                continue;
            };
            if flag.is_empty() {
                continue;
            }

            let (key, raw) = match flag.split_once('=') {
                Some((key, value)) => (key.to_string(), value.to_string()),
                None => {
                    let takes_value = iter.peek().is_some_and(|next| !next.starts_with("--"));
                    if takes_value {
                        (flag.to_string(), iter.next().unwrap_or_default())
                    } else {
                        (flag.to_string(), "true".to_string())
                    }
                }
            };

            let path = split_path(&key);
            if path.is_empty() {
                continue;
            }
            insert_at(&mut tree, &path, parse_scalar(&raw));
        }

        Self {
            label: "command-line".to_string(),
            tree,
        }
    }

    /// Loads the process environment as a layer.
    ///
    /// Variables are filtered by `prefix` and nested on `__`, the same
    /// mapping used for files: `CRUCIBLE_RUNTIME__STORAGE=file` becomes
    /// `runtime.storage = "file"`.
    pub fn from_env(prefix: &str) -> ConfigResult<Self> {
        let tree: Value = Figment::from(Env::prefixed(prefix).split("__"))
            .extract()
            .map_err(|e| ConfigError::ParseError(format!("environment: {e}")))?;
        Ok(Self {
            label: "environment".to_string(),
            tree,
        })
    }

    /// Loads a JSON settings file as a layer.
    pub fn from_json_file(path: &Path) -> ConfigResult<Self> {
        let tree: Value = Figment::from(Json::file(path))
            .extract()
            .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;
        Ok(Self {
            label: path.display().to_string(),
            tree,
        })
    }

    /// Human-readable provenance label for diagnostics.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn tree(&self) -> &Value {
        &self.tree
    }
}

// ─── Path helpers (shared with the view layer) ───────────────────────────────

/// Splits a dotted path into owned segments, dropping empty ones.
pub(crate) fn split_path(path: &str) -> Vec<String> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Returns the node at `path` inside `tree`, if the full path is defined.
pub(crate) fn value_at<'a>(tree: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut node = tree;
    for segment in path {
        node = node.as_object()?.get(segment)?;
    }
    Some(node)
}

/// Writes `value` at `path` inside `tree`, materializing intermediate
/// objects and replacing non-object nodes along the way.
pub(crate) fn insert_at(tree: &mut Value, path: &[String], value: Value) {
    if path.is_empty() {
        *tree = value;
        return;
    }

    let mut node = tree;
    for segment in &path[..path.len() - 1] {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node = node
            .as_object_mut()
            .expect("node was just made an object")
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    node.as_object_mut()
        .expect("node was just made an object")
        .insert(path[path.len() - 1].clone(), value);
}

fn parse_scalar(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
