//! Component registration metadata.

use serde::{Deserialize, Serialize};

/// Metadata record for one registered component (a plugin or a baseline
/// feature).  Purely descriptive; used by diagnostics and inspection tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDefinition {
    /// Component name.
    pub name: String,
    /// Optional component version string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ComponentDefinition {
    /// Creates a definition with just a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }
}

/// Append-only list of component definitions, seeded empty under
/// [`keys::COMPONENT_DEFINITIONS`](super::keys::COMPONENT_DEFINITIONS).
#[derive(Debug, Clone, Default)]
pub struct ComponentDefinitions {
    items: Vec<ComponentDefinition>,
}

impl ComponentDefinitions {
    /// Returns the list with `definition` appended.
    pub fn with(mut self, definition: ComponentDefinition) -> Self {
        self.items.push(definition);
        self
    }

    /// Iterates the definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentDefinition> {
        self.items.iter()
    }

    /// Registered component names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|d| d.name.as_str()).collect()
    }

    /// Number of registered components.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when no component is registered.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
