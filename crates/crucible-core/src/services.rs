//! Service values and the resolved-dependency view handed to factories.
//!
//! The registry stores every service as an [`Arc<dyn Any + Send + Sync>`];
//! consumers get their concrete type back with a checked downcast.  Trait
//! objects are stored behind [`Shared<T>`], which keeps the inner
//! `Arc<dyn Trait>` inside a sized wrapper so it can live in the type-erased
//! map.

use std::any::Any;
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

use crate::error::{RegistryError, RegistryResult};

/// A resolved service value as stored in the registry.
pub type ServiceInstance = Arc<dyn Any + Send + Sync>;

/// Wraps a value into a [`ServiceInstance`].
pub fn into_instance<T: Send + Sync + 'static>(value: T) -> ServiceInstance {
    Arc::new(value)
}

/// Sized handle around an `Arc<dyn Trait>` so trait-object services can be
/// stored in (and downcast out of) the type-erased registry.
///
/// ```rust,ignore
/// registry.add_instance(keys::STORAGE, Shared::new(storage));
/// // …
/// let storage = deps.require::<Shared<dyn Storage>>(keys::STORAGE)?;
/// storage.read(&["profile"]).await?;
/// ```
pub struct Shared<T: ?Sized>(pub Arc<T>);

impl<T: ?Sized> Shared<T> {
    /// Wraps an already-shared trait object.
    pub fn new(inner: Arc<T>) -> Self {
        Self(inner)
    }

    /// Clones the inner `Arc`.
    pub fn inner(&self) -> Arc<T> {
        Arc::clone(&self.0)
    }
}

impl<T: ?Sized> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> Deref for Shared<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized> From<Arc<T>> for Shared<T> {
    fn from(inner: Arc<T>) -> Self {
        Self(inner)
    }
}

/// The dependency mapping passed to a factory or composer.
///
/// Contains exactly the keys the registration declared, already resolved.
/// Lookups are by key with a checked downcast to the expected type.
pub struct ResolvedServices {
    map: HashMap<String, ServiceInstance>,
}

impl ResolvedServices {
    pub(crate) fn new(map: HashMap<String, ServiceInstance>) -> Self {
        Self { map }
    }

    /// Returns an empty set, for producers with no declared dependencies.
    pub fn empty() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Returns the raw instance for `key`, if it was declared.
    pub fn instance(&self, key: &str) -> Option<&ServiceInstance> {
        self.map.get(key)
    }

    /// Returns the typed value for `key`, or `None` if the key was not
    /// declared or holds a different type.
    pub fn get<T: Send + Sync + 'static>(&self, key: &str) -> Option<Arc<T>> {
        self.map
            .get(key)
            .and_then(|value| Arc::clone(value).downcast::<T>().ok())
    }

    /// Returns the typed value for `key`, with a structured error when the
    /// key was never declared or the stored type does not match.
    pub fn require<T: Send + Sync + 'static>(&self, key: &str) -> RegistryResult<Arc<T>> {
        let value = self
            .map
            .get(key)
            .ok_or_else(|| RegistryError::UndeclaredDependency {
                key: key.to_string(),
            })?;
        Arc::clone(value)
            .downcast::<T>()
            .map_err(|_| RegistryError::TypeMismatch {
                key: key.to_string(),
            })
    }

    /// Iterates over the declared dependency keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    /// Returns the number of resolved dependencies.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` when no dependencies were declared.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_downcasts_to_the_stored_type() {
        let mut map = HashMap::new();
        map.insert("count".to_string(), into_instance(7usize));
        let deps = ResolvedServices::new(map);

        assert_eq!(*deps.get::<usize>("count").unwrap(), 7);
        assert!(deps.get::<String>("count").is_none());
        assert!(deps.get::<usize>("absent").is_none());
    }

    #[test]
    fn require_distinguishes_absence_from_type_mismatch() {
        let mut map = HashMap::new();
        map.insert("name".to_string(), into_instance("crucible".to_string()));
        let deps = ResolvedServices::new(map);

        assert!(deps.require::<String>("name").is_ok());
        assert!(matches!(
            deps.require::<usize>("name"),
            Err(RegistryError::TypeMismatch { .. })
        ));
        assert!(matches!(
            deps.require::<String>("absent"),
            Err(RegistryError::UndeclaredDependency { .. })
        ));
    }

    #[test]
    fn shared_wraps_trait_objects() {
        trait Greeter: Send + Sync {
            fn greet(&self) -> String;
        }

        struct English;
        impl Greeter for English {
            fn greet(&self) -> String {
                "hello".to_string()
            }
        }

        let shared: Shared<dyn Greeter> = Shared::new(Arc::new(English));
        let instance = into_instance(shared);
        let back = instance.downcast::<Shared<dyn Greeter>>().unwrap();
        assert_eq!(back.greet(), "hello");
    }
}
