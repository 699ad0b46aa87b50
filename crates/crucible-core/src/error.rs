//! Registry error types.

use thiserror::Error;

/// Errors that can occur during service registration or resolution.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A second initial factory was registered for a key that already has one.
    #[error("Duplicate initial factory for service '{0}'")]
    DuplicateFactory(String),

    /// A key was resolved (directly or as a dependency) with no factory,
    /// instance, or seeded default behind it.
    #[error("No producer registered for service '{0}'")]
    MissingProducer(String),

    /// The declared dependency relation contains a cycle.  The payload is the
    /// resolution path that closed the loop, in traversal order.
    #[error("Service dependency cycle detected: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    /// A resolved value could not be downcast to the requested type.
    #[error("Service '{key}' is not of the requested type")]
    TypeMismatch {
        /// The key whose value had an unexpected type.
        key: String,
    },

    /// A factory or composer asked for a dependency it never declared.
    #[error("Dependency '{key}' was not declared and is absent from the resolved set")]
    UndeclaredDependency {
        /// The key that was looked up.
        key: String,
    },

    /// The initial factory for a key failed during construction.
    ///
    /// The key is *not* memoized as failed; a later `resolve` re-attempts.
    #[error("Factory for service '{key}' failed")]
    Factory {
        /// The key being constructed.
        key: String,
        /// The factory's own error.
        #[source]
        source: anyhow::Error,
    },

    /// A composer for a key failed while transforming the current value.
    #[error("Composer for service '{key}' failed")]
    Composer {
        /// The key being composed.
        key: String,
        /// The composer's own error.
        #[source]
        source: anyhow::Error,
    },
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
