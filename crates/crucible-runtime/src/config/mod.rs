//! Layered configuration for the Crucible runtime.
//!
//! Configuration is an ordered stack of immutable sources — command line,
//! environment, profile-specific file, base file — plus one mutable override
//! layer written by the bootstrap process itself.  Reads walk the stack in
//! precedence order; scoped views produced by [`ConfigView::bind`] confine a
//! subsystem or plugin to its own sub-tree.

pub mod error;
pub mod loader;
pub mod source;
pub mod view;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, ENV_PREFIX, Profile};
pub use source::ConfigSource;
pub use view::{ConfigView, Configuration};
