//! Configuration loader.
//!
//! Assembles the precedence-ordered source layers of a [`Configuration`]:
//!
//! 1. Command-line arguments (highest)
//! 2. Environment variables (`CRUCIBLE_*`, nested on `__`)
//! 3. Profile-specific settings file (`crucible.{profile}.json`)
//! 4. Base settings file (`crucible.json`)
//!
//! plus the always-first override layer owned by the store itself.  Missing
//! files are skipped with a warning; an explicitly requested file that does
//! not exist is an error.
//!
//! # Example
//!
//! ```rust,ignore
//! let config = ConfigLoader::new()
//!     .with_current_dir()
//!     .args(std::env::args().skip(1))
//!     .profile("production")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::error::{ConfigError, ConfigResult};
use super::source::ConfigSource;
use super::view::Configuration;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "CRUCIBLE_";

/// Base name of the settings files searched by the loader.
const BASE_FILE: &str = "crucible.json";

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default)]
pub enum Profile {
    /// Development profile (default).
    #[default]
    Development,
    /// Production profile.
    Production,
    /// Custom profile name.
    Custom(String),
}

impl Profile {
    /// Returns the profile name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Creates a profile from `CRUCIBLE_PROFILE` or defaults to Development.
    pub fn from_env() -> Self {
        std::env::var("CRUCIBLE_PROFILE")
            .map(|p| Self::from_name(&p))
            .unwrap_or_default()
    }

    fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Builder that assembles a [`Configuration`] from its layered sources.
pub struct ConfigLoader {
    profile: Profile,
    search_paths: Vec<PathBuf>,
    config_file: Option<PathBuf>,
    load_env: bool,
    args: Option<Vec<String>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new loader with defaults.
    pub fn new() -> Self {
        Self {
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            config_file: None,
            load_env: true,
            args: None,
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Profile::from_name(&profile.into());
        self
    }

    /// Adds a search path for settings files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds the current directory to the search paths.
    pub fn with_current_dir(self) -> Self {
        if let Ok(cwd) = std::env::current_dir() {
            self.search_path(cwd)
        } else {
            self
        }
    }

    /// Adds the user config directory to the search paths.
    pub fn with_user_config_dir(self) -> Self {
        if let Some(config_dir) = dirs::config_dir() {
            self.search_path(config_dir.join("crucible"))
        } else {
            self
        }
    }

    /// Sets a specific settings file to load instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables the environment layer (default: enabled).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables the environment layer.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Supplies command-line arguments for the highest-precedence layer.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Loads all layers and returns the merged configuration.
    pub fn load(self) -> ConfigResult<Configuration> {
        let mut layers: Vec<ConfigSource> = Vec::new();

        if let Some(args) = &self.args {
            layers.push(ConfigSource::from_args(args.iter().cloned()));
        }

        if self.load_env {
            layers.push(ConfigSource::from_env(ENV_PREFIX)?);
        }

        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            info!(path = %path.display(), "Loading configuration file");
            layers.push(ConfigSource::from_json_file(path)?);
        } else {
            self.load_settings_files(&mut layers)?;
        }

        debug!(
            profile = %self.profile,
            layers = layers.len(),
            "Configuration loaded"
        );
        Ok(Configuration::new(layers))
    }

    /// Searches for the profile-specific and base settings files.  The
    /// profile file is pushed first so it outranks the base file.
    fn load_settings_files(&self, layers: &mut Vec<ConfigSource>) -> ConfigResult<()> {
        let search_paths = self.resolve_search_paths();
        let profile_file = format!("crucible.{}.json", self.profile.as_str());
        let mut found = false;

        if let Some(path) = Self::find_in(&search_paths, &profile_file) {
            debug!(path = %path.display(), "Loading profile-specific settings");
            layers.push(ConfigSource::from_json_file(&path)?);
            found = true;
        }

        if let Some(path) = Self::find_in(&search_paths, BASE_FILE) {
            info!(path = %path.display(), "Loading settings file");
            layers.push(ConfigSource::from_json_file(&path)?);
            found = true;
        }

        if !found {
            warn!("No settings file found, using defaults");
        }
        Ok(())
    }

    fn find_in(search_paths: &[PathBuf], name: &str) -> Option<PathBuf> {
        search_paths
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.exists())
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if self.search_paths.is_empty() {
            let mut paths = Vec::new();
            if let Ok(cwd) = std::env::current_dir() {
                paths.push(cwd);
            }
            if let Some(config_dir) = dirs::config_dir() {
                paths.push(config_dir.join("crucible"));
            }
            paths
        } else {
            self.search_paths.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_json(dir: &Path, name: &str, value: serde_json::Value) {
        std::fs::write(dir.join(name), serde_json::to_string_pretty(&value).unwrap()).unwrap();
    }

    #[test]
    fn profile_file_outranks_base_file() {
        let dir = tempfile::tempdir().unwrap();
        write_json(
            dir.path(),
            "crucible.json",
            json!({"logging": {"level": "info"}, "runtime": {"storage": "memory"}}),
        );
        write_json(
            dir.path(),
            "crucible.production.json",
            json!({"logging": {"level": "warn"}}),
        );

        let config = ConfigLoader::new()
            .profile("production")
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();
        let view = config.view();

        assert_eq!(view.get("logging.level"), Some(json!("warn")));
        assert_eq!(view.get("runtime.storage"), Some(json!("memory")));
    }

    #[test]
    fn arguments_outrank_files() {
        let dir = tempfile::tempdir().unwrap();
        write_json(dir.path(), "crucible.json", json!({"runtime": {"storage": "memory"}}));

        let config = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .args(["--runtime.storage=file"])
            .load()
            .unwrap();

        assert_eq!(config.view().get("runtime.storage"), Some(json!("file")));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigLoader::new()
            .file(dir.path().join("nope.json"))
            .without_env()
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn no_files_at_all_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();
        assert_eq!(config.view().get("anything"), None);
    }
}
