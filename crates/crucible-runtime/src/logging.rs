//! Logging initialization for the Crucible runtime.
//!
//! Reads the `logging` section of configuration and sets up the tracing
//! subscriber accordingly.  `RUST_LOG` takes precedence over the configured
//! level when present, and initialization is idempotent so embedders and
//! tests that install their own subscriber are left alone.

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use crate::config::ConfigView;

/// Output format of the log stream.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line, abbreviated output.
    #[default]
    Compact,
    /// Default tracing formatting.
    Full,
    /// Multi-line human-oriented output.
    Pretty,
}

/// The `logging` configuration section.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Base log level directive (trace, debug, info, warn, error).
    #[serde(default = "default_level")]
    pub level: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// Initializes logging from the `logging` section of `config`.
///
/// Missing or malformed settings fall back to defaults; a subscriber that is
/// already installed is kept.
pub fn init_from_view(config: &ConfigView) {
    let settings: LoggingSettings = config.get_typed("logging").unwrap_or_default();
    init(&settings);
}

/// Initializes logging from explicit settings.
pub fn init(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.clone()));

    let result = match settings.format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .try_init(),
        LogFormat::Full => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .try_init(),
    };

    // Already-initialized is fine; tests and embedders install their own.
    let _ = result;
}
