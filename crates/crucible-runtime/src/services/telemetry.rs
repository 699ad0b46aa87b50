//! Telemetry sink.

use tracing::{debug, info};

/// Event and trace sink for cross-cutting instrumentation.
///
/// Middlewares and plugins report through this boundary; the backend is
/// selected by the `runtime.telemetry` setting.
pub trait Telemetry: Send + Sync {
    /// Records a named event with optional properties.
    fn track_event(&self, name: &str, properties: &[(&str, &str)]);

    /// Records a diagnostic trace message.
    fn track_trace(&self, message: &str);
}

/// Discards everything; the default backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
    fn track_event(&self, _name: &str, _properties: &[(&str, &str)]) {}

    fn track_trace(&self, _message: &str) {}
}

/// Forwards events and traces into the process log stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn track_event(&self, name: &str, properties: &[(&str, &str)]) {
        info!(target: "crucible::telemetry", event = %name, ?properties, "Telemetry event");
    }

    fn track_trace(&self, message: &str) {
        debug!(target: "crucible::telemetry", "{message}");
    }
}
