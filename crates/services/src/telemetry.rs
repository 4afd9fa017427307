//! Fire-and-forget product events.

use std::sync::{Mutex, PoisonError};

use serde_json::Value;

pub const TOPIC_SELECTED: &str = "topic_selected";
pub const TOPIC_REMOVED: &str = "topic_removed";
pub const TOPIC_ADDED: &str = "topic_added";
pub const TOPIC_INCLUDE_CHILDREN_CHANGED: &str = "topic_include_children_changed";
pub const ROLE_TOGGLED: &str = "role_toggled";
pub const ATTEMPT_STARTED: &str = "attempt_started";
pub const ATTEMPT_RESUMED: &str = "attempt_resumed";
pub const ATTEMPT_SUBMITTED: &str = "attempt_submitted";
pub const ATTEMPT_SKIPPED: &str = "attempt_skipped";
pub const NEXT_UP_CHOSEN: &str = "next_up_chosen";
pub const STALE_ATTEMPT_DISCARDED: &str = "stale_attempt_discarded";

/// Receives events. Implementations must not fail the caller.
pub trait TelemetrySink: Send + Sync {
    fn record(&self, event: &str, payload: Value);
}

/// Emits each event as a `tracing` record on the `telemetry` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn record(&self, event: &str, payload: Value) {
        tracing::info!(target: "telemetry", event, %payload);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn record(&self, _event: &str, _payload: Value) {}
}

/// Keeps events in memory so tests can assert on them.
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<(String, Value)>>,
}

impl RecordingTelemetry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<(String, Value)> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.events().into_iter().map(|(name, _)| name).collect()
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn record(&self, event: &str, payload: Value) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((event.to_string(), payload));
    }
}
