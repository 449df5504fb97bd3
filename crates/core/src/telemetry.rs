//! Telemetry sink trait
//!
//! Event transmission is out of scope; this crate only defines the seam
//! and the flushing discipline callers must uphold: every outcome, from
//! success to hard failure, ends with a `flush`.

use async_trait::async_trait;

/// Events the orchestration core reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryEvent {
    TasksDeleted { count: usize },
    DeletionFailed { reason: String },
}

/// A sink for telemetry events
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn record(&self, event: TelemetryEvent);

    /// Flush buffered events. Must be called on every exit path.
    async fn flush(&self);
}

/// Sink that discards everything
#[derive(Debug, Default)]
pub struct NoopTelemetry;

#[async_trait]
impl TelemetrySink for NoopTelemetry {
    async fn record(&self, _event: TelemetryEvent) {}

    async fn flush(&self) {}
}
