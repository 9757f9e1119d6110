//! Metrics sink port - receives cycle counter snapshots.

use async_trait::async_trait;

use crate::domain::models::CycleMetrics;

/// Trait for receiving a metrics snapshot after each terminal cycle.
///
/// Delivery is fire-and-forget: the orchestrator never fails a cycle
/// over a sink problem, so implementations should swallow their own
/// errors and at most log them.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Receive the counters as of the just-finished cycle.
    async fn record(&self, snapshot: CycleMetrics);
}

/// A no-op sink for hosts that do not collect metrics.
#[derive(Debug, Clone, Default)]
pub struct NullMetricsSink;

impl NullMetricsSink {
    /// Create a no-op sink.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MetricsSink for NullMetricsSink {
    async fn record(&self, _snapshot: CycleMetrics) {}
}
