use metrics::{Counter, Gauge};
use metrics_derive::Metrics;

/// Metrics of task tracking.
#[derive(Metrics)]
#[metrics(scope = "tracker")]
pub struct TrackerMetrics {
    /// Number of task WebSocket connections opened.
    pub connections_opened: Counter,
    /// Number of reconnects scheduled after a close or failure.
    pub reconnects: Counter,
    /// Number of task updates received over the WebSocket.
    pub updates_received: Counter,
    /// Number of `wait` calls that fell back to polling.
    pub poll_fallbacks: Counter,
    /// Number of live task subscriptions.
    pub active_subscriptions: Gauge,
}
