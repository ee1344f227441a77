use metrics::Counter;
use metrics_derive::Metrics;

/// Metrics of the transaction-build pipeline.
#[derive(Metrics)]
#[metrics(scope = "pipeline")]
pub struct PipelineMetrics {
    /// Number of submissions accepted by the relay.
    pub submissions: Counter,
    /// Number of submissions rejected by the relay.
    pub failed_submissions: Counter,
    /// Number of signed EIP-7702 authorizations.
    pub authorizations_signed: Counter,
}
