//! Submission of signed calldata to the relay.

use super::PipelineMetrics;
use crate::{
    error::{PaymentError, RelayApiError, SmartWalletError},
    response::GelatoResponse,
    rpc::RelayApi,
    tracker::TaskTracker,
    types::{
        Payment,
        rpc::{RelayAuthorization, SendTransactionParams},
    },
};
use alloy::{
    eips::eip7702::SignedAuthorization,
    primitives::{Address, Bytes, ChainId},
};
use std::sync::Arc;
use tracing::{info, warn};

/// A submission for `wallet_sendTransaction`.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Target chain ID.
    pub chain_id: ChainId,
    /// The smart account.
    pub target: Address,
    /// The signed calldata.
    pub data: Bytes,
    /// Authorizations to apply first.
    pub authorization_list: Vec<SignedAuthorization>,
}

/// Checks that `payment` can be submitted.
///
/// Sponsored payments need a non-empty API key.
pub fn validate_payment(payment: &Payment) -> Result<(), PaymentError> {
    if payment.is_sponsored() && payment.sponsor_api_key().is_none() {
        return Err(PaymentError::MissingSponsorApiKey);
    }
    Ok(())
}

/// Builds the `wallet_sendTransaction` parameters of a submission.
pub fn send_transaction_params(
    payment: &Payment,
    submission: Submission,
) -> Result<SendTransactionParams, PaymentError> {
    validate_payment(payment)?;
    Ok(SendTransactionParams {
        chain_id: submission.chain_id,
        target: submission.target,
        data: submission.data,
        fee_token: payment.fee_token(),
        sponsor_api_key: payment.sponsor_api_key().map(str::to_string),
        authorization_list: submission
            .authorization_list
            .iter()
            .map(RelayAuthorization::from)
            .collect(),
    })
}

/// Sends signed submissions to the relay.
#[derive(Debug, Clone)]
pub struct TransactionSubmitter {
    relay: Arc<dyn RelayApi>,
    tracker: TaskTracker,
    metrics: Arc<PipelineMetrics>,
}

impl TransactionSubmitter {
    /// Creates a new [`TransactionSubmitter`].
    pub fn new(
        relay: Arc<dyn RelayApi>,
        tracker: TaskTracker,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self { relay, tracker, metrics }
    }

    /// Submits `submission`, paid with `payment`.
    ///
    /// Returns a [`GelatoResponse`] tracking the created task.
    pub async fn submit(
        &self,
        payment: &Payment,
        submission: Submission,
    ) -> Result<GelatoResponse, SmartWalletError> {
        let params = send_transaction_params(payment, submission)?;
        let chain_id = params.chain_id;
        let target = params.target;

        let response = self.relay.send_transaction(params).await.inspect_err(|err| {
            warn!(%target, chain_id, %err, "Relay rejected submission");
            self.metrics.failed_submissions.increment(1);
        })?;

        let Some(task_id) = response.task_id else {
            self.metrics.failed_submissions.increment(1);
            return Err(RelayApiError::RelaySubmissionFailed(format!(
                "no task id returned for {target} on chain {chain_id}"
            ))
            .into());
        };

        info!(%task_id, %target, chain_id, "Submitted transaction");
        self.metrics.submissions.increment(1);

        Ok(GelatoResponse::new(task_id, self.tracker.clone()))
    }
}
