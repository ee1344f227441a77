//! Client error types.
use alloy::transports::TransportErrorKind;
use thiserror::Error;

mod auth;
pub use auth::AuthError;

mod oracle;
pub use oracle::OracleError;

mod payment;
pub use payment::PaymentError;

mod relay;
pub use relay::RelayApiError;

mod task;
pub use task::{TaskError, TaskErrorKind};

mod tracker;
pub use tracker::TrackerError;

/// The overarching error type returned by the client.
#[derive(Debug, Error)]
pub enum SmartWalletError {
    /// Errors related to 7702 authorizations.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// Errors related to fee payment.
    #[error(transparent)]
    Payment(#[from] PaymentError),
    /// Errors returned by the fee oracle.
    #[error(transparent)]
    Oracle(#[from] OracleError),
    /// Errors returned by the relay.
    #[error(transparent)]
    Relay(#[from] RelayApiError),
    /// The relay task did not succeed.
    #[error(transparent)]
    Task(#[from] TaskError),
    /// Errors of the task tracking transport.
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    /// The smart account failed to perform an operation.
    #[error("account error: {0}")]
    Account(eyre::Error),
    /// The `opData` blob could not be decoded.
    #[error("invalid opData: expected at least {expected} bytes, got {got}")]
    InvalidOpData {
        /// Minimum length of the blob.
        expected: usize,
        /// Length of the provided blob.
        got: usize,
    },
    /// An error occurred during ABI encoding/decoding.
    #[error(transparent)]
    AbiError(#[from] alloy::sol_types::Error),
    /// A batched RPC call failed.
    #[error(transparent)]
    MulticallError(#[from] alloy::providers::MulticallError),
    /// An error occurred talking to RPC.
    #[error(transparent)]
    RpcError(#[from] alloy::transports::RpcError<TransportErrorKind>),
    /// An internal error occurred.
    #[error(transparent)]
    InternalError(#[from] eyre::Error),
}

impl SmartWalletError {
    /// Wraps an error returned by a [`SmartAccount`](crate::account::SmartAccount).
    pub fn account(err: impl Into<eyre::Error>) -> Self {
        Self::Account(err.into())
    }

    /// Returns the [`TaskError`] if this error is a task failure.
    pub fn as_task_error(&self) -> Option<&TaskError> {
        match self {
            Self::Task(err) => Some(err),
            _ => None,
        }
    }

    /// Whether the error happened before anything was sent to the relay.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::Payment(_) | Self::InvalidOpData { .. })
    }
}
