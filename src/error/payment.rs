use alloy::primitives::{Address, ChainId, U256};
use thiserror::Error;

/// Errors related to paying the relay.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The provided payment token is not accepted on the chain.
    #[error("payment token {token} not supported on chain {chain_id}")]
    UnsupportedPaymentToken {
        /// The rejected token.
        token: Address,
        /// The chain the payment was requested for.
        chain_id: ChainId,
    },
    /// Insufficient balance to pay for the transaction.
    #[error("insufficient balance: required {required}, available {available}, deficit {deficit}")]
    InsufficientBalance {
        /// The required amount for the transaction.
        required: U256,
        /// The available balance in the fee token.
        available: U256,
        /// The deficit amount (required - available).
        deficit: U256,
    },
    /// Sponsored payments need an API key.
    #[error("sponsored payment requires a non-empty api key")]
    MissingSponsorApiKey,
}

impl PaymentError {
    /// Creates a new [`PaymentError::InsufficientBalance`] error.
    pub fn insufficient_balance(required: U256, available: U256) -> Self {
        Self::InsufficientBalance {
            required,
            available,
            deficit: required.saturating_sub(available),
        }
    }
}
