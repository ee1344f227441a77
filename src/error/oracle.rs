use alloy::primitives::ChainId;
use thiserror::Error;

/// Errors returned by the fee oracle.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The oracle answered with a non-success status.
    #[error("fee oracle request to {url} failed with status {status}")]
    Status {
        /// The requested url.
        url: String,
        /// The HTTP status code.
        status: u16,
    },
    /// The oracle has no data for the chain.
    #[error("fee oracle does not support chain {0}")]
    UnsupportedChain(ChainId),
    /// The request could not be sent or decoded.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
