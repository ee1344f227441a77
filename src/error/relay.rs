use thiserror::Error;

/// Errors returned by the relay JSON-RPC endpoint.
#[derive(Debug, Error)]
pub enum RelayApiError {
    /// The relay rejected the request.
    #[error("relay request {method} failed: {message}")]
    Rpc {
        /// The JSON-RPC method.
        method: &'static str,
        /// The message reported by the relay.
        message: String,
    },
    /// The response had neither a result nor an error.
    #[error("relay response to {method} has no result")]
    MissingResult {
        /// The JSON-RPC method.
        method: &'static str,
    },
    /// The relay accepted the submission but did not return a task id.
    #[error("relay submission failed: {0}")]
    RelaySubmissionFailed(String),
    /// The result could not be decoded.
    #[error("invalid relay response to {method}: {source}")]
    InvalidResponse {
        /// The JSON-RPC method.
        method: &'static str,
        /// The decoding error.
        source: serde_json::Error,
    },
    /// The request could not be sent.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
