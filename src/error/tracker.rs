use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors of the task tracking transport.
///
/// The error is cloneable because a single transport failure is fanned out to every subscriber
/// of the connection.
#[derive(Debug, Clone, Error)]
pub enum TrackerError {
    /// The WebSocket did not connect in time.
    #[error("task websocket did not connect within {0:?}")]
    ConnectTimeout(Duration),
    /// The WebSocket failed.
    #[error("task websocket error: {0}")]
    WebSocket(Arc<tungstenite::Error>),
    /// The server sent an `error` event.
    #[error("task server error: {0}")]
    Server(String),
    /// The connection service is gone.
    #[error("task connection closed")]
    ConnectionClosed,
    /// The task status request failed.
    #[error("task status request failed: {0}")]
    Status(Arc<reqwest::Error>),
    /// The task status endpoint answered with an unexpected status code.
    #[error("task status request for {task_id} returned {status}")]
    UnexpectedStatus {
        /// The task that was requested.
        task_id: String,
        /// The HTTP status code.
        status: u16,
    },
}

impl From<tungstenite::Error> for TrackerError {
    fn from(err: tungstenite::Error) -> Self {
        Self::WebSocket(Arc::new(err))
    }
}

impl From<reqwest::Error> for TrackerError {
    fn from(err: reqwest::Error) -> Self {
        Self::Status(Arc::new(err))
    }
}
