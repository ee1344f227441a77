//! Tracking of relay tasks until they reach a final state.
//!
//! [`TaskTracker::wait`] resolves a task in three stages:
//!
//! 1. A single HTTP status check. Tasks that are already final never open a socket.
//! 2. A subscription on the shared task WebSocket, resolved by the first final update.
//! 3. If the WebSocket fails, HTTP polling bounded by the configured number of attempts.

mod connection;
pub use connection::{
    ConnectionService, ConnectionSettings, ConnectionState, Subscription, TaskEvent,
    TaskTrackingConnection,
};

mod metrics;
pub use metrics::TrackerMetrics;

mod status;
pub use status::{HttpTaskStatusClient, TaskStatusApi};

use crate::{
    config::TrackerConfig,
    constants::{DEFAULT_MAX_POLL_RETRIES, DEFAULT_POLL_INTERVAL},
    error::{TaskError, TrackerError},
    types::{TaskId, TaskState, TaskStatus},
};
use alloy::primitives::B256;
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Kinds of task events a listener can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskEventKind {
    /// The task executed successfully.
    Success,
    /// The task transaction reverted.
    Revert,
    /// The relay cancelled the task.
    Cancel,
    /// The connection failed or the server reported an error.
    Error,
}

impl TaskEventKind {
    /// Whether `event` is of this kind.
    pub fn matches(&self, event: &TaskEvent) -> bool {
        match event {
            TaskEvent::Update(status) => matches!(
                (self, status.task_state),
                (Self::Success, TaskState::ExecSuccess)
                    | (Self::Revert, TaskState::ExecReverted)
                    | (Self::Cancel, TaskState::Cancelled)
            ),
            TaskEvent::Error(_) => matches!(self, Self::Error),
        }
    }
}

/// A listener registered with [`TaskTracker::on`].
///
/// The listener stops once dropped or unsubscribed.
#[derive(Debug)]
#[must_use = "dropping the listener unsubscribes it"]
pub struct TaskListener {
    task_id: TaskId,
    handle: JoinHandle<()>,
}

impl TaskListener {
    /// The observed task.
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Whether the listener stopped, either because the task reached a final state or because
    /// it was unsubscribed.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stops the listener. Calling this more than once has no effect.
    pub fn unsubscribe(&self) {
        self.handle.abort();
    }
}

impl Drop for TaskListener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Resolves relay tasks to transaction hashes.
///
/// Cloning the tracker shares the underlying WebSocket.
#[derive(Debug, Clone)]
pub struct TaskTracker {
    status: Arc<dyn TaskStatusApi>,
    connection: TaskTrackingConnection,
    poll_interval: Duration,
    max_poll_retries: u32,
    metrics: Arc<TrackerMetrics>,
}

impl TaskTracker {
    /// Creates a new [`TaskTracker`].
    pub fn new(status: Arc<dyn TaskStatusApi>, connection: TaskTrackingConnection) -> Self {
        Self {
            status,
            connection,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_retries: DEFAULT_MAX_POLL_RETRIES,
            metrics: Arc::new(TrackerMetrics::default()),
        }
    }

    /// Creates a tracker for the endpoints in `config`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: &TrackerConfig) -> Result<Self, TrackerError> {
        let status = HttpTaskStatusClient::new(config.status_url.clone())?;
        let connection = TaskTrackingConnection::spawn(
            config.websocket_url.clone(),
            ConnectionSettings {
                connect_timeout: config.connect_timeout,
                reconnect_interval: config.reconnect_interval,
            },
        );
        Ok(Self::new(Arc::new(status), connection)
            .with_poll_interval(config.poll_interval)
            .with_max_poll_retries(config.max_poll_retries))
    }

    /// Sets the delay between status polls.
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sets the maximum number of status polls.
    pub const fn with_max_poll_retries(mut self, max_poll_retries: u32) -> Self {
        self.max_poll_retries = max_poll_retries;
        self
    }

    /// The task WebSocket.
    pub const fn connection(&self) -> &TaskTrackingConnection {
        &self.connection
    }

    /// Waits for `task_id` to reach a final state.
    ///
    /// Returns the transaction hash of a successful task.
    pub async fn wait(&self, task_id: &TaskId) -> Result<B256, TaskError> {
        match self.status.task_status(task_id).await {
            Ok(Some(status)) if status.is_final() => return resolve(status),
            Ok(status) => {
                trace!(%task_id, state = ?status.map(|s| s.task_state), "Task pending")
            }
            Err(err) => warn!(%task_id, %err, "Task status check failed"),
        }

        let err = match self.watch(task_id).await {
            Ok(status) => return resolve(status),
            Err(err) => err,
        };

        warn!(%task_id, %err, "Task websocket failed, polling status");
        self.metrics.poll_fallbacks.increment(1);
        self.poll(task_id).await
    }

    /// Waits for a final update on the task WebSocket.
    async fn watch(&self, task_id: &TaskId) -> Result<TaskStatus, TrackerError> {
        let mut subscription = self.connection.subscribe(task_id.clone());

        loop {
            match subscription.recv().await {
                Some(TaskEvent::Update(status)) if status.is_final() => return Ok(status),
                Some(TaskEvent::Update(status)) => {
                    debug!(%task_id, state = ?status.task_state, "Task progressed")
                }
                Some(TaskEvent::Error(err)) => return Err(err),
                None => return Err(TrackerError::ConnectionClosed),
            }
        }
    }

    async fn poll(&self, task_id: &TaskId) -> Result<B256, TaskError> {
        for attempt in 1..=self.max_poll_retries {
            match self.status.task_status(task_id).await {
                Ok(Some(status)) if status.is_final() => return resolve(status),
                Ok(_) => trace!(%task_id, attempt, "Task still pending"),
                Err(err) => warn!(%task_id, attempt, %err, "Task status poll failed"),
            }
            if attempt < self.max_poll_retries {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        Err(TaskError::timeout(task_id.clone()))
    }

    /// Calls `handler` with every event of `kind` for `task_id`.
    ///
    /// The listener runs until the task reaches a final state or the returned [`TaskListener`]
    /// is dropped. Transport errors are not retried.
    pub fn on<F>(&self, task_id: TaskId, kind: TaskEventKind, mut handler: F) -> TaskListener
    where
        F: FnMut(TaskEvent) + Send + 'static,
    {
        let mut subscription = self.connection.subscribe(task_id.clone());
        let handle = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                if kind.matches(&event) {
                    handler(event);
                }
            }
        });

        TaskListener { task_id, handle }
    }
}

/// Maps a final status to the task outcome.
fn resolve(status: TaskStatus) -> Result<B256, TaskError> {
    let TaskStatus { task_id, task_state, transaction_hash, last_check_message, .. } = status;

    match task_state {
        TaskState::ExecSuccess => {
            let hash = transaction_hash.ok_or_else(|| {
                TaskError::internal(task_id.clone(), "missing transaction hash")
            })?;
            info!(%task_id, %hash, "Task executed");
            Ok(hash)
        }
        TaskState::ExecReverted => {
            Err(TaskError::reverted(task_id, transaction_hash).with_message(last_check_message))
        }
        TaskState::Cancelled => {
            Err(TaskError::cancelled(task_id).with_message(last_check_message))
        }
        state => Err(TaskError::internal(task_id, format!("task is not final: {state:?}"))),
    }
}
