//! Handle to a submitted relay task.

use crate::{
    error::TaskError,
    tracker::{TaskEvent, TaskEventKind, TaskListener, TaskTracker},
    types::TaskId,
};
use alloy::primitives::B256;

/// A task accepted by the relay.
#[derive(Debug, Clone)]
pub struct GelatoResponse {
    id: TaskId,
    tracker: TaskTracker,
}

impl GelatoResponse {
    /// Creates a response for `id`, tracked by `tracker`.
    pub const fn new(id: TaskId, tracker: TaskTracker) -> Self {
        Self { id, tracker }
    }

    /// The relay task id.
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    /// Waits for the task to execute and returns its transaction hash.
    pub async fn wait(&self) -> Result<B256, TaskError> {
        self.tracker.wait(&self.id).await
    }

    /// Calls `handler` with every event of `kind` for the task.
    ///
    /// See [`TaskTracker::on`].
    pub fn on<F>(&self, kind: TaskEventKind, handler: F) -> TaskListener
    where
        F: FnMut(TaskEvent) + Send + 'static,
    {
        self.tracker.on(self.id.clone(), kind, handler)
    }
}
