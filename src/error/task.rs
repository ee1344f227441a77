use crate::types::TaskId;
use alloy::primitives::B256;
use std::fmt;
use thiserror::Error;

/// The reason a relay task did not produce a transaction hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskErrorKind {
    /// The transaction was included but reverted.
    Reverted,
    /// The relay cancelled the task before execution.
    Cancelled,
    /// Polling gave up before the task reached a final state.
    Timeout,
    /// The relay reported something that violates the task protocol.
    Internal,
}

impl fmt::Display for TaskErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reverted => f.write_str("execution reverted"),
            Self::Cancelled => f.write_str("execution cancelled"),
            Self::Timeout => f.write_str("execution timed out"),
            Self::Internal => f.write_str("internal error"),
        }
    }
}

/// A relay task failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("task {task_id}: {kind}{}", .message.as_ref().map(|m| format!(" ({m})")).unwrap_or_default())]
pub struct TaskError {
    /// What went wrong.
    pub kind: TaskErrorKind,
    /// The task that failed.
    pub task_id: TaskId,
    /// The transaction hash, if the relay reported one.
    pub transaction_hash: Option<B256>,
    /// Additional context reported by the relay.
    pub message: Option<String>,
}

impl TaskError {
    /// Creates a new [`TaskError`] of the given kind.
    pub fn new(kind: TaskErrorKind, task_id: TaskId) -> Self {
        Self { kind, task_id, transaction_hash: None, message: None }
    }

    /// Creates a [`TaskErrorKind::Reverted`] error.
    pub fn reverted(task_id: TaskId, transaction_hash: Option<B256>) -> Self {
        Self { transaction_hash, ..Self::new(TaskErrorKind::Reverted, task_id) }
    }

    /// Creates a [`TaskErrorKind::Cancelled`] error.
    pub fn cancelled(task_id: TaskId) -> Self {
        Self::new(TaskErrorKind::Cancelled, task_id)
    }

    /// Creates a [`TaskErrorKind::Timeout`] error.
    pub fn timeout(task_id: TaskId) -> Self {
        Self::new(TaskErrorKind::Timeout, task_id)
    }

    /// Creates a [`TaskErrorKind::Internal`] error.
    pub fn internal(task_id: TaskId, message: impl Into<String>) -> Self {
        Self { message: Some(message.into()), ..Self::new(TaskErrorKind::Internal, task_id) }
    }

    /// Attaches a relay message to the error.
    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message.or(self.message);
        self
    }

    /// Whether submitting the same calls again may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind == TaskErrorKind::Timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let err = TaskError::reverted("abc".into(), None);
        assert_eq!(err.to_string(), "task abc: execution reverted");

        let err = TaskError::internal("abc".into(), "success without hash");
        assert_eq!(err.to_string(), "task abc: internal error (success without hash)");
    }

    #[test]
    fn only_timeouts_are_retryable() {
        assert!(TaskError::timeout("a".into()).is_retryable());
        assert!(!TaskError::cancelled("a".into()).is_retryable());
        assert!(!TaskError::reverted("a".into(), Some(B256::ZERO)).is_retryable());
    }
}
