//! Relay task types.

use alloy::primitives::{B256, ChainId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An identifier of a relay task.
///
/// Clients should treat this as an opaque value and not attempt to parse it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a new [`TaskId`].
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The lifecycle state of a relay task.
///
/// ```text
/// CheckPending -> ExecPending -> WaitingForConfirmation -> ExecSuccess | ExecReverted | Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    /// The relay is checking the task.
    CheckPending,
    /// The task is waiting to be executed.
    ExecPending,
    /// The transaction was sent and awaits confirmation.
    WaitingForConfirmation,
    /// The transaction was confirmed.
    ExecSuccess,
    /// The transaction reverted.
    ExecReverted,
    /// The relay cancelled the task.
    Cancelled,
}

impl TaskState {
    /// Whether the state is final.
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::ExecSuccess | Self::ExecReverted | Self::Cancelled)
    }
}

/// The status of a relay task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    /// The task id.
    pub task_id: TaskId,
    /// The state of the task.
    pub task_state: TaskState,
    /// The chain the task executes on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<ChainId>,
    /// The hash of the transaction executing the task, once sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,
    /// The block the transaction was included in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Message of the last check performed by the relay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check_message: Option<String>,
    /// When the task was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    /// When the task was executed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_date: Option<String>,
}

impl TaskStatus {
    /// Creates a status without any optional data.
    pub fn new(task_id: TaskId, task_state: TaskState) -> Self {
        Self {
            task_id,
            task_state,
            chain_id: None,
            transaction_hash: None,
            block_number: None,
            last_check_message: None,
            creation_date: None,
            execution_date: None,
        }
    }

    /// Sets the transaction hash.
    pub fn with_transaction_hash(mut self, hash: B256) -> Self {
        self.transaction_hash = Some(hash);
        self
    }

    /// Whether the status is final.
    pub const fn is_final(&self) -> bool {
        self.task_state.is_final()
    }
}

/// Response of the task status endpoint.
///
/// Some deployments wrap the status in a `task` object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TaskStatusResponse {
    /// `{ "task": { .. } }`
    Wrapped {
        /// The status.
        task: TaskStatus,
    },
    /// The bare status.
    Bare(TaskStatus),
}

impl TaskStatusResponse {
    /// Returns the status.
    pub fn into_status(self) -> TaskStatus {
        match self {
            Self::Wrapped { task } | Self::Bare(task) => task,
        }
    }
}

/// A subscription action sent to the task WebSocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionAction {
    /// Start receiving updates for a task.
    Subscribe,
    /// Stop receiving updates for a task.
    Unsubscribe,
}

/// A message sent to the task WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientMessage {
    /// The action.
    pub action: SubscriptionAction,
    /// The task the action applies to.
    pub task_id: TaskId,
}

impl ClientMessage {
    /// Creates a subscribe message.
    pub const fn subscribe(task_id: TaskId) -> Self {
        Self { action: SubscriptionAction::Subscribe, task_id }
    }

    /// Creates an unsubscribe message.
    pub const fn unsubscribe(task_id: TaskId) -> Self {
        Self { action: SubscriptionAction::Unsubscribe, task_id }
    }
}

/// A message received from the task WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "lowercase")]
pub enum ServerMessage {
    /// A task status update.
    Update(TaskStatus),
    /// An error reported by the server.
    Error(ServerError),
}

/// An error description sent by the task WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerError {
    /// A structured error, optionally scoped to a task.
    Detailed {
        /// The error message.
        message: String,
        /// The task the error relates to.
        #[serde(default, rename = "taskId", skip_serializing_if = "Option::is_none")]
        task_id: Option<TaskId>,
    },
    /// A bare error message.
    Message(String),
}

impl ServerError {
    /// The error message.
    pub fn message(&self) -> &str {
        match self {
            Self::Detailed { message, .. } | Self::Message(message) => message,
        }
    }

    /// The task the error relates to, if any.
    pub fn task_id(&self) -> Option<&TaskId> {
        match self {
            Self::Detailed { task_id, .. } => task_id.as_ref(),
            Self::Message(_) => None,
        }
    }
}
