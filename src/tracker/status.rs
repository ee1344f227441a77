use crate::{
    constants::DEFAULT_REQUEST_TIMEOUT,
    error::TrackerError,
    types::{TaskId, TaskStatus, TaskStatusResponse},
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::fmt::Debug;
use tracing::trace;
use url::Url;

/// Task status lookups.
#[async_trait]
pub trait TaskStatusApi: Debug + Send + Sync {
    /// Returns the status of `task_id`, or `None` if the relay does not know the task yet.
    async fn task_status(&self, task_id: &TaskId) -> Result<Option<TaskStatus>, TrackerError>;
}

/// [`TaskStatusApi`] served by `GET {url}/tasks/status/{taskId}`.
#[derive(Debug, Clone)]
pub struct HttpTaskStatusClient {
    client: Client,
    url: Url,
}

impl HttpTaskStatusClient {
    /// Creates a status client for the service at `url`.
    pub fn new(url: Url) -> Result<Self, TrackerError> {
        let client = Client::builder().timeout(DEFAULT_REQUEST_TIMEOUT).build()?;
        Ok(Self { client, url })
    }

    fn endpoint(&self, task_id: &TaskId) -> String {
        format!("{}/tasks/status/{task_id}", self.url.as_str().trim_end_matches('/'))
    }
}

#[async_trait]
impl TaskStatusApi for HttpTaskStatusClient {
    async fn task_status(&self, task_id: &TaskId) -> Result<Option<TaskStatus>, TrackerError> {
        let response = self.client.get(self.endpoint(task_id)).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if !status.is_success() => Err(TrackerError::UnexpectedStatus {
                task_id: task_id.to_string(),
                status: status.as_u16(),
            }),
            _ => {
                let status = response.json::<TaskStatusResponse>().await?.into_status();
                trace!(%task_id, state = ?status.task_state, "Fetched task status");
                Ok(Some(status))
            }
        }
    }
}
