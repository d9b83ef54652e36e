// Task endpoints: read and cancel remote long-running operations.

use reqwest::{Method, StatusCode};
use tracing::debug;

use crate::client::VcdClient;
use crate::error::Error;
use crate::models::TaskRecord;

impl VcdClient {
    /// Read the current state of a task.
    pub async fn get_task(&self, id: &str) -> Result<TaskRecord, Error> {
        self.get(&["tasks", id]).await
    }

    /// Ask the server to cancel a task.
    ///
    /// Returns `Ok(true)` when the request was accepted and `Ok(false)`
    /// when the server refused it (task already finished, not cancellable).
    pub async fn cancel_task(&self, id: &str) -> Result<bool, Error> {
        let url = self.api_url(&["tasks", id, "action", "cancel"])?;
        debug!(%url, "requesting task cancellation");
        let resp = self.request(Method::POST, url, None)?.send().await?;

        match resp.status() {
            s if s.is_success() => Ok(true),
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::METHOD_NOT_ALLOWED => {
                debug!(status = %resp.status(), "cancellation refused");
                Ok(false)
            }
            _ => Self::check_status(resp).await.map(|_| false),
        }
    }
}
