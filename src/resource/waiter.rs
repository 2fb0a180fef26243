//! Polling of asynchronous CLB tasks
//!
//! Every CLB mutation returns a request id that doubles as a task id. The
//! change is only visible once `DescribeTaskStatus` reports success.

use crate::error::ProviderError;
use crate::provider::Provider;
use crate::retry::{retry, Backoff, RetryError, RetryPolicy};
use serde_json::json;

pub const TASK_SUCCESS: i64 = 0;
pub const TASK_FAIL: i64 = 1;
pub const TASK_RUNNING: i64 = 2;

/// Wait until the task finishes, fails, or the task deadline passes
pub async fn wait_for_task_finish(provider: &Provider, task_id: &str) -> Result<(), ProviderError> {
    let policy = RetryPolicy::new(provider.task_timeout)
        .with_backoff(Backoff::Fixed(provider.task_poll_interval));
    let params = json!({ "TaskId": task_id });
    let params = &params;

    retry(&policy, || async move {
        let response = provider
            .client
            .call("clb", "DescribeTaskStatus", params)
            .await
            .map_err(|e| RetryError::NonRetryable(ProviderError::from(e)))?;

        let status = response.get("Status").and_then(|v| v.as_i64());
        let task_error = |state| ProviderError::Task {
            task_id: task_id.to_string(),
            state,
        };

        match status {
            Some(TASK_SUCCESS) => Ok(()),
            Some(TASK_RUNNING) => Err(RetryError::Retryable(task_error("is still running"))),
            Some(TASK_FAIL) => Err(RetryError::NonRetryable(task_error("failed"))),
            _ => Err(RetryError::NonRetryable(task_error("returned an unknown status"))),
        }
    })
    .await
}

/// Request id of a response, used as the task id
pub fn request_id(response: &serde_json::Value) -> Option<&str> {
    response.get("RequestId").and_then(|v| v.as_str())
}
