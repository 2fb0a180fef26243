//! Shared context for every lifecycle operation
//!
//! Handlers reach the API only through [`Provider::read_call`] and
//! [`Provider::write_call`], which wrap a single action in the read or write
//! retry policy.

use crate::resource::lock::ActionLocks;
use crate::retry::{retry, retry_error, RetryPolicy};
use crate::tencentcloud::client::TencentCloudClient;
use crate::tencentcloud::error::SdkError;
use serde_json::Value;
use std::time::Duration;

/// Deadline for asynchronous CLB tasks
pub const TASK_TIMEOUT: Duration = Duration::from_secs(10 * 60);
pub const TASK_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct Provider {
    pub client: TencentCloudClient,
    pub locks: ActionLocks,
    pub read_policy: RetryPolicy,
    pub write_policy: RetryPolicy,
    pub task_timeout: Duration,
    pub task_poll_interval: Duration,
}

impl Provider {
    pub fn new(client: TencentCloudClient) -> Self {
        Self {
            client,
            locks: ActionLocks::new(),
            read_policy: RetryPolicy::read(),
            write_policy: RetryPolicy::write(),
            task_timeout: TASK_TIMEOUT,
            task_poll_interval: TASK_POLL_INTERVAL,
        }
    }

    pub fn with_policies(mut self, read: RetryPolicy, write: RetryPolicy) -> Self {
        self.read_policy = read;
        self.write_policy = write;
        self
    }

    pub fn with_task_polling(mut self, interval: Duration, timeout: Duration) -> Self {
        self.task_poll_interval = interval;
        self.task_timeout = timeout;
        self
    }

    /// Describe* call under the read policy
    pub async fn read_call(
        &self,
        service: &str,
        action: &str,
        params: &Value,
        retry_codes: &[&str],
    ) -> Result<Value, SdkError> {
        self.call_with(&self.read_policy, service, action, params, retry_codes)
            .await
    }

    /// Create*/Modify*/Delete* call under the write policy
    pub async fn write_call(
        &self,
        service: &str,
        action: &str,
        params: &Value,
        retry_codes: &[&str],
    ) -> Result<Value, SdkError> {
        self.call_with(&self.write_policy, service, action, params, retry_codes)
            .await
    }

    async fn call_with(
        &self,
        policy: &RetryPolicy,
        service: &str,
        action: &str,
        params: &Value,
        retry_codes: &[&str],
    ) -> Result<Value, SdkError> {
        retry(policy, || async move {
            self.client
                .call(service, action, params)
                .await
                .map_err(|e| retry_error(e, retry_codes))
        })
        .await
    }
}
