//! Cloud Load Balancer (CLB)
//!
//! Rules have no Describe action of their own. They are found by walking the
//! `Rules` of their listener, which is what [`ClbService::describe_rules_by_filter`]
//! does. Every mutation is asynchronous on the CLB side and is followed by
//! [`wait_for_task_finish`].

mod listener_rule;
mod listener_rules;
mod log_set;

pub use listener_rule::ListenerRule;
pub use listener_rules::ListenerRules;
pub use log_set::LogSet;

use crate::error::ProviderError;
use crate::provider::Provider;
use crate::resource::waiter::{request_id, wait_for_task_finish};
use serde_json::{json, Value};

pub const SERVICE: &str = "clb";

pub const LB_ID_NOT_FOUND: &str = "InvalidParameter.LBIdNotFound";

pub const PROTOCOL_HTTP: &str = "HTTP";
pub const PROTOCOL_HTTPS: &str = "HTTPS";
pub const SCHEDULER_WRR: &str = "WRR";
pub const CERT_SSL_MODE_MUTUAL: &str = "MUTUAL";

/// Rule filter; empty fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleFilter {
    pub clb_id: String,
    pub listener_id: String,
    pub rule_id: String,
    pub domain: String,
    pub url: String,
    pub scheduler: String,
}

impl RuleFilter {
    pub fn matches(&self, rule: &Value) -> bool {
        let field = |name: &str| rule.get(name).and_then(Value::as_str).unwrap_or_default();
        [
            (&self.domain, "Domain"),
            (&self.url, "Url"),
            (&self.rule_id, "LocationId"),
            (&self.scheduler, "Scheduler"),
        ]
        .iter()
        .all(|(want, name)| want.is_empty() || field(name) == want.as_str())
    }
}

pub struct ClbService<'a> {
    provider: &'a Provider,
}

impl<'a> ClbService<'a> {
    pub fn new(provider: &'a Provider) -> Self {
        Self { provider }
    }

    /// The listener, or `None` when it or its load balancer does not exist
    pub async fn describe_listener_by_id(
        &self,
        clb_id: &str,
        listener_id: &str,
    ) -> Result<Option<Value>, ProviderError> {
        let params = json!({
            "LoadBalancerId": clb_id,
            "ListenerIds": [listener_id],
        });

        let response = match self
            .provider
            .read_call(SERVICE, "DescribeListeners", &params, &[])
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_expect_error(&[LB_ID_NOT_FOUND]) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(response
            .get("Listeners")
            .and_then(|l| l.get(0))
            .filter(|l| !l.is_null())
            .cloned())
    }

    /// Protocol of a listener that must exist
    pub async fn listener_protocol(
        &self,
        resource: &str,
        op: &'static str,
        clb_id: &str,
        listener_id: &str,
    ) -> Result<String, ProviderError> {
        let listener = self
            .describe_listener_by_id(clb_id, listener_id)
            .await?
            .ok_or_else(|| {
                ProviderError::check(
                    resource,
                    op,
                    format!("CLB listener {} of {} not found", listener_id, clb_id),
                )
            })?;

        Ok(listener
            .get("Protocol")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    /// Rules of the filter's listener that match the filter
    pub async fn describe_rules_by_filter(&self, filter: &RuleFilter) -> Result<Vec<Value>, ProviderError> {
        if filter.clb_id.is_empty() || filter.listener_id.is_empty() {
            return Err(ProviderError::check(
                "CLB rule",
                "Describe",
                "Listener id and CLB id can not be null",
            ));
        }

        let Some(listener) = self
            .describe_listener_by_id(&filter.clb_id, &filter.listener_id)
            .await?
        else {
            return Ok(Vec::new());
        };

        let rules = listener
            .get("Rules")
            .and_then(Value::as_array)
            .map(|rules| rules.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default();
        Ok(rules)
    }

    /// Run a mutation and wait for its CLB task
    pub async fn mutate(&self, action: &str, params: &Value) -> Result<Value, ProviderError> {
        let response = self
            .provider
            .write_call(SERVICE, action, params, &[])
            .await?;

        match request_id(&response) {
            Some(task_id) => wait_for_task_finish(self.provider, task_id).await?,
            None => tracing::warn!("api[{}] returned no request id, not waiting for task", action),
        }
        Ok(response)
    }

    pub async fn delete_rule_by_id(
        &self,
        clb_id: &str,
        listener_id: &str,
        location_id: &str,
    ) -> Result<(), ProviderError> {
        let params = json!({
            "LoadBalancerId": clb_id,
            "ListenerId": listener_id,
            "LocationIds": [location_id],
        });
        self.mutate("DeleteRule", &params).await?;
        Ok(())
    }
}
