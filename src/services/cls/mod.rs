//! Cloud Log Service (CLS)

mod cos_recharge;

pub use cos_recharge::CosRecharge;

use crate::error::ProviderError;
use crate::provider::Provider;
use serde_json::{json, Value};

pub const SERVICE: &str = "cls";

pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFound";

const PAGE_SIZE: u64 = 100;

pub struct ClsService<'a> {
    provider: &'a Provider,
}

impl<'a> ClsService<'a> {
    pub fn new(provider: &'a Provider) -> Self {
        Self { provider }
    }

    /// Every logset matching `filters`, walking all pages
    pub async fn describe_logsets(&self, filters: &[(&str, &str)]) -> Result<Vec<Value>, ProviderError> {
        let filters: Vec<Value> = filters
            .iter()
            .map(|(key, value)| json!({ "Key": key, "Values": [value] }))
            .collect();

        let mut logsets = Vec::new();
        let mut offset = 0;
        loop {
            let params = json!({
                "Filters": filters,
                "Offset": offset,
                "Limit": PAGE_SIZE,
            });
            let response = self
                .provider
                .read_call(SERVICE, "DescribeLogsets", &params, &[])
                .await?;

            let page = response
                .get("Logsets")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let last = (page.len() as u64) < PAGE_SIZE;
            logsets.extend(page);
            if last {
                break;
            }
            offset += PAGE_SIZE;
        }
        Ok(logsets)
    }

    pub async fn describe_logset_by_id(&self, logset_id: &str) -> Result<Option<Value>, ProviderError> {
        let mut logsets = self.describe_logsets(&[("logsetId", logset_id)]).await?;
        Ok((!logsets.is_empty()).then(|| logsets.swap_remove(0)))
    }

    pub async fn delete_logset_by_id(&self, logset_id: &str) -> Result<(), ProviderError> {
        self.provider
            .write_call(SERVICE, "DeleteLogset", &json!({ "LogsetId": logset_id }), &[])
            .await?;
        Ok(())
    }

    /// The recharge task `recharge_id` of a topic, or `None`
    pub async fn describe_cos_recharge_by_id(
        &self,
        topic_id: &str,
        recharge_id: &str,
    ) -> Result<Option<Value>, ProviderError> {
        let response = match self
            .provider
            .read_call(SERVICE, "DescribeCosRecharges", &json!({ "TopicId": topic_id }), &[])
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_expect_error(&[RESOURCE_NOT_FOUND]) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(response
            .get("Data")
            .and_then(Value::as_array)
            .and_then(|data| {
                data.iter()
                    .find(|info| info.get("Id").and_then(Value::as_str) == Some(recharge_id))
            })
            .cloned())
    }
}
