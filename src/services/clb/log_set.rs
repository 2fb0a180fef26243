//! `tencentcloud_clb_log_set`
//!
//! A region holds at most one CLB logset per type. Create adopts the existing
//! one when CLB already knows about it. Read and delete go through CLS.

use super::SERVICE;
use crate::error::ProviderError;
use crate::mapper::{expand, flatten};
use crate::provider::Provider;
use crate::resource::{ResourceDef, ResourceHandler};
use crate::schema::ResourceData;
use crate::services::cls::ClsService;
use async_trait::async_trait;
use serde_json::{json, Value};

const RESOURCE: &str = "tencentcloud_clb_log_set";

pub const LOGSET_TYPE_ACCESS: &str = "ACCESS";
pub const LOGSET_TYPE_HEALTH: &str = "HEALTH";

pub struct LogSet {
    def: &'static ResourceDef,
}

/// Logset ids CLB reports for the region, empty when not created yet
#[derive(Debug, Default, PartialEq, Eq)]
struct ClbLogsets {
    access: String,
    health: String,
}

impl ClbLogsets {
    fn from_response(response: &Value) -> Self {
        let field = |name: &str| {
            response
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            access: field("LogsetId"),
            health: field("HealthLogsetId"),
        }
    }

    fn for_type(&self, logset_type: &str) -> &str {
        if logset_type == LOGSET_TYPE_HEALTH {
            &self.health
        } else {
            &self.access
        }
    }

    fn type_of(&self, logset_id: &str) -> Option<&'static str> {
        if logset_id == self.health {
            Some(LOGSET_TYPE_HEALTH)
        } else if logset_id == self.access {
            Some(LOGSET_TYPE_ACCESS)
        } else {
            None
        }
    }
}

impl LogSet {
    pub fn new(def: &'static ResourceDef) -> Self {
        Self { def }
    }

    async fn describe_clb_logsets(provider: &Provider) -> Result<ClbLogsets, ProviderError> {
        let response = provider
            .read_call(SERVICE, "DescribeClsLogSet", &json!({}), &[])
            .await?;
        Ok(ClbLogsets::from_response(&response))
    }
}

#[async_trait]
impl ResourceHandler for LogSet {
    async fn create(&self, provider: &Provider, d: &mut ResourceData) -> Result<(), ProviderError> {
        let logset_type = d
            .get_str("logset_type")
            .unwrap_or(LOGSET_TYPE_ACCESS)
            .to_string();

        let existing = Self::describe_clb_logsets(provider).await?;
        let adopted = existing.for_type(&logset_type);
        if !adopted.is_empty() {
            tracing::info!("{} adopting existing {} logset {}", RESOURCE, logset_type, adopted);
            d.set("logset_id", adopted);
            let resource_id = self.def.encode_id(d)?;
            d.set_id(resource_id);
            return Ok(());
        }

        let params = expand(d.attributes(), &self.def.fields)?;
        let response = provider
            .write_call(SERVICE, "CreateClsLogSet", &params, &[])
            .await?;
        let logset_id = response
            .get("LogsetId")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::check(RESOURCE, "Create", "CreateClsLogSet returned no LogsetId"))?;

        d.set("logset_id", logset_id);
        let resource_id = self.def.encode_id(d)?;
        d.set_id(resource_id);
        Ok(())
    }

    async fn read(&self, provider: &Provider, d: &mut ResourceData) -> Result<(), ProviderError> {
        let logset_id = d.id().to_string();

        let Some(logset) = ClsService::new(provider).describe_logset_by_id(&logset_id).await? else {
            d.clear_id();
            return Ok(());
        };
        d.merge(flatten(&logset, &self.def.fields)?);

        // Import starts without a type; recover it from what CLB reports
        if d.get_ok("logset_type").is_none() {
            let known = Self::describe_clb_logsets(provider).await?;
            d.set("logset_type", known.type_of(&logset_id).unwrap_or(LOGSET_TYPE_ACCESS));
        }
        Ok(())
    }

    async fn update(&self, _provider: &Provider, _d: &mut ResourceData) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn delete(&self, provider: &Provider, d: &ResourceData) -> Result<(), ProviderError> {
        ClsService::new(provider).delete_logset_by_id(d.id()).await
    }
}
