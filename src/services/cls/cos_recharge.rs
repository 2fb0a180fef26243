//! `tencentcloud_cls_cos_recharge`
//!
//! Imports log files from a COS bucket into a topic. CLS has no delete action
//! for recharge tasks, so delete disables the task instead.

use super::{ClsService, SERVICE};
use crate::error::ProviderError;
use crate::id;
use crate::mapper::{expand, flatten};
use crate::provider::Provider;
use crate::resource::{ResourceDef, ResourceHandler};
use crate::schema::ResourceData;
use async_trait::async_trait;
use serde_json::{json, Value};

const RESOURCE: &str = "tencentcloud_cls_cos_recharge";

pub struct CosRecharge {
    def: &'static ResourceDef,
}

impl CosRecharge {
    pub fn new(def: &'static ResourceDef) -> Self {
        Self { def }
    }

    /// Delimiter, full regex and multiline logs cannot be parsed without their pattern
    fn check_extract_rule(d: &ResourceData) -> Result<(), ProviderError> {
        let required = match d.get_str("log_type") {
            Some("delimiter_log") => "delimiter",
            Some("fullregex_log") => "log_regex",
            Some("multiline_log") => "begin_regex",
            _ => return Ok(()),
        };
        let present = d
            .head_map("extract_rule_info")
            .and_then(|rule| rule.get(required))
            .and_then(Value::as_str)
            .is_some_and(|v| !v.is_empty());
        if present {
            return Ok(());
        }
        Err(ProviderError::check(
            RESOURCE,
            "Create",
            format!(
                "extract_rule_info.{} is required when log_type is `{}`",
                required,
                d.str_or_empty("log_type")
            ),
        ))
    }
}

#[async_trait]
impl ResourceHandler for CosRecharge {
    async fn create(&self, provider: &Provider, d: &mut ResourceData) -> Result<(), ProviderError> {
        Self::check_extract_rule(d)?;
        let params = expand(d.attributes(), &self.def.fields)?;

        let response = provider
            .write_call(SERVICE, "CreateCosRecharge", &params, &[])
            .await?;
        let recharge_id = response
            .get("Id")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::check(RESOURCE, "Create", "CreateCosRecharge returned no Id"))?;

        d.set("recharge_id", recharge_id);
        let resource_id = self.def.encode_id(d)?;
        d.set_id(resource_id);
        Ok(())
    }

    async fn read(&self, provider: &Provider, d: &mut ResourceData) -> Result<(), ProviderError> {
        let (topic_id, recharge_id) = id::decode_pair(d.id())?;

        let Some(info) = ClsService::new(provider)
            .describe_cos_recharge_by_id(&topic_id, &recharge_id)
            .await?
        else {
            tracing::warn!("resource `{}` [{}] not found, please check if it has been deleted", RESOURCE, d.id());
            d.clear_id();
            return Ok(());
        };

        d.merge(flatten(&info, &self.def.fields)?);
        d.set("topic_id", topic_id.as_str());
        Ok(())
    }

    async fn update(&self, provider: &Provider, d: &mut ResourceData) -> Result<(), ProviderError> {
        let (topic_id, recharge_id) = id::decode_pair(d.id())?;
        if !d.has_change("name") {
            return Ok(());
        }

        let params = json!({
            "TopicId": topic_id,
            "Id": recharge_id,
            "Name": d.str_or_empty("name"),
        });
        provider
            .write_call(SERVICE, "ModifyCosRecharge", &params, &[])
            .await?;
        Ok(())
    }

    async fn delete(&self, provider: &Provider, d: &ResourceData) -> Result<(), ProviderError> {
        let (topic_id, recharge_id) = id::decode_pair(d.id())?;

        let params = json!({
            "TopicId": topic_id,
            "Id": recharge_id,
            "Enable": 0,
        });
        provider
            .write_call(SERVICE, "ModifyCosRecharge", &params, &[])
            .await?;
        Ok(())
    }
}
