//! `tencentcloud_clb_listener_rule`
//!
//! A forwarding rule (domain + url) on an HTTP/HTTPS listener. The ID is
//! `clb_id#listener_id#rule_id`; a bare `rule_id` from older state is still
//! accepted when `clb_id` and `listener_id` are known.

use super::{ClbService, RuleFilter, CERT_SSL_MODE_MUTUAL, PROTOCOL_HTTP, PROTOCOL_HTTPS, SCHEDULER_WRR};
use crate::error::ProviderError;
use crate::id;
use crate::mapper::{expand, flatten};
use crate::provider::Provider;
use crate::resource::{ResourceDef, ResourceHandler};
use crate::retry::{retry, RetryError};
use crate::schema::{AttrMap, ResourceData};
use async_trait::async_trait;
use serde_json::{json, Value};

const RESOURCE: &str = "tencentcloud_clb_listener_rule";

const CERTIFICATE_ATTRS: &[&str] = &["certificate_ssl_mode", "certificate_id", "certificate_ca_id"];

/// Attributes `ModifyRule` can change in place
const MODIFIABLE_ATTRS: &[&str] = &[
    "scheduler",
    "session_expire_time",
    "health_check_switch",
    "health_check_interval_time",
    "health_check_health_num",
    "health_check_unhealth_num",
    "health_check_http_code",
    "health_check_http_path",
    "health_check_http_domain",
    "health_check_http_method",
];

pub struct ListenerRule {
    def: &'static ResourceDef,
}

impl ListenerRule {
    pub fn new(def: &'static ResourceDef) -> Self {
        Self { def }
    }

    /// `(clb_id, listener_id, rule_id)` from the ID, falling back to state
    /// for the legacy single-part form
    fn rule_key(d: &ResourceData) -> Result<(String, String, String), ProviderError> {
        let parts = id::decode_one_of(d.id(), &[1, 3])?;
        if parts.len() == 3 {
            return Ok(id::decode_triple(d.id())?);
        }

        let clb_id = d.str_or_empty("clb_id");
        let listener_id = d.str_or_empty("listener_id");
        if clb_id.is_empty() || listener_id.is_empty() {
            return Err(ProviderError::check(
                RESOURCE,
                "Read",
                format!("id `{}` needs clb_id and listener_id, use `clb_id#listener_id#rule_id`", d.id()),
            ));
        }
        Ok((clb_id, listener_id, d.id().to_string()))
    }

    fn check_session_expire_time(d: &ResourceData, op: &'static str) -> Result<(), ProviderError> {
        let scheduler = d.get_str("scheduler").unwrap_or_default();
        if scheduler != SCHEDULER_WRR && !scheduler.is_empty() {
            return Err(ProviderError::check(
                RESOURCE,
                op,
                "session_expire_time can only be set when scheduler is WRR",
            ));
        }
        Ok(())
    }

    fn check_certificate(d: &ResourceData, protocol: &str) -> Result<(), ProviderError> {
        if !CERTIFICATE_ATTRS.iter().any(|a| d.get_ok(a).is_some()) {
            return Ok(());
        }
        if protocol != PROTOCOL_HTTPS {
            return Err(ProviderError::check(
                RESOURCE,
                "Create",
                "certificate para can only be set with rule of listener with protocol 'HTTPS'",
            ));
        }
        if d.get_ok("certificate_id").is_none() {
            return Err(ProviderError::check(RESOURCE, "Create", "certificate_id is null"));
        }
        if d.get_str("certificate_ssl_mode") == Some(CERT_SSL_MODE_MUTUAL) && d.get_ok("certificate_ca_id").is_none() {
            return Err(ProviderError::check(
                RESOURCE,
                "Create",
                "certificate_ca_id is null and the ssl mode is 'MUTUAL'",
            ));
        }
        Ok(())
    }

    fn check_protocol(protocol: &str, op: &'static str) -> Result<(), ProviderError> {
        if protocol == PROTOCOL_HTTP || protocol == PROTOCOL_HTTPS {
            return Ok(());
        }
        Err(ProviderError::check(
            RESOURCE,
            op,
            "The rule can only be created/modified with listeners of protocol HTTP/HTTPS",
        ))
    }

    /// Location id of a just-created rule, found by domain and url
    async fn find_location_id(
        &self,
        provider: &Provider,
        filter: &RuleFilter,
    ) -> Result<String, ProviderError> {
        let service = &ClbService::new(provider);
        retry(&provider.read_policy, || async move {
            let rules = service
                .describe_rules_by_filter(filter)
                .await
                .map_err(RetryError::NonRetryable)?;
            rules
                .first()
                .and_then(|r| r.get("LocationId"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| RetryError::Retryable(ProviderError::not_found(RESOURCE, &filter.domain)))
        })
        .await
    }
}

#[async_trait]
impl ResourceHandler for ListenerRule {
    async fn create(&self, provider: &Provider, d: &mut ResourceData) -> Result<(), ProviderError> {
        let service = ClbService::new(provider);
        let clb_id = d.str_or_empty("clb_id");
        let listener_id = d.str_or_empty("listener_id");

        let protocol = service
            .listener_protocol(RESOURCE, "Create", &clb_id, &listener_id)
            .await?;
        Self::check_protocol(&protocol, "Create")?;
        if d.get_ok("session_expire_time").is_some() {
            Self::check_session_expire_time(d, "Create")?;
        }
        Self::check_certificate(d, &protocol)?;

        let rule = expand(d.attributes(), &self.def.fields)?;
        let params = json!({
            "LoadBalancerId": clb_id,
            "ListenerId": listener_id,
            "Rules": [rule],
        });
        let response = service.mutate("CreateRule", &params).await?;

        let location_id = match response
            .get("LocationIds")
            .and_then(|ids| ids.get(0))
            .and_then(Value::as_str)
        {
            Some(location_id) => location_id.to_string(),
            None => {
                let filter = RuleFilter {
                    clb_id: clb_id.clone(),
                    listener_id: listener_id.clone(),
                    domain: d.str_or_empty("domain"),
                    url: d.str_or_empty("url"),
                    ..Default::default()
                };
                self.find_location_id(provider, &filter).await?
            },
        };

        d.set("rule_id", location_id.as_str());
        let resource_id = self.def.encode_id(d)?;
        d.set_id(resource_id);
        Ok(())
    }

    async fn read(&self, provider: &Provider, d: &mut ResourceData) -> Result<(), ProviderError> {
        let (clb_id, listener_id, rule_id) = Self::rule_key(d)?;
        let filter = RuleFilter {
            clb_id: clb_id.clone(),
            listener_id: listener_id.clone(),
            rule_id: rule_id.clone(),
            ..Default::default()
        };

        let rules = ClbService::new(provider).describe_rules_by_filter(&filter).await?;
        let Some(rule) = rules.first() else {
            d.clear_id();
            return Ok(());
        };

        d.merge(flatten(rule, &self.def.fields)?);
        d.set("clb_id", clb_id.as_str());
        d.set("listener_id", listener_id.as_str());

        d.set("rule_id", rule_id.as_str());
        let canonical = self.def.encode_id(d)?;
        if d.id() != canonical {
            tracing::info!("upgrading legacy id `{}` to `{}`", d.id(), canonical);
            d.set_id(canonical);
        }
        Ok(())
    }

    async fn update(&self, provider: &Provider, d: &mut ResourceData) -> Result<(), ProviderError> {
        let (clb_id, listener_id, rule_id) = Self::rule_key(d)?;
        let service = ClbService::new(provider);

        let protocol = service
            .listener_protocol(RESOURCE, "Update", &clb_id, &listener_id)
            .await?;
        Self::check_protocol(&protocol, "Update")?;
        if d.has_change("session_expire_time") {
            Self::check_session_expire_time(d, "Update")?;
        }

        let changed: AttrMap = MODIFIABLE_ATTRS
            .iter()
            .filter(|name| d.has_change(name))
            .filter_map(|name| d.get(name).map(|v| (name.to_string(), v.clone())))
            .collect();
        if changed.is_empty() {
            return Ok(());
        }

        let mut params = expand(&changed, &self.def.fields)?;
        if let Value::Object(map) = &mut params {
            map.insert("LoadBalancerId".into(), json!(clb_id));
            map.insert("ListenerId".into(), json!(listener_id));
            map.insert("LocationId".into(), json!(rule_id));
        }
        service.mutate("ModifyRule", &params).await?;
        Ok(())
    }

    async fn delete(&self, provider: &Provider, d: &ResourceData) -> Result<(), ProviderError> {
        let (clb_id, listener_id, rule_id) = Self::rule_key(d)?;
        ClbService::new(provider)
            .delete_rule_by_id(&clb_id, &listener_id, &rule_id)
            .await
    }
}
