//! `tencentcloud_clb_listener_rules` data source

use super::{ClbService, RuleFilter};
use crate::error::ProviderError;
use crate::mapper::flatten;
use crate::provider::Provider;
use crate::resource::{DataSourceHandler, ResourceDef};
use crate::schema::hash::ids_hash;
use crate::schema::ResourceData;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;

pub struct ListenerRules {
    def: &'static ResourceDef,
}

impl ListenerRules {
    pub fn new(def: &'static ResourceDef) -> Self {
        Self { def }
    }

    fn filter(d: &ResourceData) -> RuleFilter {
        RuleFilter {
            clb_id: d.str_or_empty("clb_id"),
            listener_id: d.str_or_empty("listener_id"),
            rule_id: d.str_or_empty("rule_id"),
            domain: d.str_or_empty("domain"),
            url: d.str_or_empty("url"),
            scheduler: d.str_or_empty("scheduler"),
        }
    }
}

#[async_trait]
impl DataSourceHandler for ListenerRules {
    async fn read(&self, provider: &Provider, d: &mut ResourceData) -> Result<(), ProviderError> {
        let filter = Self::filter(d);
        let rules = ClbService::new(provider).describe_rules_by_filter(&filter).await?;

        let ids: Vec<&str> = rules
            .iter()
            .filter_map(|r| r.get("LocationId").and_then(Value::as_str))
            .collect();
        let id = ids_hash(&ids);

        let mut attrs = flatten(&json!({ "Rules": rules }), &self.def.fields)?;
        let mut rule_list = match attrs.remove("rule_list") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };
        for item in rule_list.iter_mut() {
            if let Value::Object(rule) = item {
                rule.insert("clb_id".into(), json!(filter.clb_id));
                rule.insert("listener_id".into(), json!(filter.listener_id));
            }
        }

        if let Some(path) = d.get_ok("result_output_file").and_then(Value::as_str) {
            write_to_file(path, &rule_list)?;
        }

        d.set("rule_list", rule_list);
        d.set_id(id);
        Ok(())
    }
}

fn write_to_file(path: &str, items: &[Value]) -> Result<(), ProviderError> {
    let output = |source| ProviderError::Output {
        path: path.to_string(),
        source,
    };

    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(output)?;
    }
    let body = serde_json::to_string_pretty(items).map_err(|e| output(e.into()))?;
    std::fs::write(path, body).map_err(output)
}
