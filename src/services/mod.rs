//! Service Dispatch
//!
//! Maps resource type names to their handlers.

pub mod clb;
pub mod cls;

use crate::resource::{DataSourceHandler, ResourceDef, ResourceHandler};

/// Handler for a managed resource type
pub fn handler_for(type_name: &str, def: &'static ResourceDef) -> Option<Box<dyn ResourceHandler>> {
    tracing::debug!("handler_for: type={}, service={}", type_name, def.service);

    match type_name {
        "tencentcloud_clb_listener_rule" => Some(Box::new(clb::ListenerRule::new(def))),
        "tencentcloud_clb_log_set" => Some(Box::new(clb::LogSet::new(def))),
        "tencentcloud_cls_cos_recharge" => Some(Box::new(cls::CosRecharge::new(def))),
        _ => None,
    }
}

/// Handler for a data source type
pub fn data_source_for(type_name: &str, def: &'static ResourceDef) -> Option<Box<dyn DataSourceHandler>> {
    tracing::debug!("data_source_for: type={}, service={}", type_name, def.service);

    match type_name {
        "tencentcloud_clb_listener_rules" => Some(Box::new(clb::ListenerRules::new(def))),
        _ => None,
    }
}
