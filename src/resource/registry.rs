//! Resource Registry - Load resource definitions from JSON
//!
//! This module loads all resource and data source definitions from embedded
//! JSON files and provides lookup functions for the rest of the crate.

use crate::id::{self, IdError};
use crate::mapper::FieldMap;
use crate::schema::{ResourceData, Schema};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[
    include_str!("../resources/clb.json"),
    include_str!("../resources/cls.json"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Resource,
    DataSource,
}

/// Resource definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    pub display_name: String,
    pub service: String,
    pub kind: ResourceKind,
    /// Attributes joined into the resource ID
    #[serde(default)]
    pub id_fields: Vec<String>,
    #[serde(default)]
    pub importable: bool,
    /// Attributes that can never change once created
    #[serde(default)]
    pub immutable: Vec<String>,
    /// Action lock held during create/update/delete
    #[serde(default)]
    pub lock: Option<String>,
    pub schema: Schema,
    /// Attribute to API field mapping
    #[serde(default)]
    pub fields: Vec<FieldMap>,
}

impl ResourceDef {
    /// Resource ID joined from the `id_fields` attributes of `d`
    pub fn encode_id(&self, d: &ResourceData) -> Result<String, IdError> {
        let fields: Vec<String> = self.id_fields.iter().map(|f| d.str_or_empty(f)).collect();
        id::encode(&fields)
    }
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub resources: HashMap<String, ResourceDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = ResourceConfig {
            resources: HashMap::new(),
        };

        for content in RESOURCE_FILES {
            let partial: ResourceConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            final_config.resources.extend(partial.resources);
        }

        final_config
    })
}

/// Get a resource or data source definition by type name
pub fn get_resource(key: &str) -> Option<&'static ResourceDef> {
    get_registry().resources.get(key)
}

/// Get all type names, sorted
pub fn get_all_resource_keys() -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = get_registry()
        .resources
        .keys()
        .map(|s| s.as_str())
        .collect();
    keys.sort_unstable();
    keys
}
