//! Resource schemas and attribute maps
//!
//! A schema is declared in the embedded resource JSON, next to the field
//! mapping that ties it to API parameters. Configuration and state are both
//! plain JSON objects keyed by attribute name.
//!
//! - [`data`] - Per-operation attribute map with prior/planned values
//! - [`hash`] - Stable hashing for set elements and data source IDs

pub mod data;
pub mod hash;

pub use data::ResourceData;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Attribute values keyed by attribute name
pub type AttrMap = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttrType {
    String,
    Int,
    Bool,
    Float,
    List,
    Set,
    Map,
}

impl AttrType {
    fn accepts(self, value: &Value) -> bool {
        match self {
            AttrType::String => value.is_string(),
            AttrType::Int => value.is_i64() || value.is_u64(),
            AttrType::Bool => value.is_boolean(),
            AttrType::Float => value.is_number(),
            AttrType::List | AttrType::Set => value.is_array(),
            AttrType::Map => value.is_object(),
        }
    }
}

/// Declared validators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Validation {
    IntInRange { min: i64, max: i64 },
    AllowedValues { values: Vec<String> },
    ForbiddenValues { values: Vec<String> },
    StringLenBetween { min: usize, max: usize },
}

impl Validation {
    fn check(&self, name: &str, value: &Value) -> Option<String> {
        match self {
            Validation::IntInRange { min, max } => {
                let n = value.as_i64()?;
                (n < *min || n > *max)
                    .then(|| format!("`{}`: {} is not in range [{}, {}]", name, n, min, max))
            },
            Validation::AllowedValues { values } => {
                let s = scalar_string(value)?;
                (!values.iter().any(|v| *v == s)).then(|| {
                    format!("`{}`: `{}` is not one of [{}]", name, s, values.join(", "))
                })
            },
            Validation::ForbiddenValues { values } => {
                let s = scalar_string(value)?;
                values
                    .iter()
                    .any(|v| *v == s)
                    .then(|| format!("`{}`: `{}` is not allowed", name, s))
            },
            Validation::StringLenBetween { min, max } => {
                let len = value.as_str()?.chars().count();
                (len < *min || len > *max).then(|| {
                    format!("`{}`: length {} is not in range [{}, {}]", name, len, min, max)
                })
            },
        }
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Element type of a list, set or map attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Elem {
    Scalar(AttrType),
    Block(Schema),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub attr_type: AttrType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub computed: bool,
    #[serde(default)]
    pub force_new: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validate: Vec<Validation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elem: Option<Elem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(default)]
    pub description: String,
}

impl Attribute {
    /// Set only by the remote side
    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }

    pub fn block(&self) -> Option<&Schema> {
        match &self.elem {
            Some(Elem::Block(schema)) => Some(schema),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid configuration: {}", .diagnostics.join("; "))]
pub struct SchemaError {
    pub diagnostics: Vec<String>,
}

/// Attribute name to attribute declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(pub BTreeMap<String, Attribute>);

impl Schema {
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Attribute)> {
        self.0.iter()
    }

    /// Check a configuration, collecting every problem before failing
    pub fn validate(&self, config: &AttrMap) -> Result<(), SchemaError> {
        let mut diagnostics = Vec::new();
        self.collect_diagnostics("", config, &mut diagnostics);
        if diagnostics.is_empty() {
            Ok(())
        } else {
            Err(SchemaError { diagnostics })
        }
    }

    fn collect_diagnostics(&self, prefix: &str, config: &AttrMap, out: &mut Vec<String>) {
        for key in config.keys() {
            if !self.0.contains_key(key) {
                out.push(format!("`{}{}`: unsupported argument", prefix, key));
            }
        }

        for (name, attr) in &self.0 {
            let path = format!("{}{}", prefix, name);
            let value = config.get(name).filter(|v| !v.is_null());

            let Some(value) = value else {
                if attr.required {
                    out.push(format!("`{}`: required field is not set", path));
                }
                continue;
            };

            if attr.is_computed_only() {
                out.push(format!("`{}`: computed attribute cannot be set", path));
                continue;
            }

            if !attr.attr_type.accepts(value) {
                out.push(format!("`{}`: expected {:?}", path, attr.attr_type));
                continue;
            }

            for validation in &attr.validate {
                if let Some(msg) = validation.check(&path, value) {
                    out.push(msg);
                }
            }

            match (value, &attr.elem) {
                (Value::Array(items), elem) => {
                    if let Some(max) = attr.max_items {
                        if items.len() > max {
                            out.push(format!(
                                "`{}`: at most {} item(s) allowed, got {}",
                                path,
                                max,
                                items.len()
                            ));
                        }
                    }
                    for (i, item) in items.iter().enumerate() {
                        check_elem(&format!("{}.{}", path, i), item, elem.as_ref(), out);
                    }
                },
                (Value::Object(map), Some(Elem::Scalar(t))) => {
                    for (k, v) in map {
                        if !t.accepts(v) {
                            out.push(format!("`{}.{}`: expected {:?}", path, k, t));
                        }
                    }
                },
                _ => {},
            }
        }
    }

    /// Fill in declared defaults for absent attributes, including inside blocks
    pub fn apply_defaults(&self, config: &mut AttrMap) {
        for (name, attr) in &self.0 {
            let absent = config.get(name).map_or(true, Value::is_null);
            if absent {
                if let Some(default) = &attr.default {
                    config.insert(name.clone(), default.clone());
                }
                continue;
            }

            if let (Some(block), Some(Value::Array(items))) = (attr.block(), config.get_mut(name)) {
                for item in items.iter_mut() {
                    if let Value::Object(inner) = item {
                        block.apply_defaults(inner);
                    }
                }
            }
        }
    }

    /// Computed attributes with no value in `state`
    pub fn missing_computed(&self, state: &AttrMap) -> Vec<String> {
        self.0
            .iter()
            .filter(|(_, attr)| attr.computed)
            .filter(|(name, _)| state.get(name.as_str()).map_or(true, Value::is_null))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Dedupe and order set-typed attributes so equal sets compare equal
    pub fn normalize(&self, state: &mut AttrMap) {
        for (name, attr) in &self.0 {
            let Some(value) = state.get_mut(name) else {
                continue;
            };

            if let (Some(block), Value::Array(items)) = (attr.block(), &mut *value) {
                for item in items.iter_mut() {
                    if let Value::Object(inner) = item {
                        block.normalize(inner);
                    }
                }
            }

            if attr.attr_type == AttrType::Set {
                if let Value::Array(items) = value {
                    *items = hash::normalize_set(std::mem::take(items));
                }
            }
        }
    }

    /// Names of attributes whose change requires replacement
    pub fn force_new_attributes(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|(_, attr)| attr.force_new)
            .map(|(name, _)| name.as_str())
    }
}

fn check_elem(path: &str, item: &Value, elem: Option<&Elem>, out: &mut Vec<String>) {
    match elem {
        Some(Elem::Scalar(t)) if !t.accepts(item) => {
            out.push(format!("`{}`: expected {:?}", path, t));
        },
        Some(Elem::Block(block)) => match item {
            Value::Object(inner) => block.collect_diagnostics(&format!("{}.", path), inner, out),
            _ => out.push(format!("`{}`: expected block", path)),
        },
        _ => {},
    }
}

/// Zero value test used by `get_ok`
pub fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
