//! Attribute map to API parameter mapping
//!
//! Each resource declares a table of [`FieldMap`] entries in its JSON
//! definition. [`expand`] walks the table to build request parameters from
//! attributes; [`flatten`] walks it the other way to turn a response object
//! back into attributes.

use crate::schema::{is_zero, AttrMap};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("`{attr}`: cannot convert {found} to {expected}")]
    Type {
        attr: String,
        expected: &'static str,
        found: String,
    },

    #[error("`{attr}`: {value} is negative, expected an unsigned value")]
    Negative { attr: String, value: i64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coercion {
    #[default]
    Direct,
    String,
    Int64,
    Uint64,
    Bool,
    /// `true` is sent as `1`
    BoolInt,
    StringList,
    IntList,
    Upper,
    /// List of at most one block, sent as an object
    Block,
    /// List of blocks, sent as an array of objects
    BlockList,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Both,
    /// Request only
    Expand,
    /// Response only
    Flatten,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMap {
    pub attr: String,
    /// API field name, dotted for nested structs (`HealthCheck.IntervalTime`)
    pub api: String,
    #[serde(default)]
    pub coerce: Coercion,
    #[serde(default)]
    pub direction: Direction,
    /// Send the value even when it is the zero value (`false`, `0`)
    #[serde(default)]
    pub keep_zero: bool,
    /// Mapping of a nested block's attributes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldMap>,
}

impl FieldMap {
    pub fn new(attr: &str, api: &str, coerce: Coercion) -> Self {
        Self {
            attr: attr.to_string(),
            api: api.to_string(),
            coerce,
            direction: Direction::Both,
            keep_zero: false,
            fields: Vec::new(),
        }
    }
}

/// Build request parameters from the attributes present in `attrs`
pub fn expand(attrs: &AttrMap, table: &[FieldMap]) -> Result<Value, MapError> {
    let mut request = Map::new();

    for field in table.iter().filter(|f| f.direction != Direction::Flatten) {
        let Some(value) = attrs.get(&field.attr).filter(|v| !v.is_null()) else {
            continue;
        };
        if !field.keep_zero && is_zero(value) {
            continue;
        }

        let coerced = expand_value(field, value)?;
        set_path(&mut request, &field.api, coerced);
    }

    Ok(Value::Object(request))
}

/// Attributes for every non-null field of `response` named in `table`
pub fn flatten(response: &Value, table: &[FieldMap]) -> Result<AttrMap, MapError> {
    let mut attrs = AttrMap::new();

    for field in table.iter().filter(|f| f.direction != Direction::Expand) {
        let Some(value) = get_path(response, &field.api) else {
            continue;
        };
        attrs.insert(field.attr.clone(), flatten_value(field, value)?);
    }

    Ok(attrs)
}

/// Non-null value at a dotted path
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for part in path.split('.') {
        current = match part.parse::<usize>() {
            Ok(idx) => current.get(idx)?,
            Err(_) => current.get(part)?,
        };
    }
    (!current.is_null()).then_some(current)
}

fn set_path(target: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            target.insert(path.to_string(), value);
        },
        Some((head, rest)) => {
            let child = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(inner) = child {
                set_path(inner, rest, value);
            }
        },
    }
}

/// Longest offending value quoted in a type error
const MAX_FOUND_LENGTH: usize = 64;

fn type_error(field: &FieldMap, expected: &'static str, found: &Value) -> MapError {
    let mut found = found.to_string();
    if found.len() > MAX_FOUND_LENGTH {
        let mut end = MAX_FOUND_LENGTH;
        while !found.is_char_boundary(end) {
            end -= 1;
        }
        found.truncate(end);
    }
    MapError::Type {
        attr: field.attr.clone(),
        expected,
        found,
    }
}

fn as_i64(field: &FieldMap, value: &Value) -> Result<i64, MapError> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
    .ok_or_else(|| type_error(field, "int64", value))
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn expand_value(field: &FieldMap, value: &Value) -> Result<Value, MapError> {
    match field.coerce {
        Coercion::Direct => Ok(value.clone()),
        Coercion::String => as_string(value)
            .map(Value::String)
            .ok_or_else(|| type_error(field, "string", value)),
        Coercion::Upper => as_string(value)
            .map(|s| Value::String(s.to_uppercase()))
            .ok_or_else(|| type_error(field, "string", value)),
        Coercion::Int64 => as_i64(field, value).map(Value::from),
        Coercion::Uint64 => {
            let n = as_i64(field, value)?;
            if n < 0 {
                return Err(MapError::Negative {
                    attr: field.attr.clone(),
                    value: n,
                });
            }
            Ok(Value::from(n as u64))
        },
        Coercion::Bool => value
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| type_error(field, "bool", value)),
        Coercion::BoolInt => value
            .as_bool()
            .map(|b| Value::from(i64::from(b)))
            .ok_or_else(|| type_error(field, "bool", value)),
        Coercion::StringList => {
            let items = value.as_array().ok_or_else(|| type_error(field, "list", value))?;
            items
                .iter()
                .map(|v| {
                    as_string(v)
                        .map(Value::String)
                        .ok_or_else(|| type_error(field, "string", v))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        },
        Coercion::IntList => {
            let items = value.as_array().ok_or_else(|| type_error(field, "list", value))?;
            items
                .iter()
                .map(|v| as_i64(field, v).map(Value::from))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        },
        Coercion::Block => {
            let block = match value {
                Value::Array(items) => items.first(),
                Value::Object(_) => Some(value),
                _ => return Err(type_error(field, "block", value)),
            };
            match block.and_then(Value::as_object) {
                Some(inner) => expand(inner, &field.fields),
                None => Ok(Value::Object(Map::new())),
            }
        },
        Coercion::BlockList => {
            let items = value.as_array().ok_or_else(|| type_error(field, "list", value))?;
            items
                .iter()
                .map(|item| {
                    item.as_object()
                        .ok_or_else(|| type_error(field, "block", item))
                        .and_then(|inner| expand(inner, &field.fields))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        },
    }
}

fn flatten_value(field: &FieldMap, value: &Value) -> Result<Value, MapError> {
    match field.coerce {
        Coercion::Direct => Ok(value.clone()),
        Coercion::String => as_string(value)
            .map(Value::String)
            .ok_or_else(|| type_error(field, "string", value)),
        Coercion::Upper => as_string(value)
            .map(|s| Value::String(s.to_uppercase()))
            .ok_or_else(|| type_error(field, "string", value)),
        Coercion::Int64 => as_i64(field, value).map(Value::from),
        Coercion::Uint64 => value
            .as_u64()
            .map(Value::from)
            .ok_or_else(|| type_error(field, "uint64", value)),
        Coercion::Bool => value
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| type_error(field, "bool", value)),
        Coercion::BoolInt => match value {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            _ => as_i64(field, value).map(|n| Value::Bool(n == 1)),
        },
        Coercion::StringList | Coercion::IntList => value
            .as_array()
            .map(|items| Value::Array(items.clone()))
            .ok_or_else(|| type_error(field, "list", value)),
        Coercion::Block => {
            let inner = flatten(value, &field.fields)?;
            Ok(Value::Array(vec![Value::Object(inner)]))
        },
        Coercion::BlockList => {
            let items = value.as_array().ok_or_else(|| type_error(field, "list", value))?;
            items
                .iter()
                .map(|item| flatten(item, &field.fields).map(Value::Object))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        },
    }
}
