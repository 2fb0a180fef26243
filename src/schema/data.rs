//! Per-operation attribute map
//!
//! A `ResourceData` lives for one lifecycle operation. It carries the prior
//! state (empty on create), the planned or refreshed attributes, and the
//! resource ID. Read mutates it in place; clearing the ID signals that the
//! remote entity is gone.

use super::{is_zero, AttrMap};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    id: String,
    prior: AttrMap,
    attrs: AttrMap,
}

impl ResourceData {
    /// Fresh data for a create
    pub fn new(config: AttrMap) -> Self {
        Self {
            id: String::new(),
            prior: AttrMap::new(),
            attrs: config,
        }
    }

    /// Data for a read or delete of an existing instance
    pub fn from_state(id: &str, state: AttrMap) -> Self {
        Self {
            id: id.to_string(),
            prior: state.clone(),
            attrs: state,
        }
    }

    /// Data for an update: prior state against planned attributes
    pub fn for_update(id: &str, prior: AttrMap, planned: AttrMap) -> Self {
        Self {
            id: id.to_string(),
            prior,
            attrs: planned,
        }
    }

    /// Data for an import: only the ID is known
    pub fn for_import(id: &str) -> Self {
        Self::from_state(id, AttrMap::new())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Mark the remote entity as gone
    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    pub fn is_gone(&self) -> bool {
        self.id.is_empty()
    }

    /// Value of an attribute, if set and not null
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name).filter(|v| !v.is_null())
    }

    /// Value of an attribute, if set and not the zero value of its type
    pub fn get_ok(&self, name: &str) -> Option<&Value> {
        self.get(name).filter(|v| !is_zero(v))
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// String attribute, empty when unset
    pub fn str_or_empty(&self, name: &str) -> String {
        self.get_str(name).unwrap_or_default().to_string()
    }

    /// First element of a block list (`max_items = 1` blocks), if it is a map
    pub fn head_map(&self, name: &str) -> Option<&AttrMap> {
        self.get(name)?.as_array()?.first()?.as_object()
    }

    /// Set an attribute; `null` removes it
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        if value.is_null() {
            self.attrs.remove(name);
        } else {
            self.attrs.insert(name.to_string(), value);
        }
    }

    /// Whether `name` differs between prior state and planned attributes.
    /// An absent value and the zero value of its type compare equal.
    pub fn has_change(&self, name: &str) -> bool {
        let prior = self.prior.get(name).filter(|v| !v.is_null());
        match (prior, self.get(name)) {
            (Some(value), None) | (None, Some(value)) => !is_zero(value),
            (prior, planned) => prior != planned,
        }
    }

    /// Every attribute that differs from prior state, sorted
    pub fn changed_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .prior
            .keys()
            .chain(self.attrs.keys())
            .filter(|k| self.has_change(k))
            .cloned()
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    pub fn attributes(&self) -> &AttrMap {
        &self.attrs
    }

    pub fn prior(&self) -> &AttrMap {
        &self.prior
    }

    pub fn into_attributes(self) -> AttrMap {
        self.attrs
    }

    /// Merge values into the attribute map, overwriting what is there
    pub fn merge(&mut self, values: AttrMap) {
        for (k, v) in values {
            self.set(&k, v);
        }
    }
}
