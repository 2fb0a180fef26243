//! Local state file
//!
//! Maps resource addresses (`<type>.<name>`) to the last known ID and
//! attributes of each managed instance. Only successful operations write
//! to it.

use crate::schema::AttrMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

pub const STATE_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("state file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("state file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("state file version {0} is not supported")]
    Version(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceState {
    pub resource_type: String,
    pub id: String,
    #[serde(default)]
    pub attributes: AttrMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,
    #[serde(default)]
    pub resources: BTreeMap<String, InstanceState>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            resources: BTreeMap::new(),
        }
    }
}

pub fn address(resource_type: &str, name: &str) -> String {
    format!("{}.{}", resource_type, name)
}

impl StateFile {
    /// Load state, starting empty when the file does not exist
    pub fn load(path: &Path) -> Result<Self, StateError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let state: StateFile = serde_json::from_str(&content)?;
        if state.version != STATE_VERSION {
            return Err(StateError::Version(state.version));
        }
        Ok(state)
    }

    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn get(&self, address: &str) -> Option<&InstanceState> {
        self.resources.get(address)
    }

    pub fn insert(&mut self, address: String, instance: InstanceState) {
        self.resources.insert(address, instance);
    }

    pub fn remove(&mut self, address: &str) -> Option<InstanceState> {
        self.resources.remove(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("tcprov-state-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[test]
    fn test_missing_file_is_empty_state() {
        let state = StateFile::load(&temp_path("absent.json")).unwrap();
        assert!(state.resources.is_empty());
        assert_eq!(state.version, STATE_VERSION);
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("state.json");
        let mut state = StateFile::default();
        state.insert(
            address("tencentcloud_cls_cos_recharge", "main"),
            InstanceState {
                resource_type: "tencentcloud_cls_cos_recharge".into(),
                id: "topic-1#rc-1".into(),
                attributes: json!({"name": "test"}).as_object().cloned().unwrap(),
            },
        );
        state.save(&path).unwrap();

        let loaded = StateFile::load(&path).unwrap();
        assert_eq!(loaded, state);
        assert_eq!(
            loaded.get("tencentcloud_cls_cos_recharge.main").unwrap().id,
            "topic-1#rc-1"
        );
    }

    #[test]
    fn test_rejects_unknown_version() {
        let path = temp_path("old.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"version": 99, "resources": {}}"#).unwrap();
        assert!(matches!(StateFile::load(&path), Err(StateError::Version(99))));
    }
}
