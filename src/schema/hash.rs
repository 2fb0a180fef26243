//! Stable hashing of attribute values
//!
//! Hashes are taken over the canonical JSON text of a value. `serde_json`
//! keeps object keys sorted, so two equal values always hash the same.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// 64-bit hash of a value
pub fn hash_value(value: &Value) -> u64 {
    let digest = Sha256::digest(value.to_string().as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

/// Dedupe set elements and order them by hash
pub fn normalize_set(items: Vec<Value>) -> Vec<Value> {
    let mut keyed: Vec<(u64, Value)> = items.into_iter().map(|v| (hash_value(&v), v)).collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.dedup_by(|a, b| a.0 == b.0 && a.1 == b.1);
    keyed.into_iter().map(|(_, v)| v).collect()
}

/// ID for a data source result, derived from the IDs it returned
pub fn ids_hash<S: AsRef<str>>(ids: &[S]) -> String {
    let mut hasher = Sha256::new();
    for id in ids {
        hasher.update(id.as_ref().as_bytes());
        hasher.update(b"-");
    }
    hex::encode(&hasher.finalize()[..8])
}
