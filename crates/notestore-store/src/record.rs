//! Stored records: key extraction and byte encoding.
//!
//! Records are JSON-shaped objects. An object store declares a key path
//! (`"title"`, or a dotted path such as `"meta.id"`), and the string found at
//! that path is the record's key. Persisted values are CBOR-encoded.

use serde_json::Value;

use crate::error::{Result, StoreError};

/// Record key. Only string keys are supported.
pub type Key = String;

/// A record as read back from an object store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub key: Key,
    pub value: Value,
}

/// Extract the key of `value` using `key_path`.
pub fn extract_key(value: &Value, key_path: &str) -> Result<Key> {
    let mut current = value;
    for segment in key_path.split('.') {
        current = current.get(segment).ok_or_else(|| {
            StoreError::Data(format!("key path `{}` not found in record", key_path))
        })?;
    }

    match current {
        Value::String(key) => Ok(key.clone()),
        other => Err(StoreError::Data(format!(
            "key path `{}` must resolve to a string, got {}",
            key_path, other
        ))),
    }
}

/// Encode a record to CBOR bytes.
pub fn encode_value(value: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(buf)
}

/// Decode a record from CBOR bytes.
pub fn decode_value(bytes: &[u8]) -> Result<Value> {
    ciborium::from_reader(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}
