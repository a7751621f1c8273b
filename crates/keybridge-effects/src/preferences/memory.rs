//! In-memory preference handler for testing and ephemeral hosts

use keybridge_core::effects::PreferenceEffects;
use keybridge_core::{BridgeError, Result};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory preference store
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    values: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryPreferenceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` has ever been written
    pub fn contains(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }
}

impl PreferenceEffects for MemoryPreferenceStore {
    fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        match self.values.read().get(key) {
            None => Ok(default),
            Some(Value::Bool(value)) => Ok(*value),
            Some(other) => Err(BridgeError::serialization(format!(
                "preference {key} is not a boolean: {other}"
            ))),
        }
    }

    fn put_bool(&self, key: &str, value: bool) -> Result<()> {
        self.values.write().insert(key.to_string(), Value::Bool(value));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_until_written() {
        let store = MemoryPreferenceStore::new();
        assert!(store.get_bool("BLANK_PREVIEW", true).unwrap());
        assert!(!store.contains("BLANK_PREVIEW"));

        store.put_bool("BLANK_PREVIEW", false).unwrap();
        assert!(!store.get_bool("BLANK_PREVIEW", true).unwrap());
        assert!(store.contains("BLANK_PREVIEW"));
    }

    #[test]
    fn test_clones_share_state() {
        let store = MemoryPreferenceStore::new();
        let other = store.clone();
        store.put_bool("flag", true).unwrap();
        assert!(other.get_bool("flag", false).unwrap());
    }
}
