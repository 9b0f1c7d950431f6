//! In-memory key-value store
//!
//! Used for tests and for hosts that do not need state across restarts.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::KeyValueStore;

/// In-memory implementation of KeyValueStore
#[derive(Default)]
pub struct InMemoryKeyValueStore {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
