//! Storage trait definitions

use anyhow::Result;

/// Trait for durable string storage
///
/// Mirrors a browser-style local storage: one string value per key, with
/// `set` fully replacing any prior value.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;
}
