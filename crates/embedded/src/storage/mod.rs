//! Durable key-value storage
//!
//! The sync engine only needs string values under fixed keys. The trait-based
//! design allows swapping between in-memory and SQLite-backed storage.

mod memory;
mod sqlite;
mod traits;

pub use memory::InMemoryKeyValueStore;
pub use sqlite::SqliteKeyValueStore;
pub use traits::KeyValueStore;
