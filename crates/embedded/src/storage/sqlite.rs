//! SQLite-backed key-value store

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use rusqlite_migration::{M, Migrations};

use super::KeyValueStore;

/// Database migrations
///
/// The user_version pragma tracks which migrations have been applied.
fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(
        r#"
        CREATE TABLE kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )])
}

/// SQLite key-value storage
///
/// One row per key; writes are upserts so a `set` always replaces.
pub struct SqliteKeyValueStore {
    conn: Mutex<Connection>,
}

impl SqliteKeyValueStore {
    /// Open (or create) the store at `db_path`
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())
            .with_context(|| format!("Failed to open database at {:?}", db_path.as_ref()))?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        // WAL keeps readers unblocked while a sync cycle persists
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            "#,
        )?;

        migrations()
            .to_latest(&mut conn)
            .context("Failed to run database migrations")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let value: Option<String> = conn
            .query_row("SELECT value FROM kv WHERE key = ?", [key], |row| row.get(0))
            .optional()
            .with_context(|| format!("Failed to read key {}", key))?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value],
        )
        .with_context(|| format!("Failed to write key {}", key))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_store() -> (SqliteKeyValueStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        // Use .test.sqlite extension to clearly distinguish from production databases
        let store = SqliteKeyValueStore::new(dir.path().join("embedded.test.sqlite")).unwrap();
        (store, dir)
    }

    #[test]
    fn test_set_and_get() {
        let (store, _dir) = create_test_store();
        assert_eq!(store.get("ledger").unwrap(), None);

        store.set("ledger", r#"["a","b"]"#).unwrap();
        assert_eq!(store.get("ledger").unwrap().as_deref(), Some(r#"["a","b"]"#));
    }

    #[test]
    fn test_set_replaces_value() {
        let (store, _dir) = create_test_store();
        store.set("k", "first").unwrap();
        store.set("k", "second").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("embedded.test.sqlite");

        {
            let store = SqliteKeyValueStore::new(&path).unwrap();
            store.set("k", "persisted").unwrap();
        }

        let reopened = SqliteKeyValueStore::new(&path).unwrap();
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("persisted"));
    }

    #[test]
    fn test_in_memory_store() {
        let store = SqliteKeyValueStore::in_memory().unwrap();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }
}
