use rusqlite::Connection;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use crate::db::{self, DbError, OptionalRow};
use crate::models::now_iso;

/// A string-keyed slot store. The history keeps its whole collection in one slot.
pub trait BackingStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, DbError>;
    fn set(&self, key: &str, value: &str) -> Result<(), DbError>;
    fn remove(&self, key: &str) -> Result<(), DbError>;
}

#[derive(Default)]
pub struct MemoryBackend {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BackingStore for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, DbError> {
        let slots = self.slots.lock().map_err(|_| DbError::Poisoned)?;
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DbError> {
        let mut slots = self.slots.lock().map_err(|_| DbError::Poisoned)?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DbError> {
        let mut slots = self.slots.lock().map_err(|_| DbError::Poisoned)?;
        slots.remove(key);
        Ok(())
    }
}

/// Durable slots in the `kv_store` table.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    pub fn open(path: &Path) -> Result<Self, DbError> {
        Ok(Self::from_connection(db::open(path)?))
    }

    pub fn in_memory() -> Result<Self, DbError> {
        Ok(Self::from_connection(db::open_in_memory()?))
    }

    /// Expects a connection that already went through `db::init_db`.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn: Mutex::new(conn) }
    }
}

impl BackingStore for SqliteBackend {
    fn get(&self, key: &str) -> Result<Option<String>, DbError> {
        let conn = self.conn.lock().map_err(|_| DbError::Poisoned)?;
        let value = conn.query_row(
            "SELECT value FROM kv_store WHERE key = ?1",
            [key],
            |r| r.get(0)
        ).optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DbError> {
        let conn = self.conn.lock().map_err(|_| DbError::Poisoned)?;
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at=excluded.updated_at",
            (key, value, &now_iso())
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DbError> {
        let conn = self.conn.lock().map_err(|_| DbError::Poisoned)?;
        conn.execute("DELETE FROM kv_store WHERE key = ?1", [key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exercise(backend: &dyn BackingStore) {
        assert_eq!(backend.get("k").unwrap(), None);
        backend.set("k", "one").unwrap();
        backend.set("k", "two").unwrap();
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("two"));
        backend.remove("k").unwrap();
        backend.remove("k").unwrap();
        assert_eq!(backend.get("k").unwrap(), None);
    }

    #[test]
    fn test_memory_backend() {
        exercise(&MemoryBackend::new());
    }

    #[test]
    fn test_sqlite_backend() {
        exercise(&SqliteBackend::in_memory().unwrap());
    }

    #[test]
    fn test_sqlite_backend_persists_across_opens() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("history.sqlite");

        SqliteBackend::open(&path).unwrap().set("slot", "[]").unwrap();
        let reopened = SqliteBackend::open(&path).unwrap();
        assert_eq!(reopened.get("slot").unwrap().as_deref(), Some("[]"));
    }
}
