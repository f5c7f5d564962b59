//! Key-value persistence layer for ChainLab state snapshots

use crate::error::{LabError, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// How long a writer waits for another connection's lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Read-modify-write callback: receives the stored bytes and returns the new ones.
pub type UpdateFn<'a> = dyn FnMut(Option<Vec<u8>>) -> Result<Vec<u8>> + 'a;

/// Abstraction for persistence backends. Values are opaque bytes keyed by string.
pub trait KeyValueStore: Send + Sync {
    fn put(&self, key: &str, value: &[u8]) -> Result<()>;
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn delete(&self, key: &str) -> Result<()>;

    /// Replace the value under `key` with `apply(current)`. No other writer
    /// can change `key` between the read and the write. An error from
    /// `apply` leaves the stored value untouched.
    fn update(&self, key: &str, apply: &mut UpdateFn<'_>) -> Result<()>;
}

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database. `":memory:"` gives a private in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| LabError::DatabaseError(format!("Failed to open database: {}", e)))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL
            )",
            [],
        )
        .map_err(|e| LabError::DatabaseError(format!("Failed to create kv table: {}", e)))?;

        Ok(Database { conn: Mutex::new(conn) })
    }
}

impl KeyValueStore for Database {
    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )
        .map_err(|e| LabError::DatabaseError(format!("Failed to save key '{}': {}", key, e)))?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.conn.lock();
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, Vec<u8>>(0)
            })
            .optional()
            .map_err(|e| LabError::DatabaseError(format!("Failed to load key '{}': {}", key, e)))?;
        Ok(value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn update(&self, key: &str, apply: &mut UpdateFn<'_>) -> Result<()> {
        let mut conn = self.conn.lock();
        // IMMEDIATE takes the write lock up front, so other processes queue here.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| LabError::DatabaseError(format!("Failed to lock key '{}': {}", key, e)))?;

        let current = tx
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, Vec<u8>>(0)
            })
            .optional()?;
        let next = apply(current)?;

        tx.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, next],
        )?;
        tx.commit()
            .map_err(|e| LabError::DatabaseError(format!("Failed to commit key '{}': {}", key, e)))?;
        Ok(())
    }
}

/// A simple in-memory store used for tests and ephemeral runs.
#[derive(Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryStore {
    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn update(&self, key: &str, apply: &mut UpdateFn<'_>) -> Result<()> {
        let mut entries = self.entries.lock();
        let next = apply(entries.get(key).cloned())?;
        entries.insert(key.to_string(), next);
        Ok(())
    }
}

/// Serialize a snapshot as JSON and store it under `key`.
pub fn save_snapshot<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec(value)?;
    debug!("saving snapshot '{}' ({} bytes)", key, bytes.len());
    store.put(key, &bytes)
}

/// Load a JSON snapshot stored under `key`. Returns `None` if the key is absent.
pub fn load_snapshot<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(bytes) => {
            debug!("loaded snapshot '{}' ({} bytes)", key, bytes.len());
            Ok(Some(serde_json::from_slice(&bytes)?))
        }
        None => {
            debug!("no snapshot stored under '{}'", key);
            Ok(None)
        }
    }
}

/// Load the snapshot under `key` (or `init()` when absent), apply `mutate`
/// and store the result, all inside one [`KeyValueStore::update`].
/// Nothing is written when `mutate` fails.
pub fn update_snapshot<T, R>(
    store: &dyn KeyValueStore,
    key: &str,
    init: impl FnOnce() -> T,
    mutate: impl FnOnce(&mut T) -> Result<R>,
) -> Result<R>
where
    T: Serialize + DeserializeOwned,
{
    let mut steps = Some((init, mutate));
    let mut outcome = None;

    store.update(key, &mut |current: Option<Vec<u8>>| -> Result<Vec<u8>> {
        let (init, mutate) = steps.take().ok_or_else(|| {
            LabError::DatabaseError(format!("snapshot '{}' updated more than once", key))
        })?;
        let mut value: T = match current {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => init(),
        };
        outcome = Some(mutate(&mut value)?);
        let bytes = serde_json::to_vec(&value)?;
        debug!("updating snapshot '{}' ({} bytes)", key, bytes.len());
        Ok(bytes)
    })?;

    outcome.ok_or_else(|| LabError::DatabaseError(format!("snapshot '{}' was not updated", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exercise_store(store: &dyn KeyValueStore) {
        assert_eq!(store.get("missing").unwrap(), None);
        store.put("a", b"one").unwrap();
        assert_eq!(store.get("a").unwrap(), Some(b"one".to_vec()));
        store.put("a", b"two").unwrap();
        assert_eq!(store.get("a").unwrap(), Some(b"two".to_vec()));
        store.delete("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn test_in_memory_store() {
        exercise_store(&InMemoryStore::new());
    }

    #[test]
    fn test_sqlite_memory_store() {
        exercise_store(&Database::open(":memory:").unwrap());
    }

    #[test]
    fn test_sqlite_file_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("kv.db");
        let path = path.to_str().unwrap();

        {
            let db = Database::open(path).unwrap();
            db.put("greeting", b"hello").unwrap();
        }

        let db = Database::open(path).unwrap();
        assert_eq!(db.get("greeting").unwrap(), Some(b"hello".to_vec()));
    }

    #[test]
    fn test_snapshot_helpers() {
        let store = InMemoryStore::new();
        let missing: Option<Vec<u32>> = load_snapshot(&store, "nums").unwrap();
        assert!(missing.is_none());

        save_snapshot(&store, "nums", &vec![1u32, 2, 3]).unwrap();
        let loaded: Option<Vec<u32>> = load_snapshot(&store, "nums").unwrap();
        assert_eq!(loaded, Some(vec![1, 2, 3]));
    }

    fn exercise_update(store: &dyn KeyValueStore) {
        store
            .update("n", &mut |current| {
                assert_eq!(current, None);
                Ok(b"1".to_vec())
            })
            .unwrap();

        let failed = store.update("n", &mut |_| Err(LabError::NotAuthorized));
        assert_eq!(failed, Err(LabError::NotAuthorized));
        assert_eq!(store.get("n").unwrap(), Some(b"1".to_vec()));

        let total = update_snapshot(store, "nums", Vec::<u32>::new, |nums: &mut Vec<u32>| {
            nums.push(4);
            Ok(nums.len())
        })
        .unwrap();
        assert_eq!(total, 1);
        let loaded: Option<Vec<u32>> = load_snapshot(store, "nums").unwrap();
        assert_eq!(loaded, Some(vec![4]));
    }

    #[test]
    fn test_update_in_memory() {
        exercise_update(&InMemoryStore::new());
    }

    #[test]
    fn test_update_sqlite() {
        exercise_update(&Database::open(":memory:").unwrap());
    }

    #[test]
    fn test_concurrent_updates_across_connections() {
        use std::thread;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("kv.db");
        let path = path.to_str().unwrap().to_string();
        Database::open(&path).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let path = path.clone();
                thread::spawn(move || {
                    // A separate connection per thread, as separate processes would have.
                    let db = Database::open(&path).unwrap();
                    for _ in 0..25 {
                        update_snapshot(&db, "count", || 0u64, |count: &mut u64| {
                            *count += 1;
                            Ok(())
                        })
                        .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let db = Database::open(&path).unwrap();
        let count: Option<u64> = load_snapshot(&db, "count").unwrap();
        assert_eq!(count, Some(100));
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let store = InMemoryStore::new();
        store.put("nums", b"not json").unwrap();
        let result: Result<Option<Vec<u32>>> = load_snapshot(&store, "nums");
        assert!(matches!(result, Err(LabError::SerializationError(_))));
    }
}
