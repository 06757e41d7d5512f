//! SQLite-backed durable storage and the local alert backend.
//!
//! One database file holds both the `kv` table the session store writes
//! through and the `alerts` table the CLI alert backend arms into. The
//! connection is shared; rusqlite calls are short and run behind a mutex.

use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::data_dir;
use crate::error::{AlertError, CoreError, StorageError};
use crate::notify::AlertBackend;

/// A row from the `alerts` table: an alert armed but not yet fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAlert {
    pub id: String,
    pub title: String,
    pub body: String,
    pub fire_at_ms: u64,
}

/// SQLite key-value store at `~/.config/beermatik/beermatik.db`.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open the database in the data directory, creating file and schema
    /// if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("beermatik.db");
        Self::open_at(&path)
    }

    /// Open the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, CoreError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Alert backend sharing this store's connection.
    pub fn alerts(&self) -> SqliteAlerts {
        SqliteAlerts {
            conn: Arc::clone(&self.conn),
        }
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.lock_conn().execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS alerts (
                id         TEXT PRIMARY KEY,
                title      TEXT NOT NULL,
                body       TEXT NOT NULL,
                fire_at_ms INTEGER NOT NULL
            );",
        )?;
        Ok(())
    }

    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl crate::storage::KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        match stmt.query_row(params![key], |row| row.get::<_, String>(0)) {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock_conn().execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock_conn()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let conn = self.lock_conn();
        for key in keys {
            conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        }
        Ok(())
    }
}

/// Alert backend that records armed alerts in the `alerts` table.
///
/// Stands in for the OS delivery primitive on platforms without one: the
/// armed slot is durable and observable, permission is always granted.
pub struct SqliteAlerts {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAlerts {
    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All armed alerts, soonest first.
    pub fn pending(&self) -> Result<Vec<PendingAlert>, AlertError> {
        let conn = self.lock_conn();
        let mut stmt = conn
            .prepare("SELECT id, title, body, fire_at_ms FROM alerts ORDER BY fire_at_ms ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(PendingAlert {
                id: row.get(0)?,
                title: row.get(1)?,
                body: row.get(2)?,
                fire_at_ms: row.get::<_, i64>(3)? as u64,
            })
        })?;
        let mut alerts = Vec::new();
        for row in rows {
            alerts.push(row?);
        }
        Ok(alerts)
    }
}

#[async_trait]
impl AlertBackend for SqliteAlerts {
    async fn request_permission(&self) -> bool {
        true
    }

    async fn schedule_one_shot(
        &self,
        id: &str,
        title: &str,
        body: &str,
        fire_at_ms: u64,
    ) -> Result<(), AlertError> {
        self.lock_conn().execute(
            "INSERT OR REPLACE INTO alerts (id, title, body, fire_at_ms) VALUES (?1, ?2, ?3, ?4)",
            params![id, title, body, fire_at_ms as i64],
        )?;
        Ok(())
    }

    async fn cancel(&self, id: &str) -> Result<(), AlertError> {
        self.lock_conn()
            .execute("DELETE FROM alerts WHERE id = ?1", params![id])?;
        Ok(())
    }

    async fn cancel_all(&self) -> Result<(), AlertError> {
        self.lock_conn().execute("DELETE FROM alerts", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::KeyValueStore;

    #[tokio::test]
    async fn kv_roundtrip() {
        let store = SqliteStore::open_memory().unwrap();
        assert!(store.get("test").await.unwrap().is_none());
        store.set("test", "hello").await.unwrap();
        assert_eq!(store.get("test").await.unwrap().as_deref(), Some("hello"));
        store.set("test", "world").await.unwrap();
        assert_eq!(store.get("test").await.unwrap().as_deref(), Some("world"));
        store.remove("test").await.unwrap();
        assert!(store.get("test").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_many_is_batched() {
        let store = SqliteStore::open_memory().unwrap();
        store.set("a", "1").await.unwrap();
        store.set("b", "2").await.unwrap();
        store.remove_many(&["a", "b", "missing"]).await.unwrap();
        assert!(store.get("a").await.unwrap().is_none());
        assert!(store.get("b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn alerts_replace_by_id_and_cancel() {
        let store = SqliteStore::open_memory().unwrap();
        let alerts = store.alerts();
        assert!(alerts.request_permission().await);

        alerts.schedule_one_shot("r1", "t", "b", 500).await.unwrap();
        alerts
            .schedule_one_shot("r1", "t", "b", 900)
            .await
            .unwrap();
        let pending = alerts.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].fire_at_ms, 900);

        alerts.cancel("r1").await.unwrap();
        assert!(alerts.pending().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancel_all_empties_table() {
        let store = SqliteStore::open_memory().unwrap();
        let alerts = store.alerts();
        alerts.schedule_one_shot("a", "t", "b", 1).await.unwrap();
        alerts.schedule_one_shot("b", "t", "b", 2).await.unwrap();
        alerts.cancel_all().await.unwrap();
        assert!(alerts.pending().unwrap().is_empty());
    }
}
