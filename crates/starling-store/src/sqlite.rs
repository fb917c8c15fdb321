//! Durable `KvStore` on a bundled SQLite file.
//!
//! Every call hops onto the blocking pool; the connection sits behind a
//! std mutex that is never held across an await.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{KvPair, KvStore, Namespace};

/// One SQLite connection shared by every clone of the handle.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database file at `path` and bring its schema
    /// up to date.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let store = Self::prepare(Connection::open(path)?)?;
        tracing::debug!(path = %path.display(), "opened sqlite store");
        Ok(store)
    }

    /// A private in-memory database. Gone when the last clone drops.
    pub fn open_memory() -> Result<Self> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(mut conn: Connection) -> Result<Self> {
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::Poisoned(e.to_string()))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

fn row_to_pair(row: &rusqlite::Row<'_>) -> rusqlite::Result<KvPair> {
    let key: Vec<u8> = row.get("key")?;
    let value: Vec<u8> = row.get("value")?;
    Ok((key, Bytes::from(value)))
}

#[async_trait]
impl KvStore for SqliteStore {
    async fn get(&self, ns: Namespace, key: &[u8]) -> Result<Option<Bytes>> {
        let key = key.to_vec();

        self.with_conn(move |conn| {
            let value: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT value FROM kv WHERE namespace = ?1 AND key = ?2",
                    params![ns.as_str(), key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value.map(Bytes::from))
        })
        .await
    }

    async fn put(&self, ns: Namespace, key: &[u8], value: &[u8]) -> Result<()> {
        let key = key.to_vec();
        let value = value.to_vec();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO kv (namespace, key, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT(namespace, key) DO UPDATE SET value = excluded.value",
                params![ns.as_str(), key, value],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, ns: Namespace, key: &[u8]) -> Result<()> {
        let key = key.to_vec();

        self.with_conn(move |conn| {
            conn.execute(
                "DELETE FROM kv WHERE namespace = ?1 AND key = ?2",
                params![ns.as_str(), key],
            )?;
            Ok(())
        })
        .await
    }

    async fn scan(&self, ns: Namespace) -> Result<Vec<KvPair>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT key, value FROM kv WHERE namespace = ?1 ORDER BY key ASC",
            )?;

            let pairs = stmt
                .query_map(params![ns.as_str()], row_to_pair)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(pairs)
        })
        .await
    }

    async fn last(&self, ns: Namespace) -> Result<Option<KvPair>> {
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT key, value FROM kv WHERE namespace = ?1 ORDER BY key DESC LIMIT 1",
                params![ns.as_str()],
                row_to_pair,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }
}
