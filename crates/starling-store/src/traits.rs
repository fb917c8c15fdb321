//! Store trait: the abstract key-value interface.
//!
//! This trait keeps the ledger and the admission pool storage-agnostic.
//! Implementations include SQLite (primary) and in-memory (for tests).

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// A keyspace within a store. Keys in different namespaces never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    /// Ledger records, keyed by big-endian height.
    Ledger,
    /// Admission entries, keyed by identity.
    Pool,
}

impl Namespace {
    /// Stable name used as the namespace column in SQLite.
    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Ledger => "ledger",
            Namespace::Pool => "pool",
        }
    }
}

/// A key with its value, as yielded by a scan.
pub type KvPair = (Vec<u8>, Bytes);

/// The KvStore trait: async interface for namespaced key-value persistence.
///
/// All methods are async to support both blocking (SQLite) and async
/// backends. For SQLite, calls run on `spawn_blocking`.
///
/// # Design Notes
///
/// - `get` returns `Ok(None)` for an absent key. `Err` always means the
///   store itself failed.
/// - `delete` of an absent key succeeds.
/// - `scan` returns a finite snapshot ordered by key bytes, ascending.
///   Every call starts over.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Get the value stored under `key`.
    async fn get(&self, ns: Namespace, key: &[u8]) -> Result<Option<Bytes>>;

    /// Insert or overwrite the value under `key`.
    async fn put(&self, ns: Namespace, key: &[u8], value: &[u8]) -> Result<()>;

    /// Remove `key`. No-op if absent.
    async fn delete(&self, ns: Namespace, key: &[u8]) -> Result<()>;

    /// All pairs of a namespace in ascending key order.
    async fn scan(&self, ns: Namespace) -> Result<Vec<KvPair>>;

    /// The pair with the greatest key, if any.
    async fn last(&self, ns: Namespace) -> Result<Option<KvPair>>;
}

/// A shared handle is a store too, so callers can keep a reference to a
/// store they hand to an owning component.
#[async_trait]
impl<S: KvStore + ?Sized> KvStore for Arc<S> {
    async fn get(&self, ns: Namespace, key: &[u8]) -> Result<Option<Bytes>> {
        (**self).get(ns, key).await
    }

    async fn put(&self, ns: Namespace, key: &[u8], value: &[u8]) -> Result<()> {
        (**self).put(ns, key, value).await
    }

    async fn delete(&self, ns: Namespace, key: &[u8]) -> Result<()> {
        (**self).delete(ns, key).await
    }

    async fn scan(&self, ns: Namespace) -> Result<Vec<KvPair>> {
        (**self).scan(ns).await
    }

    async fn last(&self, ns: Namespace) -> Result<Option<KvPair>> {
        (**self).last(ns).await
    }
}
