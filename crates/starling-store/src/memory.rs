//! In-memory implementation of the KvStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Result, StoreError};
use crate::traits::{KvPair, KvStore, Namespace};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<BTreeMap<(Namespace, Vec<u8>), Bytes>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of keys in a namespace.
    pub fn len(&self, ns: Namespace) -> Result<usize> {
        Ok(self.read()?.keys().filter(|(n, _)| *n == ns).count())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<(Namespace, Vec<u8>), Bytes>>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<(Namespace, Vec<u8>), Bytes>>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, ns: Namespace, key: &[u8]) -> Result<Option<Bytes>> {
        let inner = self.read()?;
        Ok(inner.get(&(ns, key.to_vec())).cloned())
    }

    async fn put(&self, ns: Namespace, key: &[u8], value: &[u8]) -> Result<()> {
        let mut inner = self.write()?;
        inner.insert((ns, key.to_vec()), Bytes::copy_from_slice(value));
        Ok(())
    }

    async fn delete(&self, ns: Namespace, key: &[u8]) -> Result<()> {
        let mut inner = self.write()?;
        inner.remove(&(ns, key.to_vec()));
        Ok(())
    }

    async fn scan(&self, ns: Namespace) -> Result<Vec<KvPair>> {
        let inner = self.read()?;
        Ok(inner
            .range((ns, Vec::new())..)
            .take_while(|((n, _), _)| *n == ns)
            .map(|((_, k), v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn last(&self, ns: Namespace) -> Result<Option<KvPair>> {
        let inner = self.read()?;
        Ok(inner
            .iter()
            .rev()
            .find(|((n, _), _)| *n == ns)
            .map(|((_, k), v)| (k.clone(), v.clone())))
    }
}
