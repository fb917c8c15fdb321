//! Block store: append and read hash-linked ledger records.
//!
//! The block store is the only writer of the `Ledger` namespace. Records are
//! keyed by big-endian height, so an ascending scan is height order.

use std::sync::Arc;

use bytes::Bytes;
use starling_core::{
    decode_record, height_from_key, height_key, record_bytes, AdmittedBody, LedgerRecord,
    RecordHash,
};
use starling_store::{KvStore, Namespace};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::LedgerConfig;
use crate::error::{Result, StarlingError};

/// Owns append and read of ledger records.
///
/// # Single writer
///
/// `append` reads the tip height, reads the tip record, then writes the
/// successor. Two interleaved appends would both build on the same tip, so
/// every write path runs under one async mutex per block store.
pub struct BlockStore<S: KvStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
    writer: Mutex<()>,
}

impl<S: KvStore> BlockStore<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: LedgerConfig) -> Self {
        Self {
            store,
            clock,
            config,
            writer: Mutex::new(()),
        }
    }

    /// Highest assigned height, or `None` before genesis exists.
    pub async fn height(&self) -> Result<Option<u64>> {
        match self.store.last(Namespace::Ledger).await? {
            Some((key, _)) => height_from_key(&key)
                .map(Some)
                .ok_or_else(|| StarlingError::corruption(0, "ledger key is not a height")),
            None => Ok(None),
        }
    }

    /// Get the record at `height`.
    ///
    /// A present but undecodable record is `ChainCorruption`, never `None`.
    pub async fn get(&self, height: u64) -> Result<Option<LedgerRecord>> {
        match self.store.get(Namespace::Ledger, &height_key(height)).await? {
            Some(bytes) => decode_record(&bytes)
                .map(Some)
                .map_err(|e| StarlingError::corruption(height, e.to_string())),
            None => Ok(None),
        }
    }

    /// First record whose hash equals `hash`, scanning from genesis.
    ///
    /// Undecodable records are invisible to this and the other scanning
    /// lookups; [`BlockStore::get`] reports them as `ChainCorruption`.
    pub async fn get_by_hash(&self, hash: &RecordHash) -> Result<Option<LedgerRecord>> {
        Ok(self
            .records()
            .await?
            .into_iter()
            .find(|record| record.hash == *hash))
    }

    /// All records whose body satisfies `predicate`, ascending by height.
    pub async fn get_by_predicate<F>(&self, predicate: F) -> Result<Vec<LedgerRecord>>
    where
        F: Fn(&[u8]) -> bool,
    {
        Ok(self
            .records()
            .await?
            .into_iter()
            .filter(|record| predicate(&record.body[..]))
            .collect())
    }

    /// All records admitted for `identity`, ascending by height. Skips
    /// undecodable records like every scanning lookup.
    pub async fn get_by_identity(&self, identity: &str) -> Result<Vec<LedgerRecord>> {
        self.get_by_predicate(|body| {
            AdmittedBody::from_bytes(body)
                .map(|admitted| admitted.identity == identity)
                .unwrap_or(false)
        })
        .await
    }

    /// Write the genesis record if absent; otherwise return the existing one.
    pub async fn init_genesis(&self, body: Option<Bytes>) -> Result<LedgerRecord> {
        let _writer = self.writer.lock().await;
        self.ensure_genesis(body).await
    }

    /// Append a new record holding `body` on top of the current tip.
    ///
    /// On an empty ledger the configured genesis record is written first.
    pub async fn append(&self, body: impl Into<Bytes>) -> Result<LedgerRecord> {
        let body = body.into();
        let _writer = self.writer.lock().await;

        let tip = match self.height().await? {
            Some(height) => height,
            None => self.ensure_genesis(None).await?.height,
        };

        let previous = self
            .get(tip)
            .await?
            .ok_or_else(|| StarlingError::corruption(tip, "tail record is missing"))?;

        let next = tip
            .checked_add(1)
            .ok_or_else(|| StarlingError::corruption(tip, "height overflow"))?;
        let record = LedgerRecord::seal(next, Some(previous.hash), self.clock.now(), body);
        self.persist(&record).await?;

        info!(height = record.height, hash = %record.hash, "appended record");
        Ok(record)
    }

    /// Must be called with the writer lock held.
    async fn ensure_genesis(&self, body: Option<Bytes>) -> Result<LedgerRecord> {
        if let Some(existing) = self.get(0).await? {
            return Ok(existing);
        }

        if let Some(height) = self.height().await? {
            return Err(StarlingError::corruption(
                0,
                format!("genesis missing below height {}", height),
            ));
        }

        let body = body.unwrap_or_else(|| Bytes::from(self.config.genesis_body.clone()));
        let genesis = LedgerRecord::genesis(self.clock.now(), body);
        self.persist(&genesis).await?;

        info!(hash = %genesis.hash, "created genesis record");
        Ok(genesis)
    }

    async fn persist(&self, record: &LedgerRecord) -> Result<()> {
        self.store
            .put(
                Namespace::Ledger,
                &height_key(record.height),
                &record_bytes(record),
            )
            .await?;
        Ok(())
    }

    /// Every stored record that decodes, ascending by height.
    ///
    /// Undecodable records are skipped here; use the chain validator to
    /// find them.
    pub async fn records(&self) -> Result<Vec<LedgerRecord>> {
        let pairs = self.store.scan(Namespace::Ledger).await?;
        debug!(count = pairs.len(), "scanning ledger");

        Ok(pairs
            .into_iter()
            .filter_map(|(key, value)| match decode_record(&value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(height = ?height_from_key(&key), error = %e, "skipping undecodable record");
                    None
                }
            })
            .collect())
    }
}
