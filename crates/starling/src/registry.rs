//! The Registry: the core surface handed to an outer API layer.
//!
//! One store handle is shared by the block store, the validator and the
//! admission pool. Dependencies are injected; nothing here reads globals.

use std::sync::Arc;

use bytes::Bytes;
use starling_core::{AdmissionTicket, Ed25519Verifier, LedgerRecord, RecordHash, SignatureVerifier};
use starling_store::KvStore;
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::RegistryConfig;
use crate::error::Result;
use crate::gate::{AdmissionGate, SubmitOutcome};
use crate::ledger::BlockStore;
use crate::pool::AdmissionPool;
use crate::validator::{ChainReport, ChainValidator};

/// Ledger plus admission workflow over one key-value store.
pub struct Registry<S: KvStore + 'static> {
    store: Arc<S>,
    blocks: Arc<BlockStore<S>>,
    validator: ChainValidator<S>,
    pool: Arc<AdmissionPool<S>>,
    gate: AdmissionGate<S>,
    config: RegistryConfig,
}

impl<S: KvStore + 'static> Registry<S> {
    /// Open a registry: write genesis if the ledger is empty and sweep
    /// expired admission entries.
    pub async fn open(
        store: S,
        verifier: Arc<dyn SignatureVerifier>,
        clock: Arc<dyn Clock>,
        config: RegistryConfig,
    ) -> Result<Self> {
        let store = Arc::new(store);

        let blocks = Arc::new(BlockStore::new(
            store.clone(),
            clock.clone(),
            config.ledger.clone(),
        ));
        let pool = Arc::new(AdmissionPool::new(
            store.clone(),
            clock,
            verifier,
            config.pool.clone(),
        ));

        let genesis = blocks.init_genesis(None).await?;
        let swept = pool.init().await?;
        info!(genesis = %genesis.hash, swept, "registry opened");

        Ok(Self {
            validator: ChainValidator::new(store.clone()),
            gate: AdmissionGate::new(pool.clone(), blocks.clone()),
            store,
            blocks,
            pool,
            config,
        })
    }

    /// Open with Ed25519 identities, the system clock and default config.
    pub async fn with_defaults(store: S) -> Result<Self> {
        Self::open(
            store,
            Arc::new(Ed25519Verifier),
            Arc::new(SystemClock),
            RegistryConfig::default(),
        )
        .await
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn blocks(&self) -> &BlockStore<S> {
        &self.blocks
    }

    pub fn pool(&self) -> &AdmissionPool<S> {
        &self.pool
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ledger
    // ─────────────────────────────────────────────────────────────────────────

    /// Highest height, or `None` if the ledger is empty.
    pub async fn get_height(&self) -> Result<Option<u64>> {
        self.blocks.height().await
    }

    pub async fn get_block(&self, height: u64) -> Result<Option<LedgerRecord>> {
        self.blocks.get(height).await
    }

    /// Look up a record by its hex hash. A string that is not a valid hash
    /// matches nothing.
    pub async fn get_block_by_hash(&self, hash: &str) -> Result<Option<LedgerRecord>> {
        match RecordHash::from_hex(hash) {
            Ok(hash) => self.blocks.get_by_hash(&hash).await,
            Err(_) => Ok(None),
        }
    }

    pub async fn get_blocks_by_identity(&self, identity: &str) -> Result<Vec<LedgerRecord>> {
        self.blocks.get_by_identity(identity).await
    }

    pub async fn validate_chain(&self) -> Result<ChainReport> {
        self.validator.validate_chain().await
    }

    pub async fn validate_record(&self, height: u64) -> Result<bool> {
        self.validator.validate_record(height).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Admission
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn request_admission(&self, identity: &str) -> Result<AdmissionTicket> {
        self.pool.request_admission(identity).await
    }

    pub async fn validate_signature(
        &self,
        identity: &str,
        signature: &str,
    ) -> Result<Option<AdmissionTicket>> {
        self.pool.validate_signature(identity, signature).await
    }

    pub async fn get_admission(&self, identity: &str) -> Result<Option<AdmissionTicket>> {
        self.pool.get(identity).await
    }

    pub async fn consume(&self, identity: &str) -> Result<()> {
        self.pool.consume(identity).await
    }

    /// Append `payload` on behalf of `identity` if it holds a valid entry.
    pub async fn submit(&self, identity: &str, payload: impl Into<Bytes>) -> Result<SubmitOutcome> {
        self.gate.submit(identity, payload).await
    }
}
