//! Shared setup for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use starling::core::{Ed25519Verifier, Keypair};
use starling::store::{KvPair, KvStore, MemoryStore, Namespace, StoreError};
use starling::{ManualClock, Registry, RegistryConfig};

/// Unix time the test clocks start at.
pub const START: u64 = 1534424317;

/// Install a test-writer subscriber once per process. Honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn config_without_timers() -> RegistryConfig {
    let mut config = RegistryConfig::default();
    config.pool.expiry_timers = false;
    config
}

pub async fn open_registry<S: KvStore + 'static>(
    store: S,
    clock: Arc<ManualClock>,
) -> anyhow::Result<Registry<S>> {
    init_tracing();
    let registry = Registry::open(
        store,
        Arc::new(Ed25519Verifier),
        clock,
        config_without_timers(),
    )
    .await?;
    Ok(registry)
}

pub async fn memory_registry() -> anyhow::Result<(Registry<MemoryStore>, Arc<ManualClock>)> {
    let clock = Arc::new(ManualClock::new(START));
    let registry = open_registry(MemoryStore::new(), clock.clone()).await?;
    Ok((registry, clock))
}

/// Deterministic keypair for party `n`.
pub fn party(n: u8) -> Keypair {
    Keypair::from_seed(&[n; 32])
}

/// Run a full request + sign cycle so `keypair` holds a `Valid` entry.
pub async fn admit<S: KvStore + 'static>(
    registry: &Registry<S>,
    keypair: &Keypair,
) -> anyhow::Result<()> {
    let identity = keypair.identity();
    let ticket = registry.request_admission(&identity).await?;
    let signature = keypair.sign_challenge(ticket.challenge());
    registry
        .validate_signature(&identity, &signature)
        .await?
        .ok_or_else(|| anyhow::anyhow!("entry vanished before validation"))?;
    Ok(())
}

/// A memory store whose writes can be made to fail per namespace.
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    broken: std::sync::Mutex<std::collections::HashSet<Namespace>>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every `put` into `ns` until [`FailingStore::repair`].
    pub fn break_writes(&self, ns: Namespace) {
        self.broken.lock().unwrap().insert(ns);
    }

    pub fn repair(&self, ns: Namespace) {
        self.broken.lock().unwrap().remove(&ns);
    }

    fn check(&self, ns: Namespace) -> starling::store::Result<()> {
        if self.broken.lock().unwrap().contains(&ns) {
            return Err(StoreError::Task(format!("{:?} writes unavailable", ns)));
        }
        Ok(())
    }
}

#[async_trait]
impl KvStore for FailingStore {
    async fn get(&self, ns: Namespace, key: &[u8]) -> starling::store::Result<Option<Bytes>> {
        self.inner.get(ns, key).await
    }

    async fn put(&self, ns: Namespace, key: &[u8], value: &[u8]) -> starling::store::Result<()> {
        self.check(ns)?;
        self.inner.put(ns, key, value).await
    }

    async fn delete(&self, ns: Namespace, key: &[u8]) -> starling::store::Result<()> {
        self.inner.delete(ns, key).await
    }

    async fn scan(&self, ns: Namespace) -> starling::store::Result<Vec<KvPair>> {
        self.inner.scan(ns).await
    }

    async fn last(&self, ns: Namespace) -> starling::store::Result<Option<KvPair>> {
        self.inner.last(ns).await
    }
}
