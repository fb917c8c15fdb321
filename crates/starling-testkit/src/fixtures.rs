//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use starling::{Ed25519Verifier, ManualClock, Registry, RegistryConfig, Result, StarlingError};
use starling_core::{Keypair, LedgerRecord, RecordHash};
use starling_store::{KvStore, MemoryStore, Namespace};

/// Unix time every fixture clock starts at.
pub const FIXTURE_START: u64 = 1534424317;

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Filtering follows `RUST_LOG`. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A keypair, a shared memory store and a manual clock.
pub struct TestFixture {
    pub keypair: Keypair,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub config: RegistryConfig,
}

impl TestFixture {
    /// Create a new test fixture with a random keypair.
    pub fn new() -> Self {
        Self::from_keypair(Keypair::generate())
    }

    /// Create with a deterministic keypair from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self::from_keypair(Keypair::from_seed(&seed))
    }

    fn from_keypair(keypair: Keypair) -> Self {
        let mut config = RegistryConfig::default();
        config.pool.expiry_timers = false;
        Self {
            keypair,
            store: Arc::new(MemoryStore::new()),
            clock: Arc::new(ManualClock::new(FIXTURE_START)),
            config,
        }
    }

    /// Turn per-entry expiry timers on. Tests using them should run on a
    /// paused tokio clock.
    pub fn with_timers(mut self) -> Self {
        self.config.pool.expiry_timers = true;
        self
    }

    /// The fixture's identity string.
    pub fn identity(&self) -> String {
        self.keypair.identity()
    }

    /// Open a registry over the fixture's store and clock.
    ///
    /// Every registry opened from one fixture shares the same data, which
    /// is how a restart is simulated.
    pub async fn registry(&self) -> Result<Registry<Arc<MemoryStore>>> {
        init_tracing();
        Registry::open(
            self.store.clone(),
            Arc::new(Ed25519Verifier),
            self.clock.clone(),
            self.config.clone(),
        )
        .await
    }

    /// Request admission and sign the challenge so the entry is `Valid`.
    pub async fn admit<S: KvStore + 'static>(&self, registry: &Registry<S>) -> Result<()> {
        let identity = self.identity();
        let ticket = registry.request_admission(&identity).await?;
        let signature = self.keypair.sign_challenge(ticket.challenge());
        registry.validate_signature(&identity, &signature).await?;
        Ok(())
    }

    /// Append `count` plain records directly through the block store.
    pub async fn append_many<S: KvStore + 'static>(
        &self,
        registry: &Registry<S>,
        count: u64,
    ) -> Result<Vec<LedgerRecord>> {
        let mut records = Vec::new();
        for i in 1..=count {
            self.clock.advance(1);
            records.push(
                registry
                    .blocks()
                    .append(format!("good block - block #{}", i))
                    .await?,
            );
        }
        Ok(records)
    }

    /// Decode, edit and rewrite the record at `height`, bypassing the block
    /// store. The stored hash is left as the edit leaves it.
    pub async fn tamper<F>(&self, height: u64, edit: F) -> Result<()>
    where
        F: FnOnce(&mut LedgerRecord),
    {
        let key = starling_core::height_key(height);
        let bytes = self
            .store
            .get(Namespace::Ledger, &key)
            .await?
            .ok_or(StarlingError::RecordNotFound(height))?;
        let mut record = starling_core::decode_record(&bytes)?;
        edit(&mut record);
        self.store
            .put(
                Namespace::Ledger,
                &key,
                &starling_core::record_bytes(&record),
            )
            .await?;
        Ok(())
    }

    /// Overwrite a record's hash with a fixed foreign value.
    pub async fn tamper_hash(&self, height: u64) -> Result<()> {
        self.tamper(height, |r| r.hash = RecordHash::from_bytes([0xde; 32]))
            .await
    }

    /// Store undecodable bytes at `height`.
    pub async fn corrupt(&self, height: u64) -> Result<()> {
        self.store
            .put(
                Namespace::Ledger,
                &starling_core::height_key(height),
                b"\xffcorrupt",
            )
            .await?;
        Ok(())
    }

    /// Sign an arbitrary message as this fixture, hex encoded.
    pub fn sign(&self, message: &str) -> String {
        self.keypair.sign_challenge(message)
    }

    /// A well-formed signature by a key no fixture uses.
    pub fn foreign_signature(&self, message: &str) -> String {
        Keypair::from_seed(&[0xee; 32]).sign_challenge(message)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create multiple test fixtures for multi-party tests.
///
/// Each fixture has its own store; use [`TestFixture::keypair`] of the
/// others against one registry to model several identities.
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            TestFixture::with_seed(seed)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_deterministic() {
        let f1 = TestFixture::with_seed([42u8; 32]);
        let f2 = TestFixture::with_seed([42u8; 32]);
        assert_eq!(f1.identity(), f2.identity());
        assert_eq!(f1.sign("m"), f2.sign("m"));
    }

    #[test]
    fn test_multi_party_distinct() {
        let fixtures = multi_party_fixtures(3);
        assert_ne!(fixtures[0].identity(), fixtures[1].identity());
        assert_ne!(fixtures[1].identity(), fixtures[2].identity());
    }

    #[test]
    fn test_foreign_signature_differs() {
        let fixture = TestFixture::with_seed([1u8; 32]);
        let foreign = fixture.foreign_signature("m");
        assert_ne!(foreign, fixture.sign("m"));
        assert_eq!(foreign.len(), 128);
    }
}
