//! Admission gate: the only path from a validated identity to the ledger.

use std::sync::Arc;

use bytes::Bytes;
use starling_core::{AdmittedBody, LedgerRecord};
use starling_store::KvStore;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::ledger::BlockStore;
use crate::pool::AdmissionPool;

/// Result of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The entry was consumed and this record appended.
    Admitted(LedgerRecord),
    /// No live `Valid` entry. The cause is deliberately not reported.
    Rejected,
}

impl SubmitOutcome {
    pub fn is_admitted(&self) -> bool {
        matches!(self, SubmitOutcome::Admitted(_))
    }

    pub fn record(&self) -> Option<&LedgerRecord> {
        match self {
            SubmitOutcome::Admitted(record) => Some(record),
            SubmitOutcome::Rejected => None,
        }
    }
}

/// Joins the admission pool and the block store.
///
/// The entry is consumed before the append so it cannot be reused while
/// the append is in flight. If the append then fails the entry is gone and
/// the identity must go through a new request and signature cycle.
pub struct AdmissionGate<S: KvStore + 'static> {
    pool: Arc<AdmissionPool<S>>,
    blocks: Arc<BlockStore<S>>,
}

impl<S: KvStore + 'static> AdmissionGate<S> {
    pub fn new(pool: Arc<AdmissionPool<S>>, blocks: Arc<BlockStore<S>>) -> Self {
        Self { pool, blocks }
    }

    /// Append `payload` for `identity` iff it holds a live `Valid` entry.
    pub async fn submit(
        &self,
        identity: &str,
        payload: impl Into<Bytes>,
    ) -> Result<SubmitOutcome> {
        let body = AdmittedBody::new(identity, payload).to_bytes()?;

        if !self.pool.consume_if_valid(identity).await? {
            debug!(identity, "submission rejected");
            return Ok(SubmitOutcome::Rejected);
        }

        match self.blocks.append(body).await {
            Ok(record) => {
                info!(identity, height = record.height, "submission admitted");
                Ok(SubmitOutcome::Admitted(record))
            }
            Err(e) => {
                error!(identity, error = %e, "append failed after admission was consumed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::{LedgerConfig, PoolConfig};
    use starling_core::{Ed25519Verifier, Keypair};
    use starling_store::MemoryStore;

    struct Fixture {
        pool: Arc<AdmissionPool<MemoryStore>>,
        blocks: Arc<BlockStore<MemoryStore>>,
        gate: AdmissionGate<MemoryStore>,
        keypair: Keypair,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(1532296090));
        let config = PoolConfig {
            expiry_timers: false,
            ..PoolConfig::default()
        };
        let pool = Arc::new(AdmissionPool::new(
            store.clone(),
            clock.clone(),
            Arc::new(Ed25519Verifier),
            config,
        ));
        let blocks = Arc::new(BlockStore::new(store, clock, LedgerConfig::default()));
        Fixture {
            gate: AdmissionGate::new(pool.clone(), blocks.clone()),
            pool,
            blocks,
            keypair: Keypair::from_seed(&[3u8; 32]),
        }
    }

    async fn validate(f: &Fixture, signer: &Keypair) {
        let identity = f.keypair.identity();
        let ticket = f.pool.request_admission(&identity).await.unwrap();
        let sig = signer.sign_challenge(ticket.challenge());
        f.pool.validate_signature(&identity, &sig).await.unwrap();
    }

    #[tokio::test]
    async fn test_submit_valid_entry() {
        let f = fixture();
        f.blocks.init_genesis(None).await.unwrap();
        validate(&f, &f.keypair).await;

        let identity = f.keypair.identity();
        let outcome = f.gate.submit(&identity, "star data").await.unwrap();
        let record = outcome.record().unwrap();

        assert_eq!(record.height, 1);
        let body = AdmittedBody::from_bytes(&record.body).unwrap();
        assert_eq!(body.identity, identity);
        assert_eq!(&body.payload[..], b"star data");
        assert!(f.pool.get(&identity).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_submit_is_single_use() {
        let f = fixture();
        validate(&f, &f.keypair).await;
        let identity = f.keypair.identity();

        assert!(f.gate.submit(&identity, "one").await.unwrap().is_admitted());
        assert_eq!(
            f.gate.submit(&identity, "two").await.unwrap(),
            SubmitOutcome::Rejected
        );
        assert_eq!(f.blocks.height().await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_rejections_do_not_touch_ledger() {
        let f = fixture();
        let identity = f.keypair.identity();

        // Never requested.
        assert_eq!(
            f.gate.submit(&identity, "x").await.unwrap(),
            SubmitOutcome::Rejected
        );

        // Requested but unsigned.
        f.pool.request_admission(&identity).await.unwrap();
        assert_eq!(
            f.gate.submit(&identity, "x").await.unwrap(),
            SubmitOutcome::Rejected
        );

        // Signed by someone else.
        validate(&f, &Keypair::from_seed(&[4u8; 32])).await;
        assert_eq!(
            f.gate.submit(&identity, "x").await.unwrap(),
            SubmitOutcome::Rejected
        );

        assert_eq!(f.blocks.height().await.unwrap(), None);
        // A rejected submit does not consume a pending entry.
        assert!(f.pool.get(&identity).await.unwrap().is_some());
    }
}
