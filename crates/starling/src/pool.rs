//! Admission pool: expiring, signature-gated entries keyed by identity.
//!
//! An entry moves `Unset -> Valid | Invalid` through signature checks and is
//! deleted when its window elapses or when it is consumed. `Invalid` is not
//! sticky: a later check on a live entry reflects only the latest attempt.
//!
//! # Expiry
//!
//! Three mechanisms, each sufficient for correctness on its own:
//!
//! - **Check-on-read**: an expired entry is never returned and is deleted
//!   by the mutating operation that finds it.
//! - **Expiry timer**: each entry arms one task that deletes it at
//!   `request_time + window`. The task carries the entry's `request_time` as
//!   a generation and only deletes a stored entry of the same generation, so
//!   a stale timer can never remove a newer entry for the same identity.
//! - **Sweep**: [`AdmissionPool::init`] removes entries that outlived a
//!   restart, when in-memory timers are gone.
//!
//! # Locking
//!
//! Every read-modify-write runs under a per-identity async mutex (striped).
//! The timer map is a plain `std::sync::Mutex` that is never held across an
//! `.await`.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex as StdMutex, Weak};
use std::time::Duration;

use starling_core::{AdmissionEntry, AdmissionTicket, SignatureStatus, SignatureVerifier};
use starling_store::{KvStore, Namespace};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::PoolConfig;
use crate::error::Result;

const LOCK_STRIPES: usize = 64;

struct ExpiryTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

/// The admission pool.
///
/// Dropping the pool aborts all pending expiry timers; persisted entries
/// are reconciled by the next [`AdmissionPool::init`].
pub struct AdmissionPool<S: KvStore + 'static> {
    inner: Arc<PoolInner<S>>,
}

struct PoolInner<S: KvStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    verifier: Arc<dyn SignatureVerifier>,
    config: PoolConfig,
    stripes: Vec<Mutex<()>>,
    timers: StdMutex<HashMap<String, ExpiryTimer>>,
}

impl<S: KvStore + 'static> AdmissionPool<S> {
    pub fn new(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        verifier: Arc<dyn SignatureVerifier>,
        config: PoolConfig,
    ) -> Self {
        let stripes = (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect();
        Self {
            inner: Arc::new(PoolInner {
                store,
                clock,
                verifier,
                config,
                stripes,
                timers: StdMutex::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// Startup sweep: delete every persisted entry whose window has elapsed
    /// (or that no longer decodes) and re-arm timers for the rest.
    ///
    /// Returns the number of entries removed. Safe to call at any time.
    pub async fn init(&self) -> Result<usize> {
        let pairs = self.inner.store.scan(Namespace::Pool).await?;
        let now = self.inner.clock.now();
        let mut removed = 0;

        for (key, _) in pairs {
            let identity = match String::from_utf8(key) {
                Ok(identity) => identity,
                Err(e) => {
                    warn!("removing pool entry with non-UTF-8 key");
                    self.inner.store.delete(Namespace::Pool, e.as_bytes()).await?;
                    removed += 1;
                    continue;
                }
            };

            let _guard = self.inner.stripe(&identity).lock().await;
            match self.inner.load(&identity).await? {
                Loaded::Absent => {}
                Loaded::Corrupt => {
                    self.inner.remove(&identity).await?;
                    removed += 1;
                }
                Loaded::Entry(entry) if !entry.is_live(now) => {
                    self.inner.remove(&identity).await?;
                    removed += 1;
                }
                Loaded::Entry(entry) => self.inner.arm_timer(&entry, now),
            }
        }

        info!(removed, "admission pool sweep complete");
        Ok(removed)
    }

    /// Open an admission request for `identity`, or return the live one.
    ///
    /// An existing live entry is returned unchanged with a recomputed
    /// remaining window; its deadline does not move.
    pub async fn request_admission(&self, identity: &str) -> Result<AdmissionTicket> {
        let _guard = self.inner.stripe(identity).lock().await;
        let now = self.inner.clock.now();

        if let Some(entry) = self.inner.load_live(identity, now).await? {
            debug!(identity, remaining = entry.remaining(now), "admission request already open");
            return Ok(entry.ticket(now));
        }

        let entry = AdmissionEntry::new(
            identity,
            now,
            self.inner.config.window_secs,
            &self.inner.config.challenge_suffix,
        );
        self.inner.save(&entry).await?;
        self.inner.arm_timer(&entry, now);

        info!(identity, request_time = now, "admission request opened");
        Ok(entry.ticket(now))
    }

    /// Check `signature` against the live entry's challenge.
    ///
    /// Returns `None` if no live entry exists. Verifier errors and
    /// mismatches both record `Invalid`; neither is an error to the caller.
    pub async fn validate_signature(
        &self,
        identity: &str,
        signature: &str,
    ) -> Result<Option<AdmissionTicket>> {
        let _guard = self.inner.stripe(identity).lock().await;
        let now = self.inner.clock.now();

        let mut entry = match self.inner.load_live(identity, now).await? {
            Some(entry) => entry,
            None => return Ok(None),
        };

        entry.signature_status =
            match self
                .inner
                .verifier
                .verify(&entry.challenge, identity, signature)
            {
                Ok(true) => SignatureStatus::Valid,
                Ok(false) => {
                    debug!(identity, "signature does not match challenge");
                    SignatureStatus::Invalid
                }
                Err(e) => {
                    warn!(identity, error = %e, "signature verification failed");
                    SignatureStatus::Invalid
                }
            };

        self.inner.save(&entry).await?;
        debug!(identity, status = ?entry.signature_status, "signature checked");
        Ok(Some(entry.ticket(now)))
    }

    /// Read-only lookup of the live entry for `identity`.
    pub async fn get(&self, identity: &str) -> Result<Option<AdmissionTicket>> {
        let now = self.inner.clock.now();
        Ok(match self.inner.load(identity).await? {
            Loaded::Entry(entry) if entry.is_live(now) => Some(entry.ticket(now)),
            _ => None,
        })
    }

    /// Delete the entry for `identity` and cancel its timer. No-op if absent.
    pub async fn consume(&self, identity: &str) -> Result<()> {
        let _guard = self.inner.stripe(identity).lock().await;
        self.inner.remove(identity).await
    }

    /// Atomically consume the entry iff it is live and `Valid`.
    ///
    /// Two concurrent callers for the same identity cannot both get `true`.
    pub async fn consume_if_valid(&self, identity: &str) -> Result<bool> {
        let _guard = self.inner.stripe(identity).lock().await;
        let now = self.inner.clock.now();

        match self.inner.load_live(identity, now).await? {
            Some(entry) if entry.signature_status.is_valid() => {
                self.inner.remove(identity).await?;
                debug!(identity, "admission consumed");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Number of armed expiry timers.
    pub fn pending_timers(&self) -> usize {
        self.inner.timers_guard().len()
    }
}

impl<S: KvStore + 'static> Drop for AdmissionPool<S> {
    fn drop(&mut self) {
        for (_, timer) in self.inner.timers_guard().drain() {
            timer.handle.abort();
        }
    }
}

enum Loaded {
    Absent,
    Corrupt,
    Entry(AdmissionEntry),
}

impl<S: KvStore + 'static> PoolInner<S> {
    fn stripe(&self, identity: &str) -> &Mutex<()> {
        let mut hasher = DefaultHasher::new();
        identity.hash(&mut hasher);
        &self.stripes[(hasher.finish() as usize) % self.stripes.len()]
    }

    fn timers_guard(&self) -> std::sync::MutexGuard<'_, HashMap<String, ExpiryTimer>> {
        self.timers.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn load(&self, identity: &str) -> Result<Loaded> {
        let bytes = match self.store.get(Namespace::Pool, identity.as_bytes()).await? {
            Some(bytes) => bytes,
            None => return Ok(Loaded::Absent),
        };
        Ok(match AdmissionEntry::from_bytes(&bytes) {
            Ok(entry) => Loaded::Entry(entry),
            Err(e) => {
                warn!(identity, error = %e, "undecodable admission entry");
                Loaded::Corrupt
            }
        })
    }

    /// Must be called with the identity's stripe held. Deletes expired and
    /// undecodable entries it finds.
    async fn load_live(&self, identity: &str, now: u64) -> Result<Option<AdmissionEntry>> {
        match self.load(identity).await? {
            Loaded::Absent => Ok(None),
            Loaded::Entry(entry) if entry.is_live(now) => Ok(Some(entry)),
            Loaded::Entry(entry) => {
                debug!(identity, deadline = entry.deadline(), "admission entry expired");
                self.remove(identity).await?;
                Ok(None)
            }
            Loaded::Corrupt => {
                self.remove(identity).await?;
                Ok(None)
            }
        }
    }

    async fn save(&self, entry: &AdmissionEntry) -> Result<()> {
        self.store
            .put(Namespace::Pool, entry.identity.as_bytes(), &entry.to_bytes()?)
            .await?;
        Ok(())
    }

    async fn remove(&self, identity: &str) -> Result<()> {
        self.store.delete(Namespace::Pool, identity.as_bytes()).await?;
        self.cancel_timer(identity);
        Ok(())
    }

    fn cancel_timer(&self, identity: &str) {
        if let Some(timer) = self.timers_guard().remove(identity) {
            timer.handle.abort();
        }
    }

    /// Replace any timer for this identity with one firing at the entry's
    /// deadline. Must be called with the identity's stripe held.
    fn arm_timer(self: &Arc<Self>, entry: &AdmissionEntry, now: u64) {
        if !self.config.expiry_timers {
            return;
        }

        let delay = Duration::from_secs(entry.remaining(now).max(0) as u64);
        let identity = entry.identity.clone();
        let generation = entry.request_time;
        let pool: Weak<Self> = Arc::downgrade(self);

        let handle = tokio::spawn({
            let identity = identity.clone();
            async move {
                tokio::time::sleep(delay).await;
                if let Some(pool) = pool.upgrade() {
                    if let Err(e) = pool.expire(&identity, generation).await {
                        warn!(identity = %identity, error = %e, "expiry timer failed");
                    }
                }
            }
        });

        let previous = self
            .timers_guard()
            .insert(identity, ExpiryTimer { generation, handle });
        if let Some(previous) = previous {
            previous.handle.abort();
        }
    }

    /// Timer body: delete the entry only if it is still the generation that
    /// armed this timer.
    async fn expire(&self, identity: &str, generation: u64) -> Result<()> {
        let _guard = self.stripe(identity).lock().await;

        {
            let mut timers = self.timers_guard();
            if timers.get(identity).map(|t| t.generation) == Some(generation) {
                timers.remove(identity);
            }
        }

        match self.load(identity).await? {
            Loaded::Entry(entry) if entry.request_time == generation => {
                self.store.delete(Namespace::Pool, identity.as_bytes()).await?;
                debug!(identity, generation, "admission entry expired by timer");
            }
            _ => debug!(identity, generation, "stale expiry timer ignored"),
        }
        Ok(())
    }
}
