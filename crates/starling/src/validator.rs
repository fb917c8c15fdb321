//! Chain validator: read-only integrity audit over the ledger.
//!
//! Two checks per height:
//! - integrity: the stored hash equals the recomputed hash
//! - linkage: the record's `previous_hash` equals the hash one height below
//!
//! This is a full O(n) pass. It is an explicit audit, not part of the
//! append path.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use starling_core::{decode_record, height_from_key, height_key, LedgerRecord};
use starling_store::{KvStore, Namespace};
use tracing::{info, warn};

use crate::error::{Result, StarlingError};

/// Outcome of a full chain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReport {
    /// True iff no height failed.
    pub valid: bool,
    /// Every failing height, ascending, without duplicates. A very long run
    /// of missing heights contributes only its first height and the height
    /// after it.
    pub failing_heights: Vec<u64>,
}

impl ChainReport {
    fn from_failures(failures: BTreeSet<u64>) -> Self {
        Self {
            valid: failures.is_empty(),
            failing_heights: failures.into_iter().collect(),
        }
    }
}

/// Audits the records written by a [`crate::BlockStore`] sharing the store.
pub struct ChainValidator<S: KvStore> {
    store: Arc<S>,
}

impl<S: KvStore> ChainValidator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Check the integrity of the record at `height`.
    ///
    /// Returns `Ok(false)` for a present record that is tampered or
    /// undecodable, and `RecordNotFound` if nothing is stored there.
    pub async fn validate_record(&self, height: u64) -> Result<bool> {
        let bytes = self
            .store
            .get(Namespace::Ledger, &height_key(height))
            .await?
            .ok_or(StarlingError::RecordNotFound(height))?;

        let intact = match decode_record(&bytes) {
            Ok(record) => record_is_intact(height, &record),
            Err(_) => false,
        };

        if !intact {
            warn!(height, "record failed integrity check");
        }
        Ok(intact)
    }

    /// Validate every height from genesis to the tip.
    pub async fn validate_chain(&self) -> Result<ChainReport> {
        let pairs = self.store.scan(Namespace::Ledger).await?;

        let mut records: BTreeMap<u64, Option<LedgerRecord>> = BTreeMap::new();
        for (key, value) in pairs {
            let height = height_from_key(&key)
                .ok_or_else(|| StarlingError::corruption(0, "ledger key is not a height"))?;
            records.insert(height, decode_record(&value).ok());
        }

        let tip = match records.keys().next_back() {
            Some(&tip) => tip,
            None => return Ok(ChainReport::from_failures(BTreeSet::new())),
        };

        let mut failures = BTreeSet::new();
        let mut previous: Option<&LedgerRecord> = None;
        let mut expected = Some(0u64);

        // Walk stored heights only; a stray key far above the chain must not
        // cost one step per missing height.
        for (&height, current) in &records {
            if let Some(first_missing) = expected.filter(|&next| next < height) {
                record_gap(&mut failures, first_missing, height);
                previous = None;
            }

            let current = current.as_ref();
            match current {
                Some(record) => {
                    if !record_is_intact(height, record) {
                        failures.insert(height);
                    }
                    if !links_to(height, record, previous) {
                        failures.insert(height);
                    }
                }
                None => {
                    // Undecodable: this height fails, and the next one
                    // cannot prove its link.
                    failures.insert(height);
                    if height < tip {
                        failures.insert(height + 1);
                    }
                }
            }

            previous = current;
            expected = height.checked_add(1);
        }

        let report = ChainReport::from_failures(failures);
        if report.valid {
            info!(tip, "chain is valid");
        } else {
            warn!(
                tip,
                errors = report.failing_heights.len(),
                heights = ?report.failing_heights,
                "chain is not valid"
            );
        }
        Ok(report)
    }
}

/// Gaps longer than this are reported by their endpoints only.
const MAX_LISTED_GAP: u64 = 4096;

/// Heights `first_missing..resumes_at` are absent. Each fails, and so does
/// `resumes_at`, whose link cannot be proven.
fn record_gap(failures: &mut BTreeSet<u64>, first_missing: u64, resumes_at: u64) {
    if resumes_at - first_missing <= MAX_LISTED_GAP {
        failures.extend(first_missing..=resumes_at);
    } else {
        warn!(
            from = first_missing,
            to = resumes_at - 1,
            "ledger gap too long to list; reporting its ends"
        );
        failures.insert(first_missing);
        failures.insert(resumes_at);
    }
}

fn record_is_intact(height: u64, record: &LedgerRecord) -> bool {
    record.height == height && record.is_intact()
}

/// Linkage check for `record` at `height`.
///
/// When the record below could not be read, the failure is already
/// attributed to this height by the caller, so it is not double-checked.
fn links_to(height: u64, record: &LedgerRecord, previous: Option<&LedgerRecord>) -> bool {
    if height == 0 {
        return record.previous_hash.is_none();
    }
    match previous {
        Some(prev) => record.previous_hash == Some(prev.hash),
        None => true,
    }
}
