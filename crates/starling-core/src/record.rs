//! Ledger record: one immutable, hash-linked entry of the chain.
//!
//! A record is created exactly once by an append (or the genesis bootstrap)
//! and never changes afterwards. Its `hash` covers every other field, and its
//! `previous_hash` points at the record one height below.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::canonical::hashing_bytes;
use crate::crypto::RecordHash;

/// Body of the genesis record when none is supplied.
pub const GENESIS_BODY: &str = "First block in the chain - Genesis block";

/// A single record of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Position in the chain; 0 is genesis.
    pub height: u64,

    /// Hash of the record at `height - 1`. `None` only for genesis.
    pub previous_hash: Option<RecordHash>,

    /// Digest of the canonical encoding with this field cleared.
    pub hash: RecordHash,

    /// Seconds since the Unix epoch at append time.
    pub timestamp: u64,

    /// Caller-supplied content. Opaque to the ledger.
    pub body: Bytes,
}

impl LedgerRecord {
    /// Build a record and compute its hash.
    pub fn seal(
        height: u64,
        previous_hash: Option<RecordHash>,
        timestamp: u64,
        body: impl Into<Bytes>,
    ) -> Self {
        let mut record = Self {
            height,
            previous_hash,
            hash: RecordHash::ZERO,
            timestamp,
            body: body.into(),
        };
        record.hash = record.compute_hash();
        record
    }

    /// Build the genesis record.
    pub fn genesis(timestamp: u64, body: impl Into<Bytes>) -> Self {
        Self::seal(0, None, timestamp, body)
    }

    /// Recompute the digest from the current field values.
    pub fn compute_hash(&self) -> RecordHash {
        RecordHash::digest(&hashing_bytes(self))
    }

    /// True if the stored hash matches the recomputed one.
    pub fn is_intact(&self) -> bool {
        self.compute_hash() == self.hash
    }

    /// True if `self` is the direct successor of `prev`.
    pub fn links_to(&self, prev: &LedgerRecord) -> bool {
        self.height == prev.height + 1 && self.previous_hash == Some(prev.hash)
    }

    /// Check if this is the genesis record.
    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }

    /// Hex form of `previous_hash`; empty string for genesis.
    pub fn previous_hash_hex(&self) -> String {
        self.previous_hash
            .map(|h| h.to_hex())
            .unwrap_or_default()
    }
}

/// Store key for a height: 8 bytes big-endian, so key order is height order.
pub fn height_key(height: u64) -> [u8; 8] {
    height.to_be_bytes()
}

/// Parse a height back out of a store key.
pub fn height_from_key(key: &[u8]) -> Option<u64> {
    let arr: [u8; 8] = key.try_into().ok()?;
    Some(u64::from_be_bytes(arr))
}
