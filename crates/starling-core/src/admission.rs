//! Admission entries: the proof-of-possession gate in front of the ledger.
//!
//! An identity asks for a challenge, signs it off-system, and presents the
//! signature. Only an entry whose latest signature check passed may admit a
//! record, and only once.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Default validity window of an entry, in seconds.
pub const DEFAULT_WINDOW_SECS: u64 = 300;

/// Default fixed suffix of the challenge message.
pub const DEFAULT_CHALLENGE_SUFFIX: &str = "starRegistry";

/// Outcome of the latest signature check on an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureStatus {
    /// No signature has been presented yet.
    Unset,
    /// The latest signature verified against the challenge.
    Valid,
    /// The latest signature failed verification or was malformed.
    Invalid,
}

impl SignatureStatus {
    pub fn is_valid(self) -> bool {
        matches!(self, SignatureStatus::Valid)
    }
}

/// Build the challenge an identity must sign: `<identity>:<time>:<suffix>`.
pub fn challenge_message(identity: &str, request_time: u64, suffix: &str) -> String {
    format!("{}:{}:{}", identity, request_time, suffix)
}

/// A pending admission request, as persisted in the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionEntry {
    /// Opaque identity key; unique per entry.
    pub identity: String,

    /// Seconds since the Unix epoch when the entry was created.
    pub request_time: u64,

    /// The message the identity must sign.
    pub challenge: String,

    /// Total validity period in seconds, counted from `request_time`.
    pub window_secs: u64,

    pub signature_status: SignatureStatus,
}

impl AdmissionEntry {
    /// Create a fresh entry with an unset signature status.
    pub fn new(identity: &str, request_time: u64, window_secs: u64, suffix: &str) -> Self {
        Self {
            identity: identity.to_string(),
            request_time,
            challenge: challenge_message(identity, request_time, suffix),
            window_secs,
            signature_status: SignatureStatus::Unset,
        }
    }

    /// Absolute expiry time. Refreshing an entry never moves this.
    pub fn deadline(&self) -> u64 {
        self.request_time.saturating_add(self.window_secs)
    }

    /// Seconds left at `now`; zero or negative once expired.
    ///
    /// Saturates at the `i64` range, so an oversized window stays live.
    pub fn remaining(&self, now: u64) -> i64 {
        let remaining = i128::from(self.deadline()) - i128::from(now);
        remaining.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }

    /// An entry is live while its remaining window is positive.
    pub fn is_live(&self, now: u64) -> bool {
        self.remaining(now) > 0
    }

    /// View of this entry as observed at `now`.
    pub fn ticket(&self, now: u64) -> AdmissionTicket {
        AdmissionTicket {
            entry: self.clone(),
            remaining_secs: self.remaining(now).max(0) as u64,
        }
    }

    /// Encode for storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| CoreError::EncodingError(e.to_string()))?;
        Ok(buf)
    }

    /// Decode from storage.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        ciborium::from_reader(bytes).map_err(|e| CoreError::MalformedEntry(e.to_string()))
    }
}

/// An entry together with the remaining window at observation time.
///
/// This is what callers see: the client needs the challenge and how long
/// it has left to sign it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionTicket {
    pub entry: AdmissionEntry,
    pub remaining_secs: u64,
}

impl AdmissionTicket {
    pub fn identity(&self) -> &str {
        &self.entry.identity
    }

    pub fn challenge(&self) -> &str {
        &self.entry.challenge
    }

    pub fn status(&self) -> SignatureStatus {
        self.entry.signature_status
    }
}

/// Record body written by the admission gate.
///
/// Wraps the caller's opaque payload together with the identity that was
/// admitted, so identity-scoped lookups can match on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmittedBody {
    pub identity: String,
    pub payload: Bytes,
}

impl AdmittedBody {
    pub fn new(identity: &str, payload: impl Into<Bytes>) -> Self {
        Self {
            identity: identity.to_string(),
            payload: payload.into(),
        }
    }

    /// Encode into a record body.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| CoreError::EncodingError(e.to_string()))?;
        Ok(buf)
    }

    /// Decode from a record body. Bodies not written by the gate fail here.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
    }
}
