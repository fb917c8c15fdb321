//! Error types for Starling.

use starling_core::CoreError;
use starling_store::StoreError;
use thiserror::Error;

/// Errors that can occur during ledger and admission operations.
///
/// Expected absence (no record at a height, no live entry for an identity)
/// is reported as `Ok(None)` by lookups, not as an error.
#[derive(Debug, Error)]
pub enum StarlingError {
    /// The underlying key-value store failed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// The ledger's tail (or a record on a required path) is unreadable.
    #[error("chain corruption at height {height}: {reason}")]
    ChainCorruption { height: u64, reason: String },

    /// No record exists at the requested height.
    #[error("no record at height {0}")]
    RecordNotFound(u64),

    /// Encoding a record body or admission entry failed.
    #[error("encoding error: {0}")]
    Encoding(#[from] CoreError),
}

impl StarlingError {
    pub(crate) fn corruption(height: u64, reason: impl Into<String>) -> Self {
        StarlingError::ChainCorruption {
            height,
            reason: reason.into(),
        }
    }
}

/// Result type for Starling operations.
pub type Result<T> = std::result::Result<T, StarlingError>;
