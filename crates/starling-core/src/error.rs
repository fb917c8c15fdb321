//! Error types for Starling Core.

use thiserror::Error;

/// Core errors raised while encoding, decoding, or verifying.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("malformed admission entry: {0}")]
    MalformedEntry(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}
