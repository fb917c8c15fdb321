//! # Starling Core
//!
//! Pure primitives for Starling: hash-linked ledger records, their canonical
//! encoding, and the admission entries that gate who may append.
//!
//! This crate contains no I/O, no storage, no clocks. It is pure computation
//! over the data model.
//!
//! ## Key Types
//!
//! - [`LedgerRecord`] - One immutable, hash-linked entry of the ledger
//! - [`RecordHash`] - BLAKE3 digest of a record's canonical encoding
//! - [`AdmissionEntry`] - A pending proof-of-possession request for an identity
//! - [`SignatureStatus`] - Outcome of the latest signature check on an entry
//! - [`SignatureVerifier`] - The signature primitive consulted by the pool
//!
//! ## Canonicalization
//!
//! Records are hashed over deterministic CBOR with a fixed field order.
//! See the [`canonical`] module.

pub mod admission;
pub mod canonical;
pub mod crypto;
pub mod error;
pub mod record;

pub use admission::{
    challenge_message, AdmissionEntry, AdmissionTicket, AdmittedBody, SignatureStatus,
    DEFAULT_CHALLENGE_SUFFIX, DEFAULT_WINDOW_SECS,
};
pub use canonical::{decode_record, hashing_bytes, record_bytes};
pub use crypto::{Ed25519PublicKey, Ed25519Verifier, Keypair, RecordHash, SignatureVerifier};
pub use error::CoreError;
pub use record::{height_from_key, height_key, LedgerRecord, GENESIS_BODY};
