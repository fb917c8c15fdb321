//! # Starling
//!
//! A hash-chained, append-only ledger whose writes are gated by a
//! proof-of-possession admission workflow.
//!
//! ## Overview
//!
//! - **Block store**: appends records, each linked to its predecessor by hash
//! - **Chain validator**: audits integrity and linkage of every record
//! - **Admission pool**: expiring per-identity entries holding a challenge
//!   and the outcome of the latest signature check
//! - **Admission gate**: consumes a valid entry and appends exactly once
//!
//! ## Workflow
//!
//! 1. `request_admission(identity)` returns a challenge and its remaining window
//! 2. The identity signs the challenge off-system
//! 3. `validate_signature(identity, signature)` records `Valid` or `Invalid`
//! 4. `submit(identity, payload)` appends iff the entry is live and `Valid`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use starling::{Registry, SubmitOutcome};
//! use starling::core::Keypair;
//! use starling::store::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::open("starling.db").unwrap();
//!     let registry = Registry::with_defaults(store).await.unwrap();
//!
//!     let keypair = Keypair::generate();
//!     let identity = keypair.identity();
//!
//!     let ticket = registry.request_admission(&identity).await.unwrap();
//!     let signature = keypair.sign_challenge(ticket.challenge());
//!     registry.validate_signature(&identity, &signature).await.unwrap();
//!
//!     if let SubmitOutcome::Admitted(record) =
//!         registry.submit(&identity, b"star data".to_vec()).await.unwrap()
//!     {
//!         println!("appended at height {}", record.height);
//!     }
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `starling::core` - Records, canonical encoding, admission entries
//! - `starling::store` - Key-value store abstraction, memory and SQLite

pub mod clock;
pub mod config;
pub mod error;
pub mod gate;
pub mod ledger;
pub mod pool;
pub mod registry;
pub mod validator;

// Re-export component crates
pub use starling_core as core;
pub use starling_store as store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{LedgerConfig, PoolConfig, RegistryConfig};
pub use error::{Result, StarlingError};
pub use gate::{AdmissionGate, SubmitOutcome};
pub use ledger::BlockStore;
pub use pool::AdmissionPool;
pub use registry::Registry;
pub use validator::{ChainReport, ChainValidator};

// Re-export commonly used core types
pub use starling_core::{
    AdmissionEntry, AdmissionTicket, Ed25519Verifier, Keypair, LedgerRecord, RecordHash,
    SignatureStatus, SignatureVerifier,
};
