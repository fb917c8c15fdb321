//! # Starling Store
//!
//! Key-value storage for Starling. Provides a trait-based interface with
//! SQLite and in-memory implementations, shared by the ledger and the
//! admission pool through separate namespaces.
//!
//! ## Key Types
//!
//! - [`KvStore`] - The async trait for all storage operations
//! - [`Namespace`] - Which keyspace an operation addresses
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use starling_store::{KvStore, Namespace, SqliteStore};
//!
//! async fn example() {
//!     let store = SqliteStore::open("starling.db").unwrap();
//!
//!     store.put(Namespace::Pool, b"identity", b"entry").await.unwrap();
//!     let value = store.get(Namespace::Pool, b"identity").await.unwrap();
//!     assert!(value.is_some());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Absence is not an error**: missing keys are `Ok(None)`; only I/O
//!   failures are `Err`.
//! - **Ordered scans**: keys are compared as raw bytes, ascending.
//! - **No cross-key transactions**: callers must not assume atomicity
//!   across keys.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{KvPair, KvStore, Namespace};
