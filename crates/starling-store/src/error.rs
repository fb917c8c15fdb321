//! Store errors.
//!
//! A missing key is never an error here; lookups return `Ok(None)`. Every
//! variant means the store itself could not serve the call.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Database(#[from] rusqlite::Error),

    /// A thread panicked while holding the store's lock.
    #[error("store lock poisoned: {0}")]
    Poisoned(String),

    /// The blocking task running a SQLite call was cancelled or panicked.
    #[error("store task failed: {0}")]
    Task(String),

    /// The database schema cannot be brought to the supported version.
    #[error("schema: {0}")]
    Schema(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
