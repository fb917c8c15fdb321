//! # Starling Testkit
//!
//! Testing utilities for Starling.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known records with their expected canonical bytes
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: A registry over a memory store with a manual clock
//!
//! ## Golden Vectors
//!
//! ```rust
//! use starling_testkit::vectors::{all_vectors, record_from_vector};
//!
//! for vector in all_vectors() {
//!     let record = record_from_vector(&vector);
//!     println!("{}: {}", vector.name, record.hash.to_hex());
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use starling_testkit::generators::{record_from_params, RecordParams};
//!
//! proptest! {
//!     #[test]
//!     fn sealed_records_are_intact(params: RecordParams) {
//!         prop_assert!(record_from_params(&params).is_intact());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,ignore
//! use starling_testkit::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let registry = fixture.registry().await?;
//! fixture.admit(&registry).await?;
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{init_tracing, multi_party_fixtures, TestFixture, FIXTURE_START};
pub use generators::{record_from_params, RecordParams};
pub use vectors::{
    all_vectors, record_from_vector, vectors_json, verify_all_vectors, GoldenVector, VectorReport,
};
