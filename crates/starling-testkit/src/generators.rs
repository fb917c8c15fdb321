//! Proptest generators for property-based testing.

use proptest::prelude::*;

use starling_core::{AdmissionEntry, AdmittedBody, Keypair, LedgerRecord, RecordHash};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a random RecordHash.
pub fn record_hash() -> impl Strategy<Value = RecordHash> {
    any::<[u8; 32]>().prop_map(RecordHash::from_bytes)
}

/// Generate a plausible timestamp in seconds (2000 to 2100).
pub fn timestamp() -> impl Strategy<Value = u64> {
    946_684_800u64..=4_102_444_800u64
}

/// Generate body bytes of specified max length.
pub fn body(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a non-empty identity string.
pub fn identity() -> impl Strategy<Value = String> {
    "[A-Za-z0-9]{1,40}".prop_map(String::from)
}

/// Generate an admitted body wrapping a random payload.
pub fn admitted_body() -> impl Strategy<Value = AdmittedBody> {
    (identity(), body(256)).prop_map(|(id, payload)| AdmittedBody::new(&id, payload))
}

/// Generate an admission entry with a window of up to one hour.
pub fn admission_entry() -> impl Strategy<Value = AdmissionEntry> {
    (identity(), timestamp(), 1u64..=3600).prop_map(|(id, ts, window)| {
        AdmissionEntry::new(&id, ts, window, starling_core::DEFAULT_CHALLENGE_SUFFIX)
    })
}

/// Parameters for generating a record.
#[derive(Debug, Clone)]
pub struct RecordParams {
    pub height: u64,
    pub previous_hash: Option<RecordHash>,
    pub timestamp: u64,
    pub body: Vec<u8>,
}

impl Arbitrary for RecordParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (0u64..=1_000_000u64, any::<[u8; 32]>(), timestamp(), body(1000))
            .prop_map(|(height, prev, timestamp, body)| RecordParams {
                height,
                // Genesis has no predecessor; every other height does.
                previous_hash: (height > 0).then(|| RecordHash::from_bytes(prev)),
                timestamp,
                body,
            })
            .boxed()
    }
}

/// Seal a record from parameters.
pub fn record_from_params(params: &RecordParams) -> LedgerRecord {
    LedgerRecord::seal(
        params.height,
        params.previous_hash,
        params.timestamp,
        params.body.clone(),
    )
}
