//! Canonical CBOR encoding for deterministic record hashing.
//!
//! Records are encoded as a CBOR map (RFC 8949 Core Deterministic Encoding):
//! - Integer keys 0-4 in a fixed order, sorted by encoded bytes
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats (timestamps are u64 seconds)
//!
//! The hash of a record is BLAKE3 over this encoding with the hash field
//! set to an empty byte string. The field order is frozen: changing it
//! changes every hash.

use bytes::Bytes;
use ciborium::value::Value;

use crate::crypto::RecordHash;
use crate::error::CoreError;
use crate::record::LedgerRecord;

/// Record field keys (integer keys for compact encoding).
///
/// Keys 0-23 encode as single bytes in CBOR.
mod keys {
    pub const HEIGHT: u64 = 0;
    pub const PREVIOUS_HASH: u64 = 1;
    pub const HASH: u64 = 2;
    pub const TIMESTAMP: u64 = 3;
    pub const BODY: u64 = 4;
}

/// Encode a record with its hash field cleared. This is the hash input.
pub fn hashing_bytes(record: &LedgerRecord) -> Vec<u8> {
    encode_record(record, false)
}

/// Encode a record with its hash field filled. This is the stored form.
pub fn record_bytes(record: &LedgerRecord) -> Vec<u8> {
    encode_record(record, true)
}

const MAJOR_UINT: u8 = 0;
const MAJOR_BYTES: u8 = 2;
const MAJOR_MAP: u8 = 5;

/// Write the five-entry record map.
///
/// Keys are emitted in ascending order, which for single-byte integer keys
/// is also the order of their encoded bytes.
fn encode_record(record: &LedgerRecord, with_hash: bool) -> Vec<u8> {
    let previous: &[u8] = match &record.previous_hash {
        Some(h) => h.as_bytes(),
        None => &[],
    };
    let hash: &[u8] = if with_hash { record.hash.as_bytes() } else { &[] };

    let mut buf = Vec::with_capacity(record.body.len() + previous.len() + hash.len() + 24);
    write_head(&mut buf, MAJOR_MAP, 5);

    write_head(&mut buf, MAJOR_UINT, keys::HEIGHT);
    write_head(&mut buf, MAJOR_UINT, record.height);

    write_head(&mut buf, MAJOR_UINT, keys::PREVIOUS_HASH);
    write_bytes(&mut buf, previous);

    write_head(&mut buf, MAJOR_UINT, keys::HASH);
    write_bytes(&mut buf, hash);

    write_head(&mut buf, MAJOR_UINT, keys::TIMESTAMP);
    write_head(&mut buf, MAJOR_UINT, record.timestamp);

    write_head(&mut buf, MAJOR_UINT, keys::BODY);
    write_bytes(&mut buf, &record.body);

    buf
}

/// Write a CBOR head: major type plus argument in its shortest form.
fn write_head(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    match n {
        0..=23 => buf.push(mt | n as u8),
        24..=0xff => buf.extend_from_slice(&[mt | 24, n as u8]),
        0x100..=0xffff => {
            buf.push(mt | 25);
            buf.extend_from_slice(&(n as u16).to_be_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            buf.push(mt | 26);
            buf.extend_from_slice(&(n as u32).to_be_bytes());
        }
        _ => {
            buf.push(mt | 27);
            buf.extend_from_slice(&n.to_be_bytes());
        }
    }
}

fn write_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    write_head(buf, MAJOR_BYTES, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Decode a record from its stored bytes.
///
/// Decoding does not check integrity; a tampered record decodes fine and
/// fails [`LedgerRecord::is_intact`] instead.
pub fn decode_record(bytes: &[u8]) -> Result<LedgerRecord, CoreError> {
    let value: Value =
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))?;

    let map = match &value {
        Value::Map(m) => m,
        _ => return Err(CoreError::MalformedRecord("expected map".into())),
    };

    let get = |key: u64| -> Option<&Value> {
        map.iter()
            .find(|(k, _)| matches!(k, Value::Integer(i) if u64::try_from(*i).ok() == Some(key)))
            .map(|(_, v)| v)
    };

    let uint = |key: u64, name: &str| -> Result<u64, CoreError> {
        match get(key) {
            Some(Value::Integer(i)) => u64::try_from(*i)
                .map_err(|_| CoreError::MalformedRecord(format!("{} out of range", name))),
            _ => Err(CoreError::MalformedRecord(format!("missing {}", name))),
        }
    };

    let height = uint(keys::HEIGHT, "height")?;
    let timestamp = uint(keys::TIMESTAMP, "timestamp")?;

    let previous_hash = match get(keys::PREVIOUS_HASH) {
        Some(Value::Bytes(b)) if b.is_empty() => None,
        Some(Value::Bytes(b)) => Some(
            RecordHash::try_from(b.as_slice())
                .map_err(|_| CoreError::MalformedRecord("invalid previous_hash".into()))?,
        ),
        _ => return Err(CoreError::MalformedRecord("missing previous_hash".into())),
    };

    let hash = match get(keys::HASH) {
        Some(Value::Bytes(b)) => RecordHash::try_from(b.as_slice())
            .map_err(|_| CoreError::MalformedRecord("invalid hash".into()))?,
        _ => return Err(CoreError::MalformedRecord("missing hash".into())),
    };

    let body = match get(keys::BODY) {
        Some(Value::Bytes(b)) => Bytes::from(b.clone()),
        _ => return Err(CoreError::MalformedRecord("missing body".into())),
    };

    Ok(LedgerRecord {
        height,
        previous_hash,
        hash,
        timestamp,
        body,
    })
}
