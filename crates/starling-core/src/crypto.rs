//! Cryptographic primitives for Starling.
//!
//! Wraps BLAKE3 hashing for the record chain and Ed25519 for the
//! proof-of-possession step of admission.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// A 32-byte BLAKE3 digest of a record's canonical encoding.
///
/// The hex form is the `hash` / `previous_hash` string clients see.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordHash(pub [u8; 32]);

impl RecordHash {
    /// Compute the BLAKE3 digest of the given data.
    pub fn digest(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        decode_hex_32(s).map(Self)
    }

    /// The zero hash. Placeholder before a record is sealed.
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for RecordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for RecordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for RecordHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for RecordHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for RecordHash {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 32] = slice.try_into()?;
        Ok(Self(arr))
    }
}

/// Decode exactly 32 bytes of hex.
fn decode_hex_32(s: &str) -> Result<[u8; 32], hex::FromHexError> {
    let mut out = [0u8; 32];
    hex::decode_to_slice(s, &mut out)?;
    Ok(out)
}

/// A 32-byte Ed25519 public key. Its hex form doubles as an identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ed25519PublicKey(pub [u8; 32]);

impl Ed25519PublicKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        decode_hex_32(s).map(Self)
    }

    /// Verify a signature over a message.
    ///
    /// `Ok(false)` means a well-formed signature that does not match.
    pub fn verify(&self, message: &[u8], signature: &[u8; 64]) -> Result<bool, CoreError> {
        let verifying_key =
            VerifyingKey::from_bytes(&self.0).map_err(|_| CoreError::InvalidPublicKey)?;
        let sig = Signature::from_bytes(signature);
        Ok(verifying_key.verify(message, &sig).is_ok())
    }
}

impl fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Pub({})", &self.to_hex()[..16])
    }
}

/// The signature-verification primitive consulted by the admission pool.
///
/// Returns `Ok(true)` for a signature over `message` made by `identity`,
/// `Ok(false)` for a well-formed mismatch, and `Err` for malformed input.
/// Callers treat both `Ok(false)` and `Err` as a failed verification.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, message: &str, identity: &str, signature: &str) -> Result<bool, CoreError>;
}

/// Ed25519 verifier where identities are hex public keys and signatures are
/// hex-encoded 64-byte Ed25519 signatures over the UTF-8 message.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, message: &str, identity: &str, signature: &str) -> Result<bool, CoreError> {
        let key = Ed25519PublicKey::from_hex(identity)
            .map_err(|e| CoreError::InvalidIdentity(e.to_string()))?;

        let sig_bytes = hex::decode(signature)
            .map_err(|e| CoreError::MalformedSignature(e.to_string()))?;
        let sig: [u8; 64] = sig_bytes.try_into().map_err(|b: Vec<u8>| {
            CoreError::MalformedSignature(format!("expected 64 bytes, got {}", b.len()))
        })?;

        key.verify(message.as_bytes(), &sig)
    }
}

/// A keypair for signing admission challenges.
///
/// Signing happens off-system in production; this lives here for clients
/// and tests.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let signing_key = SigningKey::generate(&mut rng);
        Self { signing_key }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Get the public key.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// The identity string for this keypair (hex public key).
    pub fn identity(&self) -> String {
        self.public_key().to_hex()
    }

    /// Sign a challenge message, returning the hex signature.
    pub fn sign_challenge(&self, challenge: &str) -> String {
        let sig = self.signing_key.sign(challenge.as_bytes());
        hex::encode(sig.to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.public_key())
    }
}
