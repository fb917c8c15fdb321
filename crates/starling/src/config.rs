//! Configuration for the registry.
//!
//! Plain structs with defaults; the outer process decides where values come
//! from. Every field may be omitted when deserializing.

use serde::{Deserialize, Serialize};
use starling_core::{DEFAULT_CHALLENGE_SUFFIX, DEFAULT_WINDOW_SECS, GENESIS_BODY};

/// Configuration for the block store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Body of the genesis record written on first start.
    pub genesis_body: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            genesis_body: GENESIS_BODY.to_string(),
        }
    }
}

/// Configuration for the admission pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Validity window of a new entry, in seconds.
    pub window_secs: u64,
    /// Fixed suffix of every challenge message.
    pub challenge_suffix: String,
    /// Arm a per-entry expiry task. When off, expired entries are removed
    /// by the startup sweep and on read.
    pub expiry_timers: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            window_secs: DEFAULT_WINDOW_SECS,
            challenge_suffix: DEFAULT_CHALLENGE_SUFFIX.to_string(),
            expiry_timers: true,
        }
    }
}

/// Configuration for the whole registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub ledger: LedgerConfig,
    pub pool: PoolConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::default();
        assert_eq!(config.pool.window_secs, 300);
        assert_eq!(config.pool.challenge_suffix, "starRegistry");
        assert!(config.pool.expiry_timers);
        assert_eq!(
            config.ledger.genesis_body,
            "First block in the chain - Genesis block"
        );
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: RegistryConfig =
            serde_json::from_str(r#"{ "pool": { "window_secs": 60 } }"#).unwrap();
        assert_eq!(config.pool.window_secs, 60);
        assert_eq!(config.pool.challenge_suffix, "starRegistry");
        assert_eq!(config.ledger, LedgerConfig::default());
    }
}
