//! Cache Entry Module
//!
//! Defines the envelope persisted for each entry and the TTL arithmetic shared
//! by every backend.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CacheError, Result};

// == Cache Entry ==
/// A stored value together with its absolute expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The stored value
    pub value: Value,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: i64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry that expires `ttl_seconds` from now.
    pub fn new(value: Value, ttl_seconds: u64) -> Self {
        Self {
            value,
            expires_at: expires_at_from_now(ttl_seconds),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is still live during the second it expires at; it is expired
    /// once the clock moves strictly past `expires_at`.
    pub fn is_expired(&self) -> bool {
        is_expired_at(self.expires_at, current_timestamp())
    }

    /// Encodes the envelope as the bytes written to storage.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes an envelope read back for `key`.
    pub fn decode(key: &str, bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| CacheError::deserialization(key, e))
    }
}

// == TTL Resolution ==
/// What a write should do once the caller's TTL is resolved against the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Store the entry for this many seconds
    Expires(u64),
    /// A TTL of zero: the entry is expired on arrival and must not be stored
    Immediate,
}

impl Ttl {
    /// Picks the explicit TTL when given, otherwise the backend default.
    pub fn resolve(explicit: Option<u64>, default_ttl: u64) -> Self {
        match explicit.unwrap_or(default_ttl) {
            0 => Ttl::Immediate,
            secs => Ttl::Expires(secs),
        }
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in seconds.
pub fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Absolute expiry for a TTL starting now, saturating instead of overflowing.
pub fn expires_at_from_now(ttl_seconds: u64) -> i64 {
    let ttl = i64::try_from(ttl_seconds).unwrap_or(i64::MAX);
    current_timestamp().saturating_add(ttl)
}

/// True when `now` lies strictly past `expires_at`.
pub fn is_expired_at(expires_at: i64, now: i64) -> bool {
    now > expires_at
}

/// Encodes a bare value for the table backend's `cache_value` column.
pub fn encode_value(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Decodes a `cache_value` column read back for `key`.
pub fn decode_value(key: &str, raw: &str) -> Result<Value> {
    serde_json::from_str(raw).map_err(|e| CacheError::deserialization(key, e))
}
