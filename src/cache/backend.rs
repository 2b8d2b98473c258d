//! Storage Backend Contract
//!
//! The four operations every storage medium implements.

use serde_json::Value;

use crate::error::Result;

/// A storage medium for cache entries with per-entry TTL.
///
/// Calls block until the underlying I/O or SQL completes. `get` is the only
/// place expired entries are purged: an expired entry is removed from storage
/// and reported as `None`.
pub trait StorageBackend {
    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// `ttl` of `None` uses the backend default; `Some(0)` expires the entry
    /// immediately, so nothing is stored and any previous entry is removed.
    fn set(&mut self, key: &str, value: &Value, ttl: Option<u64>) -> Result<()>;

    /// Returns the live value for `key`, or `None` when absent or expired.
    fn get(&mut self, key: &str) -> Result<Option<Value>>;

    /// Removes the entry for `key`. Removing a missing key is not an error.
    fn delete(&mut self, key: &str) -> Result<()>;

    /// Removes every entry owned by this backend.
    fn clear(&mut self) -> Result<()>;
}
