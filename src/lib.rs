//! TTL Cache - A key-value cache with interchangeable storage backends
//!
//! Entries carry an absolute expiry and are stored either as one file per key
//! or as one row per key in a SQLite or MySQL table. Expired entries are purged
//! lazily, on read.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheStore, StorageBackend};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
