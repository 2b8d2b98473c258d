//! Cache Module
//!
//! Key-value caching with per-entry TTL over interchangeable storage backends.

mod backend;
mod entry;
mod file;
mod mysql;
mod sqlite;
mod store;
mod table;


// Re-export public types
pub use backend::StorageBackend;
pub use entry::{current_timestamp, CacheEntry, Ttl};
pub use file::{FileBackend, CACHE_FILE_EXTENSION};
pub use mysql::MySqlConnection;
pub use sqlite::{SqliteConnection, IN_MEMORY};
pub use store::CacheStore;
pub use table::{CacheRow, Dialect, SqlConnection, TableBackend, CACHE_TABLE};
