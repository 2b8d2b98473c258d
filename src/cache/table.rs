//! Table Backend Module
//!
//! Persists each entry as a row of the `cache` table. Dialect specifics
//! (connection, introspection, DDL, upsert syntax) live behind [`SqlConnection`].

use std::fmt;

use serde_json::Value;
use tracing::{debug, info};

use crate::cache::entry::{self, Ttl};
use crate::cache::mysql::MySqlConnection;
use crate::cache::sqlite::SqliteConnection;
use crate::cache::StorageBackend;
use crate::config::DatabaseConfig;
use crate::error::{CacheError, Result};

/// Name of the table holding cache rows.
pub const CACHE_TABLE: &str = "cache";

// == Dialect ==
/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Embedded, file-based engine
    Sqlite,
    /// Client/server engine
    MySql,
}

impl Dialect {
    /// Maps the `driver` option to a dialect.
    pub fn from_driver(driver: &str) -> Result<Self> {
        match driver {
            "sqlite" => Ok(Dialect::Sqlite),
            "mysql" => Ok(Dialect::MySql),
            other => Err(CacheError::Config(format!(
                "database driver '{}' not supported",
                other
            ))),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Sqlite => write!(f, "sqlite"),
            Dialect::MySql => write!(f, "mysql"),
        }
    }
}

// == Row ==
/// The columns `get` needs from a cache row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRow {
    pub cache_value: String,
    pub expires_at: i64,
}

// == SQL Connection ==
/// One open database handle speaking a specific dialect.
///
/// Every method surfaces statement failures as errors.
pub trait SqlConnection: Send {
    fn dialect(&self) -> Dialect;

    /// Introspects the catalog for `table`.
    fn table_exists(&mut self, table: &str) -> Result<bool>;

    /// Creates `table` with the cache column set.
    fn create_table(&mut self, table: &str) -> Result<()>;

    /// Inserts the row or overwrites value and expiry of the existing one,
    /// in a single statement.
    fn upsert(&mut self, table: &str, key: &str, value: &str, expires_at: i64) -> Result<()>;

    fn select(&mut self, table: &str, key: &str) -> Result<Option<CacheRow>>;

    fn delete(&mut self, table: &str, key: &str) -> Result<()>;

    /// Deletes every row, returning how many were removed.
    fn delete_all(&mut self, table: &str) -> Result<u64>;

    fn count(&mut self, table: &str) -> Result<u64>;
}

// == Table Backend ==
/// Cache rows in a relational table.
pub struct TableBackend {
    conn: Box<dyn SqlConnection>,
    /// Default TTL in seconds for entries without explicit TTL
    default_ttl: u64,
}

impl fmt::Debug for TableBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableBackend")
            .field("dialect", &self.conn.dialect())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl TableBackend {
    // == Constructor ==
    /// Connects according to `config.driver` and bootstraps the table.
    pub fn new(config: &DatabaseConfig) -> Result<Self> {
        let conn: Box<dyn SqlConnection> = match Dialect::from_driver(&config.driver)? {
            Dialect::Sqlite => Box::new(SqliteConnection::open(&config.database)?),
            Dialect::MySql => Box::new(MySqlConnection::connect(config)?),
        };
        Self::with_connection(conn, config.ttl)
    }

    /// Wraps an already open connection and bootstraps the table.
    pub fn with_connection(mut conn: Box<dyn SqlConnection>, default_ttl: u64) -> Result<Self> {
        ensure_table(conn.as_mut())?;
        Ok(Self { conn, default_ttl })
    }

    pub fn dialect(&self) -> Dialect {
        self.conn.dialect()
    }

    // == Length ==
    /// Returns the number of stored rows, expired ones included.
    pub fn len(&mut self) -> Result<u64> {
        self.conn.count(CACHE_TABLE)
    }

    // == Is Empty ==
    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Creates the cache table unless the catalog already lists it.
fn ensure_table(conn: &mut dyn SqlConnection) -> Result<()> {
    if conn.table_exists(CACHE_TABLE)? {
        debug!(dialect = %conn.dialect(), "Cache table already present");
        return Ok(());
    }

    conn.create_table(CACHE_TABLE)?;
    info!(dialect = %conn.dialect(), "Created table '{}'", CACHE_TABLE);
    Ok(())
}

impl StorageBackend for TableBackend {
    fn set(&mut self, key: &str, value: &Value, ttl: Option<u64>) -> Result<()> {
        let ttl = match Ttl::resolve(ttl, self.default_ttl) {
            Ttl::Expires(secs) => secs,
            Ttl::Immediate => {
                debug!(key, "TTL of zero, removing row instead of storing");
                return self.conn.delete(CACHE_TABLE, key);
            }
        };

        let expires_at = entry::expires_at_from_now(ttl);
        let encoded = entry::encode_value(value)?;
        self.conn.upsert(CACHE_TABLE, key, &encoded, expires_at)?;
        debug!(key, expires_at, "Stored cache row");
        Ok(())
    }

    fn get(&mut self, key: &str) -> Result<Option<Value>> {
        let Some(row) = self.conn.select(CACHE_TABLE, key)? else {
            debug!(key, "Table cache miss");
            return Ok(None);
        };

        if entry::is_expired_at(row.expires_at, entry::current_timestamp()) {
            debug!(key, expires_at = row.expires_at, "Cache row expired, removing");
            self.conn.delete(CACHE_TABLE, key)?;
            return Ok(None);
        }

        entry::decode_value(key, &row.cache_value).map(Some)
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.conn.delete(CACHE_TABLE, key)
    }

    fn clear(&mut self) -> Result<()> {
        let removed = self.conn.delete_all(CACHE_TABLE)?;
        info!(dialect = %self.conn.dialect(), "Cleared {} cache rows", removed);
        Ok(())
    }
}
