//! Configuration Module
//!
//! Static options handed to the cache at construction. Values come from a
//! JSON file or from environment variables, with sensible defaults.

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{CacheError, Result};

/// Default TTL in seconds when `set` omits one.
pub const DEFAULT_TTL: u64 = 3600;

/// Default filename prefix for cache files.
pub const DEFAULT_PREFIX: &str = "c_";

/// Top-level cache configuration.
///
/// `driver` names the entry of `drivers` that will back the cache.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Selected backend identifier (`file` or `database`)
    pub driver: String,
    /// Per-backend option sections
    pub drivers: DriversConfig,
}

/// Option sections for every known backend. Absent sections are `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DriversConfig {
    pub file: Option<FileConfig>,
    pub database: Option<DatabaseConfig>,
}

/// Options for the file backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Root directory for cache files
    pub path: PathBuf,
    /// Default TTL in seconds
    pub ttl: u64,
    /// Filename prefix for derived cache file names
    pub prefix: String,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: env::temp_dir().join(".cache"),
            ttl: DEFAULT_TTL,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

/// Options for the database backend.
///
/// `host`, `port`, `username`, `password` and `charset` only apply to the
/// client/server dialect.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Dialect selector: `sqlite` or `mysql`
    pub driver: String,
    /// Database file path (sqlite) or schema name (mysql)
    pub database: String,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub charset: String,
    /// Default TTL in seconds
    pub ttl: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: "sqlite".to_string(),
            database: env::temp_dir()
                .join("cache.sqlite")
                .to_string_lossy()
                .into_owned(),
            host: "127.0.0.1".to_string(),
            port: 3306,
            username: None,
            password: None,
            charset: "utf8mb4".to_string(),
            ttl: DEFAULT_TTL,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            driver: "file".to_string(),
            drivers: DriversConfig {
                file: Some(FileConfig::default()),
                database: Some(DatabaseConfig::default()),
            },
        }
    }
}

impl CacheConfig {
    /// Builds a configuration that selects the file backend.
    pub fn file(config: FileConfig) -> Self {
        Self {
            driver: "file".to_string(),
            drivers: DriversConfig {
                file: Some(config),
                database: None,
            },
        }
    }

    /// Builds a configuration that selects the database backend.
    pub fn database(config: DatabaseConfig) -> Self {
        Self {
            driver: "database".to_string(),
            drivers: DriversConfig {
                file: None,
                database: Some(config),
            },
        }
    }

    /// Loads configuration from a JSON document on disk.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| CacheError::io(path, e))?;
        serde_json::from_str(&raw).map_err(|e| {
            CacheError::Config(format!("invalid config file {}: {}", path.display(), e))
        })
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DRIVER` - Backend identifier (default: file)
    /// - `CACHE_PATH`, `CACHE_TTL`, `CACHE_PREFIX` - File backend options
    /// - `CACHE_DB_DRIVER`, `CACHE_DB_DATABASE`, `CACHE_DB_HOST`, `CACHE_DB_PORT`,
    ///   `CACHE_DB_USERNAME`, `CACHE_DB_PASSWORD`, `CACHE_DB_CHARSET` - Database options
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a configuration from `lookup`, which maps a `CACHE_*` variable
    /// name to its value. Unset or unparsable values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut file = FileConfig::default();
        let mut database = DatabaseConfig::default();

        if let Some(path) = lookup("CACHE_PATH") {
            file.path = PathBuf::from(path);
        }
        if let Some(ttl) = lookup("CACHE_TTL").and_then(|v| v.parse().ok()) {
            file.ttl = ttl;
            database.ttl = ttl;
        }
        if let Some(prefix) = lookup("CACHE_PREFIX") {
            file.prefix = prefix;
        }

        if let Some(driver) = lookup("CACHE_DB_DRIVER") {
            database.driver = driver;
        }
        if let Some(name) = lookup("CACHE_DB_DATABASE") {
            database.database = name;
        }
        if let Some(host) = lookup("CACHE_DB_HOST") {
            database.host = host;
        }
        if let Some(port) = lookup("CACHE_DB_PORT").and_then(|v| v.parse().ok()) {
            database.port = port;
        }
        database.username = lookup("CACHE_DB_USERNAME");
        database.password = lookup("CACHE_DB_PASSWORD");
        if let Some(charset) = lookup("CACHE_DB_CHARSET") {
            database.charset = charset;
        }

        Self {
            driver: lookup("CACHE_DRIVER").unwrap_or_else(|| "file".to_string()),
            drivers: DriversConfig {
                file: Some(file),
                database: Some(database),
            },
        }
    }
}
