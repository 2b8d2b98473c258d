//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for every backend and the routing layer.
///
/// An expired entry is never an error: `get` reports it as absent.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backend selection or options are invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database could not be opened or reached
    #[error("Error connecting to database {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Filesystem operation failed
    #[error("I/O error: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Statement failed on the embedded dialect
    #[error("SQLite statement failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Statement failed on the client/server dialect
    #[error("MySQL statement failed: {0}")]
    MySql(#[from] sqlx::Error),

    /// Value could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored payload is corrupt or does not match the requested type
    #[error("Stored payload for key '{key}' could not be decoded: {source}")]
    Deserialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CacheError {
    /// Builds an I/O error tagged with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Builds a connection error for the given target description.
    pub fn connection(
        target: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Connection {
            target: target.into(),
            source: source.into(),
        }
    }

    /// Builds a decoding error for the payload stored under `key`.
    pub fn deserialization(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Deserialization {
            key: key.into(),
            source,
        }
    }

    /// True when a SQL statement failed, whichever dialect ran it.
    pub fn is_statement(&self) -> bool {
        matches!(self, Self::Sqlite(_) | Self::MySql(_))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
