//! Cache Store Module
//!
//! Routing layer: owns exactly one backend, chosen once from configuration,
//! and forwards the four operations to it.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::cache::{FileBackend, StorageBackend, TableBackend};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Cache Store ==
/// The configured backend, fixed for the lifetime of the store.
#[derive(Debug)]
pub enum CacheStore {
    File(FileBackend),
    Table(TableBackend),
}

impl CacheStore {
    // == Constructor ==
    /// Builds the backend named by `config.driver`.
    ///
    /// Fails when the driver has no option section or is not a known backend.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        let driver = config.driver.as_str();
        let missing = || CacheError::Config(format!("driver '{}' not found", driver));

        let store = match driver {
            "file" => {
                let options = config.drivers.file.as_ref().ok_or_else(missing)?;
                CacheStore::File(FileBackend::new(options)?)
            }
            "database" => {
                let options = config.drivers.database.as_ref().ok_or_else(missing)?;
                CacheStore::Table(TableBackend::new(options)?)
            }
            other => {
                return Err(CacheError::Config(format!(
                    "driver '{}' not supported",
                    other
                )))
            }
        };

        info!("Cache store initialized with '{}' driver", driver);
        Ok(store)
    }

    /// Name of the active backend.
    pub fn driver(&self) -> &'static str {
        match self {
            CacheStore::File(_) => "file",
            CacheStore::Table(_) => "database",
        }
    }

    fn backend(&mut self) -> &mut dyn StorageBackend {
        match self {
            CacheStore::File(backend) => backend,
            CacheStore::Table(backend) => backend,
        }
    }

    // == Typed Helpers ==
    /// Serializes `value` and stores it under `key`.
    pub fn put<T: Serialize + ?Sized>(&mut self, key: &str, value: &T, ttl: Option<u64>) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.set(key, &value, ttl)
    }

    /// Fetches `key` and converts it into `T`.
    ///
    /// A stored value that does not fit `T` is a deserialization error, not a miss.
    pub fn fetch<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| CacheError::deserialization(key, e)),
            None => Ok(None),
        }
    }
}

impl StorageBackend for CacheStore {
    fn set(&mut self, key: &str, value: &Value, ttl: Option<u64>) -> Result<()> {
        self.backend().set(key, value, ttl)
    }

    fn get(&mut self, key: &str) -> Result<Option<Value>> {
        self.backend().get(key)
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.backend().delete(key)
    }

    fn clear(&mut self) -> Result<()> {
        self.backend().clear()
    }
}
