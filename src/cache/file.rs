//! File Backend Module
//!
//! Persists each entry as an independent file `<prefix><sha256(key)>.cache`
//! under a root directory that this backend owns exclusively.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::cache::entry::{CacheEntry, Ttl};
use crate::cache::StorageBackend;
use crate::config::FileConfig;
use crate::error::{CacheError, Result};

/// Suffix of every cache file.
pub const CACHE_FILE_EXTENSION: &str = "cache";

// == File Backend ==
/// One file per key, JSON envelope `{value, expires_at}` inside.
#[derive(Debug)]
pub struct FileBackend {
    /// Root directory for cache files
    root: PathBuf,
    /// Default TTL in seconds for entries without explicit TTL
    default_ttl: u64,
    /// Filename prefix
    prefix: String,
}

impl FileBackend {
    // == Constructor ==
    /// Opens the backend, creating the root directory (and parents) if absent.
    pub fn new(config: &FileConfig) -> Result<Self> {
        ensure_dir(&config.path)?;
        info!(
            "File cache ready at {} (default_ttl={}s, prefix={:?})",
            config.path.display(),
            config.ttl,
            config.prefix
        );

        Ok(Self {
            root: config.path.clone(),
            default_ttl: config.ttl,
            prefix: config.prefix.clone(),
        })
    }

    /// Root directory of this backend.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // == Key To Path ==
    /// Derives the file path for `key`. The same key always maps to the same path.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.root.join(format!(
            "{}{:x}.{}",
            self.prefix, digest, CACHE_FILE_EXTENSION
        ))
    }

    /// Removes `path`, treating an already missing file as success.
    fn remove(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }

    /// Writes through a temp file in the same directory, then renames over `path`,
    /// so readers see either the old payload or the new one.
    fn write_replace(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let mut temp =
            tempfile::NamedTempFile::new_in(&self.root).map_err(|e| CacheError::io(&self.root, e))?;
        temp.write_all(bytes)
            .map_err(|e| CacheError::io(temp.path(), e))?;
        temp.persist(path).map_err(|e| CacheError::io(path, e.error))?;
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn set(&mut self, key: &str, value: &Value, ttl: Option<u64>) -> Result<()> {
        let path = self.path_for(key);

        let ttl = match Ttl::resolve(ttl, self.default_ttl) {
            Ttl::Expires(secs) => secs,
            Ttl::Immediate => {
                debug!(key, "TTL of zero, removing entry instead of storing");
                return Self::remove(&path);
            }
        };

        let entry = CacheEntry::new(value.clone(), ttl);
        self.write_replace(&path, &entry.encode()?)?;
        debug!(key, expires_at = entry.expires_at, "Stored file entry");
        Ok(())
    }

    fn get(&mut self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(key, "File cache miss");
                return Ok(None);
            }
            Err(e) => return Err(CacheError::io(&path, e)),
        };

        let entry = CacheEntry::decode(key, &bytes)?;
        if entry.is_expired() {
            debug!(key, expires_at = entry.expires_at, "File entry expired, removing");
            Self::remove(&path)?;
            return Ok(None);
        }

        Ok(Some(entry.value))
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        Self::remove(&self.path_for(key))
    }

    fn clear(&mut self) -> Result<()> {
        let dir = fs::read_dir(&self.root).map_err(|e| CacheError::io(&self.root, e))?;

        let mut removed = 0usize;
        for item in dir {
            let item = item.map_err(|e| CacheError::io(&self.root, e))?;
            let file_type = item.file_type().map_err(|e| CacheError::io(item.path(), e))?;
            // Only files directly under the root; subdirectories are left alone
            if file_type.is_dir() {
                continue;
            }
            Self::remove(&item.path())?;
            removed += 1;
        }

        info!("Cleared {} files from {}", removed, self.root.display());
        Ok(())
    }
}

/// Creates `path` and its parents if they do not exist yet.
fn ensure_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o777);
    }
    builder.create(path).map_err(|e| CacheError::io(path, e))
}
