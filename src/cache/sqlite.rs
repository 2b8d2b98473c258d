//! SQLite dialect for the table backend.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::cache::table::{CacheRow, Dialect, SqlConnection};
use crate::error::{CacheError, Result};

/// Database path that opens a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// A single rusqlite connection held for the backend's lifetime.
pub struct SqliteConnection {
    conn: Connection,
}

impl SqliteConnection {
    /// Opens the database file, creating parent directories first.
    pub fn open(database: &str) -> Result<Self> {
        let opened = if database == IN_MEMORY {
            Connection::open_in_memory()
        } else {
            let path = Path::new(database);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
            }
            Connection::open(path)
        };
        let conn =
            opened.map_err(|e| CacheError::connection(format!("sqlite:{}", database), e))?;

        debug!(database, "Opened SQLite connection");
        Ok(Self { conn })
    }

    /// Raw handle, for callers that need to inspect the table directly.
    pub fn raw(&self) -> &Connection {
        &self.conn
    }
}

impl SqlConnection for SqliteConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn table_exists(&mut self, table: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![table],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn create_table(&mut self, table: &str) -> Result<()> {
        self.conn.execute_batch(&format!(
            "CREATE TABLE {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                cache_key TEXT UNIQUE NOT NULL,
                cache_value TEXT NOT NULL,
                expires_at INTEGER NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )"
        ))?;
        Ok(())
    }

    fn upsert(&mut self, table: &str, key: &str, value: &str, expires_at: i64) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO {table} (cache_key, cache_value, expires_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(cache_key) DO UPDATE SET
                    cache_value = excluded.cache_value,
                    expires_at = excluded.expires_at"
            ),
            params![key, value, expires_at],
        )?;
        Ok(())
    }

    fn select(&mut self, table: &str, key: &str) -> Result<Option<CacheRow>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT cache_value, expires_at FROM {table} WHERE cache_key = ?1"),
                params![key],
                |row| {
                    Ok(CacheRow {
                        cache_value: row.get(0)?,
                        expires_at: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    fn delete(&mut self, table: &str, key: &str) -> Result<()> {
        self.conn.execute(
            &format!("DELETE FROM {table} WHERE cache_key = ?1"),
            params![key],
        )?;
        Ok(())
    }

    fn delete_all(&mut self, table: &str) -> Result<u64> {
        let removed = self.conn.execute(&format!("DELETE FROM {table}"), [])?;
        Ok(removed as u64)
    }

    fn count(&mut self, table: &str) -> Result<u64> {
        let count: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
