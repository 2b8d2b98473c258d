//! MySQL dialect for the table backend.
//!
//! sqlx is async, so the connection owns a current-thread tokio runtime and
//! blocks on each statement. Do not call into it from inside another runtime.

use sqlx::mysql::{MySqlConnectOptions, MySqlConnection as SqlxConnection};
use sqlx::Connection;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

use crate::cache::table::{CacheRow, Dialect, SqlConnection};
use crate::config::DatabaseConfig;
use crate::error::{CacheError, Result};

/// A single MySQL connection held for the backend's lifetime.
pub struct MySqlConnection {
    runtime: Runtime,
    conn: SqlxConnection,
}

/// Human readable description of the server, without credentials.
pub fn describe_target(config: &DatabaseConfig) -> String {
    format!(
        "mysql://{}:{}/{}?charset={}",
        config.host, config.port, config.database, config.charset
    )
}

fn connect_options(config: &DatabaseConfig) -> MySqlConnectOptions {
    let mut options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.database)
        .charset(&config.charset);
    if let Some(username) = &config.username {
        options = options.username(username);
    }
    if let Some(password) = &config.password {
        options = options.password(password);
    }
    options
}

/// DDL for the cache table. Keys compare byte for byte, so `Key`, `key`
/// and `kéy` stay distinct rows whatever the server's default collation is.
fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE {table} (
            id INT AUTO_INCREMENT PRIMARY KEY,
            cache_key VARCHAR(255) CHARACTER SET utf8mb4 COLLATE utf8mb4_bin UNIQUE NOT NULL,
            cache_value TEXT NOT NULL,
            expires_at BIGINT NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )"
    )
}

/// Single-statement upsert using the row alias form (MySQL 8.0.19+).
fn upsert_sql(table: &str) -> String {
    format!(
        "INSERT INTO {table} (cache_key, cache_value, expires_at)
         VALUES (?, ?, ?) AS new
         ON DUPLICATE KEY UPDATE
            cache_value = new.cache_value,
            expires_at = new.expires_at"
    )
}

impl MySqlConnection {
    /// Connects to the server described by `config`.
    pub fn connect(config: &DatabaseConfig) -> Result<Self> {
        let target = describe_target(config);

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| CacheError::connection(target.clone(), e))?;

        info!("Connecting to {}", target);
        let options = connect_options(config);
        let conn = runtime
            .block_on(async move {
                let mut conn = SqlxConnection::connect_with(&options).await?;
                // Reject truncation and bad values instead of warning about them
                sqlx::query("SET SESSION sql_mode = CONCAT(@@sql_mode, ',STRICT_ALL_TABLES')")
                    .execute(&mut conn)
                    .await?;
                Ok::<_, sqlx::Error>(conn)
            })
            .map_err(|e| CacheError::connection(target.clone(), e))?;
        info!("Database connection established");

        Ok(Self { runtime, conn })
    }
}

impl SqlConnection for MySqlConnection {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn table_exists(&mut self, table: &str) -> Result<bool> {
        let conn = &mut self.conn;
        let count: i64 = self.runtime.block_on(async move {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM information_schema.tables
                 WHERE table_schema = DATABASE() AND table_name = ?",
            )
            .bind(table)
            .fetch_one(conn)
            .await
        })?;
        Ok(count > 0)
    }

    fn create_table(&mut self, table: &str) -> Result<()> {
        let ddl = create_table_sql(table);
        let conn = &mut self.conn;
        self.runtime
            .block_on(async move { sqlx::query(&ddl).execute(conn).await })?;
        Ok(())
    }

    fn upsert(&mut self, table: &str, key: &str, value: &str, expires_at: i64) -> Result<()> {
        let sql = upsert_sql(table);
        let conn = &mut self.conn;
        self.runtime.block_on(async move {
            sqlx::query(&sql)
                .bind(key)
                .bind(value)
                .bind(expires_at)
                .execute(conn)
                .await
        })?;
        debug!(key, "MySQL upsert done");
        Ok(())
    }

    fn select(&mut self, table: &str, key: &str) -> Result<Option<CacheRow>> {
        let sql = format!("SELECT cache_value, expires_at FROM {table} WHERE cache_key = ?");
        let conn = &mut self.conn;
        let row: Option<(String, i64)> = self.runtime.block_on(async move {
            sqlx::query_as::<_, (String, i64)>(&sql).bind(key).fetch_optional(conn).await
        })?;
        Ok(row.map(|(cache_value, expires_at)| CacheRow {
            cache_value,
            expires_at,
        }))
    }

    fn delete(&mut self, table: &str, key: &str) -> Result<()> {
        let sql = format!("DELETE FROM {table} WHERE cache_key = ?");
        let conn = &mut self.conn;
        self.runtime
            .block_on(async move { sqlx::query(&sql).bind(key).execute(conn).await })?;
        Ok(())
    }

    fn delete_all(&mut self, table: &str) -> Result<u64> {
        let sql = format!("DELETE FROM {table}");
        let conn = &mut self.conn;
        let done = self
            .runtime
            .block_on(async move { sqlx::query(&sql).execute(conn).await })?;
        Ok(done.rows_affected())
    }

    fn count(&mut self, table: &str) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        let conn = &mut self.conn;
        let count: i64 = self
            .runtime
            .block_on(async move { sqlx::query_scalar::<_, i64>(&sql).fetch_one(conn).await })?;
        Ok(count as u64)
    }
}
