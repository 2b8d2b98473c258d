//! TTL Cache - command line front end
//!
//! Runs one cache operation against the configured backend.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttl_cache::{CacheConfig, CacheStore, StorageBackend};

#[derive(Parser, Debug)]
#[command(name = "ttl_cache", version, about = "Key-value cache with TTL expiration")]
struct Cli {
    /// JSON configuration file (defaults to CACHE_* environment variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the JSON value stored under KEY; exit status 1 when absent
    Get { key: String },
    /// Store a JSON value under KEY
    Set {
        key: String,
        /// Any JSON document, e.g. '{"a": [1, 2]}' or '"text"'
        value: String,
        /// Seconds until expiry (backend default when omitted, 0 expires at once)
        #[arg(long)]
        ttl: Option<u64>,
    },
    /// Remove KEY
    Delete { key: String },
    /// Remove every entry
    Clear,
}

fn main() -> anyhow::Result<ExitCode> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttl_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CacheConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => CacheConfig::from_env(),
    };
    debug!(driver = %config.driver, "Configuration loaded");

    let mut store = CacheStore::from_config(&config).context("Failed to initialize cache")?;

    match cli.command {
        Command::Get { key } => match store.get(&key)? {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => {
                info!("Key '{}' not found", key);
                return Ok(ExitCode::FAILURE);
            }
        },
        Command::Set { key, value, ttl } => {
            let value: serde_json::Value =
                serde_json::from_str(&value).context("Value is not valid JSON")?;
            store.set(&key, &value, ttl)?;
            info!("Stored '{}'", key);
        }
        Command::Delete { key } => {
            store.delete(&key)?;
            info!("Deleted '{}'", key);
        }
        Command::Clear => {
            store.clear()?;
            info!("Cache cleared");
        }
    }

    Ok(ExitCode::SUCCESS)
}
