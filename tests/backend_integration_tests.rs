//! Integration Tests for the cache store
//!
//! Drives `CacheStore` end to end against every backend. MySQL tests run only
//! when `CACHE_TEST_MYSQL_HOST` is set (with optional `CACHE_TEST_MYSQL_PORT`,
//! `CACHE_TEST_MYSQL_DATABASE`, `CACHE_TEST_MYSQL_USERNAME`, `CACHE_TEST_MYSQL_PASSWORD`).

use serde_json::{json, Value};
use std::fs;
use std::thread::sleep;
use std::time::Duration;
use tempfile::TempDir;
use ttl_cache::cache::{current_timestamp, CacheEntry};
use ttl_cache::config::{DatabaseConfig, FileConfig};
use ttl_cache::{CacheConfig, CacheError, CacheStore, StorageBackend};

// == Helper Functions ==

fn file_store(dir: &TempDir) -> CacheStore {
    CacheStore::from_config(&CacheConfig::file(FileConfig {
        path: dir.path().join("cache"),
        ttl: 300,
        prefix: "c_".to_string(),
    }))
    .unwrap()
}

fn sqlite_store(dir: &TempDir) -> CacheStore {
    CacheStore::from_config(&CacheConfig::database(DatabaseConfig {
        driver: "sqlite".to_string(),
        database: dir
            .path()
            .join("cache.sqlite")
            .to_string_lossy()
            .into_owned(),
        ttl: 300,
        ..DatabaseConfig::default()
    }))
    .unwrap()
}

fn mysql_config() -> Option<DatabaseConfig> {
    let host = std::env::var("CACHE_TEST_MYSQL_HOST").ok()?;
    Some(DatabaseConfig {
        driver: "mysql".to_string(),
        host,
        port: std::env::var("CACHE_TEST_MYSQL_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3306),
        database: std::env::var("CACHE_TEST_MYSQL_DATABASE").unwrap_or_else(|_| "cache_test".into()),
        username: std::env::var("CACHE_TEST_MYSQL_USERNAME").ok(),
        password: std::env::var("CACHE_TEST_MYSQL_PASSWORD").ok(),
        ttl: 300,
        ..DatabaseConfig::default()
    })
}

fn nested_value() -> Value {
    json!({
        "user": {
            "name": "Åsa Nørgaard",
            "greeting": "こんにちは 👋",
            "balance": -1250,
            "active": true,
            "nickname": null
        },
        "history": [[1, -2, 3], [], [{"deep": ["x", "y"]}]],
        "ratio": 0.5
    })
}

/// Runs one operation sequence and returns everything `get` observed.
fn run_scenario(store: &mut CacheStore) -> Vec<Option<Value>> {
    store.clear().unwrap();
    let mut seen = Vec::new();

    store.set("a", &json!(1), None).unwrap();
    store.set("b", &nested_value(), Some(600)).unwrap();
    seen.push(store.get("a").unwrap());
    seen.push(store.get("b").unwrap());
    seen.push(store.get("missing").unwrap());

    // Keys are opaque: case and accents make distinct entries
    store.set("Key", &json!("upper"), None).unwrap();
    store.set("key", &json!("lower"), None).unwrap();
    store.set("kéy", &json!("accent"), None).unwrap();
    seen.push(store.get("Key").unwrap());
    seen.push(store.get("key").unwrap());
    seen.push(store.get("kéy").unwrap());

    store.set("a", &json!("overwritten"), None).unwrap();
    seen.push(store.get("a").unwrap());

    store.delete("a").unwrap();
    store.delete("never-set").unwrap();
    seen.push(store.get("a").unwrap());

    store.set("z", &json!([1, 2]), Some(0)).unwrap();
    seen.push(store.get("z").unwrap());

    store.clear().unwrap();
    seen.push(store.get("b").unwrap());
    seen
}

// == Contract Tests ==

#[test]
fn test_file_store_contract() {
    let dir = TempDir::new().unwrap();
    let mut store = file_store(&dir);

    store.set("greeting", &json!("hello"), None).unwrap();
    assert_eq!(store.get("greeting").unwrap(), Some(json!("hello")));
    assert_eq!(store.get("unknown").unwrap(), None);

    store.delete("greeting").unwrap();
    assert_eq!(store.get("greeting").unwrap(), None);
}

#[test]
fn test_sqlite_store_contract() {
    let dir = TempDir::new().unwrap();
    let mut store = sqlite_store(&dir);

    store.set("greeting", &json!("hello"), None).unwrap();
    assert_eq!(store.get("greeting").unwrap(), Some(json!("hello")));
    assert_eq!(store.get("unknown").unwrap(), None);

    store.delete("greeting").unwrap();
    assert_eq!(store.get("greeting").unwrap(), None);
}

#[test]
fn test_roundtrip_fidelity_on_every_backend() {
    let dir = TempDir::new().unwrap();
    let value = nested_value();

    for mut store in [file_store(&dir), sqlite_store(&dir)] {
        store.set("nested", &value, None).unwrap();
        assert_eq!(store.get("nested").unwrap(), Some(value.clone()));
    }
}

#[test]
fn test_float_values_survive_every_backend() {
    let dir = TempDir::new().unwrap();
    let value = json!({
        "tiny": 1.0715660391465826e-75,
        "sum": 0.1 + 0.2,
        "list": [-3.141592653589793, 2.718281828459045e200]
    });

    for mut store in [file_store(&dir), sqlite_store(&dir)] {
        store.set("floats", &value, None).unwrap();
        assert_eq!(store.get("floats").unwrap(), Some(value.clone()));
        store.put("one", &1.0715660391465826e-75_f64, None).unwrap();
        assert_eq!(
            store.fetch::<f64>("one").unwrap().map(f64::to_bits),
            Some(1.0715660391465826e-75_f64.to_bits())
        );
    }
}

#[test]
fn test_expiry_removes_storage_on_every_backend() {
    let dir = TempDir::new().unwrap();
    let mut file = file_store(&dir);
    let mut table = sqlite_store(&dir);

    file.set("short", &json!("lived"), Some(1)).unwrap();
    table.set("short", &json!("lived"), Some(1)).unwrap();

    sleep(Duration::from_millis(2100));

    assert_eq!(file.get("short").unwrap(), None);
    assert_eq!(table.get("short").unwrap(), None);

    match (&file, &mut table) {
        (CacheStore::File(backend), CacheStore::Table(rows)) => {
            assert!(!backend.path_for("short").exists());
            assert_eq!(rows.len().unwrap(), 0);
        }
        other => panic!("unexpected backends: {:?}", other),
    }
}

#[test]
fn test_clear_leaves_unrelated_files() {
    let dir = TempDir::new().unwrap();
    let mut store = file_store(&dir);
    let neighbour = dir.path().join("cache.sqlite-unrelated");
    fs::write(&neighbour, "not ours").unwrap();

    for key in ["k1", "k2", "k3"] {
        store.set(key, &json!(key), None).unwrap();
    }
    store.clear().unwrap();

    for key in ["k1", "k2", "k3"] {
        assert_eq!(store.get(key).unwrap(), None);
    }
    assert_eq!(fs::read_dir(dir.path().join("cache")).unwrap().count(), 0);
    assert!(neighbour.exists());
}

#[test]
fn test_expired_envelope_written_by_hand_is_purged() {
    let dir = TempDir::new().unwrap();
    let mut store = file_store(&dir);
    let CacheStore::File(backend) = &store else {
        panic!("expected file backend");
    };

    let path = backend.path_for("stale");
    let envelope = CacheEntry {
        value: json!("old"),
        expires_at: current_timestamp() - 10,
    };
    fs::write(&path, envelope.encode().unwrap()).unwrap();

    assert_eq!(store.get("stale").unwrap(), None);
    assert!(!path.exists());
}

#[test]
fn test_corrupt_file_is_not_a_miss() {
    let dir = TempDir::new().unwrap();
    let mut store = file_store(&dir);
    store.set("k", &json!(1), None).unwrap();

    if let CacheStore::File(backend) = &store {
        fs::write(backend.path_for("k"), "garbage").unwrap();
    }

    assert!(matches!(
        store.get("k"),
        Err(CacheError::Deserialization { .. })
    ));
}

#[test]
fn test_file_and_sqlite_parity() {
    let dir = TempDir::new().unwrap();
    let from_file = run_scenario(&mut file_store(&dir));
    let from_sqlite = run_scenario(&mut sqlite_store(&dir));

    assert_eq!(from_file, from_sqlite);
    assert_eq!(
        from_file,
        vec![
            Some(json!(1)),
            Some(nested_value()),
            None,
            Some(json!("upper")),
            Some(json!("lower")),
            Some(json!("accent")),
            Some(json!("overwritten")),
            None,
            None,
            None,
        ]
    );
}

// == MySQL ==

#[test]
fn test_mysql_dialect_parity() {
    let Some(config) = mysql_config() else {
        eprintln!("CACHE_TEST_MYSQL_HOST not set, skipping MySQL parity test");
        return;
    };

    let dir = TempDir::new().unwrap();
    let mut mysql = CacheStore::from_config(&CacheConfig::database(config)).unwrap();

    assert_eq!(run_scenario(&mut mysql), run_scenario(&mut sqlite_store(&dir)));
}

#[test]
fn test_mysql_expiry_and_single_row() {
    let Some(config) = mysql_config() else {
        return;
    };

    let mut store = CacheStore::from_config(&CacheConfig::database(config)).unwrap();
    store.clear().unwrap();

    store.set("k", &json!("v1"), None).unwrap();
    store.set("k", &json!("v2"), Some(1)).unwrap();
    assert_eq!(store.get("k").unwrap(), Some(json!("v2")));

    sleep(Duration::from_millis(2100));
    assert_eq!(store.get("k").unwrap(), None);

    if let CacheStore::Table(rows) = &mut store {
        assert_eq!(rows.len().unwrap(), 0);
    }
}
