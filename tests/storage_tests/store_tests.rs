//! Tests for the storage transaction facade
//!
//! These tests verify:
//! - Environment creation (directory + database file)
//! - get/put/delete inside transactions
//! - Commit and abort semantics
//! - Snapshot isolation for read-only transactions
//! - Concurrent writers on distinct keys

use std::sync::Arc;
use std::thread;

use pear::config::Config;
use pear::storage::{Store, TxnMode, DB_FILENAME};
use pear::PearError;
use redb::backends::InMemoryBackend;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_store() -> (TempDir, Store) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .cache_size(16 * 1024 * 1024)
        .build();
    let store = Store::open(&config).unwrap();
    (temp_dir, store)
}

fn write(store: &Store, key: &[u8], value: &[u8]) {
    let mut txn = store.begin(TxnMode::ReadWrite).unwrap();
    txn.put(key, value).unwrap();
    txn.commit().unwrap();
}

fn read(store: &Store, key: &[u8]) -> Option<Vec<u8>> {
    let txn = store.begin(TxnMode::ReadOnly).unwrap();
    let value = txn.get(key).unwrap();
    txn.commit().unwrap();
    value
}

// =============================================================================
// Environment Tests
// =============================================================================

#[test]
fn test_open_creates_directory_and_file() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("nested").join("store");

    let store = Store::open_path(&data_dir).unwrap();

    assert!(data_dir.exists());
    assert!(data_dir.join(DB_FILENAME).exists());
    assert_eq!(store.path(), Some(data_dir.join(DB_FILENAME).as_path()));
}

#[test]
fn test_fresh_store_reads_nothing() {
    let (_temp, store) = setup_temp_store();

    assert_eq!(read(&store, b"anything"), None);
}

#[test]
fn test_data_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = Store::open_path(temp_dir.path()).unwrap();
        write(&store, b"durable", b"yes");
    }

    let store = Store::open_path(temp_dir.path()).unwrap();
    assert_eq!(read(&store, b"durable"), Some(b"yes".to_vec()));
}

#[test]
fn test_in_memory_backend_store() {
    let store = Store::open_backend(InMemoryBackend::new(), &Config::default()).unwrap();

    assert_eq!(store.path(), None);
    write(&store, b"k", b"v");
    assert_eq!(read(&store, b"k"), Some(b"v".to_vec()));
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_put_commit_get() {
    let (_temp, store) = setup_temp_store();

    write(&store, b"hello", b"world");

    assert_eq!(read(&store, b"hello"), Some(b"world".to_vec()));
}

#[test]
fn test_put_overwrites() {
    let (_temp, store) = setup_temp_store();

    write(&store, b"key", b"value1");
    write(&store, b"key", b"value2");

    assert_eq!(read(&store, b"key"), Some(b"value2".to_vec()));
}

#[test]
fn test_empty_value() {
    let (_temp, store) = setup_temp_store();

    write(&store, b"empty", b"");

    assert_eq!(read(&store, b"empty"), Some(Vec::new()));
}

#[test]
fn test_binary_value() {
    let (_temp, store) = setup_temp_store();
    let value: Vec<u8> = (0..=255u8).collect();

    write(&store, b"bin", &value);

    assert_eq!(read(&store, b"bin"), Some(value));
}

#[test]
fn test_delete_existing_and_missing() {
    let (_temp, store) = setup_temp_store();
    write(&store, b"key", b"value");

    let mut txn = store.begin(TxnMode::ReadWrite).unwrap();
    assert!(txn.delete(b"key").unwrap());
    txn.commit().unwrap();
    assert_eq!(read(&store, b"key"), None);

    let mut txn = store.begin(TxnMode::ReadWrite).unwrap();
    assert!(!txn.delete(b"key").unwrap());
    txn.commit().unwrap();
}

#[test]
fn test_write_transaction_sees_own_writes() {
    let (_temp, store) = setup_temp_store();

    let mut txn = store.begin(TxnMode::ReadWrite).unwrap();
    txn.put(b"key", b"pending").unwrap();
    assert_eq!(txn.get(b"key").unwrap(), Some(b"pending".to_vec()));
    txn.commit().unwrap();
}

#[test]
fn test_modes_reported() {
    let (_temp, store) = setup_temp_store();

    let txn = store.begin(TxnMode::ReadOnly).unwrap();
    assert_eq!(txn.mode(), TxnMode::ReadOnly);
    txn.commit().unwrap();

    let txn = store.begin(TxnMode::ReadWrite).unwrap();
    assert_eq!(txn.mode(), TxnMode::ReadWrite);
    txn.abort().unwrap();
}

// =============================================================================
// Transaction Semantics Tests
// =============================================================================

#[test]
fn test_abort_discards_writes() {
    let (_temp, store) = setup_temp_store();
    write(&store, b"kept", b"original");

    let mut txn = store.begin(TxnMode::ReadWrite).unwrap();
    txn.put(b"kept", b"changed").unwrap();
    txn.put(b"new", b"value").unwrap();
    txn.abort().unwrap();

    assert_eq!(read(&store, b"kept"), Some(b"original".to_vec()));
    assert_eq!(read(&store, b"new"), None);
}

#[test]
fn test_uncommitted_write_invisible_to_reader() {
    let (_temp, store) = setup_temp_store();

    let mut writer = store.begin(TxnMode::ReadWrite).unwrap();
    writer.put(b"key", b"value").unwrap();

    assert_eq!(read(&store, b"key"), None);

    writer.commit().unwrap();
    assert_eq!(read(&store, b"key"), Some(b"value".to_vec()));
}

#[test]
fn test_reader_keeps_snapshot() {
    let (_temp, store) = setup_temp_store();
    write(&store, b"key", b"before");

    let snapshot = store.begin(TxnMode::ReadOnly).unwrap();
    write(&store, b"key", b"after");

    assert_eq!(snapshot.get(b"key").unwrap(), Some(b"before".to_vec()));
    snapshot.commit().unwrap();

    assert_eq!(read(&store, b"key"), Some(b"after".to_vec()));
}

#[test]
fn test_read_only_rejects_writes() {
    let (_temp, store) = setup_temp_store();

    let mut txn = store.begin(TxnMode::ReadOnly).unwrap();

    assert!(matches!(
        txn.put(b"key", b"value"),
        Err(PearError::ReadOnlyTransaction)
    ));
    assert!(matches!(
        txn.delete(b"key"),
        Err(PearError::ReadOnlyTransaction)
    ));
    txn.abort().unwrap();
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_writers_distinct_keys() {
    let (_temp, store) = setup_temp_store();
    let store = Arc::new(store);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..25 {
                    let key = format!("t{}-k{}", t, i);
                    let value = format!("v{}-{}", t, i);
                    write(&store, key.as_bytes(), value.as_bytes());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    for t in 0..8 {
        for i in 0..25 {
            let key = format!("t{}-k{}", t, i);
            let value = format!("v{}-{}", t, i);
            assert_eq!(read(&store, key.as_bytes()), Some(value.into_bytes()));
        }
    }
}

#[test]
fn test_readers_never_see_partial_values() {
    let (_temp, store) = setup_temp_store();
    let store = Arc::new(store);
    let a = vec![b'a'; 4096];
    let b = vec![b'b'; 4096];
    write(&store, b"shared", &a);

    let writer = {
        let store = Arc::clone(&store);
        let (a, b) = (a.clone(), b.clone());
        thread::spawn(move || {
            for i in 0..100 {
                let value = if i % 2 == 0 { &b } else { &a };
                write(&store, b"shared", value);
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..200 {
                    let value = read(&store, b"shared").unwrap();
                    assert_eq!(value.len(), 4096);
                    assert!(value.iter().all(|&c| c == value[0]));
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
}
