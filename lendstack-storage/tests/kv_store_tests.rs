use lendstack_storage::{KvStore, StorageError, StorageLocation};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Sample {
    name: String,
    amount: u32,
    tags: Vec<String>,
}

fn sample() -> Sample {
    Sample {
        name: "bridging loan".to_string(),
        amount: 250_000,
        tags: vec!["urgent".to_string()],
    }
}

fn disk_store(dir: &TempDir) -> KvStore {
    KvStore::open(StorageLocation::Persistent(dir.path().to_path_buf()))
}

/// A root whose parent is a regular file, so every disk write fails.
fn broken_disk_store(dir: &TempDir) -> KvStore {
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"not a directory").unwrap();
    KvStore::open(StorageLocation::Persistent(blocker.join("data")))
}

// ── Round-trip ──────────────────────────────────────────────────

#[test]
fn save_then_load_returns_equal_value() {
    let store = KvStore::in_memory();
    store.save("x", &json!({"a": 1})).unwrap();
    let loaded: Value = store.load("x", Value::Null).unwrap();
    assert_eq!(loaded, json!({"a": 1}));
}

#[test]
fn typed_roundtrip_on_disk() {
    let dir = TempDir::new().unwrap();
    let store = disk_store(&dir);
    store.save("sample", &sample()).unwrap();
    let loaded: Sample = store.get("sample").unwrap().unwrap();
    assert_eq!(loaded, sample());
}

#[test]
fn loaded_value_is_a_copy() {
    let store = KvStore::in_memory();
    store.save("list", &vec![1, 2, 3]).unwrap();

    let mut first: Vec<i32> = store.get("list").unwrap().unwrap();
    first.push(4);

    let second: Vec<i32> = store.get("list").unwrap().unwrap();
    assert_eq!(second, vec![1, 2, 3]);
}

#[test]
fn later_save_overwrites() {
    let store = KvStore::in_memory();
    store.save("k", &1).unwrap();
    store.save("k", &2).unwrap();
    assert_eq!(store.get::<i32>("k").unwrap(), Some(2));
}

// ── Seed on miss ────────────────────────────────────────────────

#[test]
fn load_missing_key_returns_and_persists_default() {
    let store = KvStore::in_memory();
    let loaded: Vec<String> = store.load("seeded", vec!["a".to_string()]).unwrap();
    assert_eq!(loaded, vec!["a".to_string()]);

    let again: Option<Vec<String>> = store.get("seeded").unwrap();
    assert_eq!(again, Some(vec!["a".to_string()]));
}

#[test]
fn load_seeds_the_disk_file() {
    let dir = TempDir::new().unwrap();
    let store = disk_store(&dir);
    let _: Value = store.load("enquiries", json!([{"id": 1}])).unwrap();

    let raw = fs::read_to_string(dir.path().join("enquiries.json")).unwrap();
    let on_disk: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(on_disk, json!([{"id": 1}]));
}

#[test]
fn load_existing_key_ignores_default() {
    let store = KvStore::in_memory();
    store.save("k", &"stored").unwrap();
    let loaded: String = store.load("k", "default".to_string()).unwrap();
    assert_eq!(loaded, "stored");
}

#[test]
fn get_missing_key_does_not_seed() {
    let store = KvStore::in_memory();
    assert_eq!(store.get::<Value>("nothing").unwrap(), None);
    assert!(!store.exists("nothing"));
}

// ── Restart / precedence ────────────────────────────────────────

#[test]
fn reopened_store_reads_from_disk() {
    let dir = TempDir::new().unwrap();
    {
        let store = disk_store(&dir);
        store.save("staff", &sample()).unwrap();
    }
    let reopened = disk_store(&dir);
    let loaded: Sample = reopened.load("staff", Sample {
        name: String::new(),
        amount: 0,
        tags: vec![],
    })
    .unwrap();
    assert_eq!(loaded, sample());
}

#[test]
fn cache_wins_over_disk_once_populated() {
    let dir = TempDir::new().unwrap();
    let store = disk_store(&dir);
    store.save("k", &"from-cache").unwrap();

    // Out-of-band edit of the mirror file is not observed while cached.
    fs::write(dir.path().join("k.json"), "\"edited\"").unwrap();
    assert_eq!(store.get::<String>("k").unwrap().as_deref(), Some("from-cache"));
}

#[test]
fn unparseable_file_is_treated_as_missing() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("broken.json"), "{not json").unwrap();
    let store = disk_store(&dir);

    let loaded: Value = store.load("broken", json!([])).unwrap();
    assert_eq!(loaded, json!([]));
}

#[test]
fn type_mismatch_is_an_error() {
    let store = KvStore::in_memory();
    store.save("n", &"text").unwrap();
    let err = store.get::<u64>("n").unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
}

// ── Disk failure fallback ───────────────────────────────────────

#[test]
fn failed_disk_writes_still_roundtrip_through_cache() {
    let dir = TempDir::new().unwrap();
    let store = broken_disk_store(&dir);

    store.save("x", &json!({"a": 1})).unwrap();
    let loaded: Value = store.load("x", Value::Null).unwrap();
    assert_eq!(loaded, json!({"a": 1}));

    assert_eq!(store.disk_write_failures(), 1);
    assert!(store.is_degraded());
}

#[test]
fn failed_disk_seed_still_returns_default() {
    let dir = TempDir::new().unwrap();
    let store = broken_disk_store(&dir);
    let loaded: Vec<u8> = store.load("seed", vec![7]).unwrap();
    assert_eq!(loaded, vec![7]);
    assert_eq!(store.get::<Vec<u8>>("seed").unwrap(), Some(vec![7]));
}

#[test]
fn memory_only_never_touches_disk() {
    let store = KvStore::in_memory();
    store.save("k", &1).unwrap();
    assert_eq!(store.disk_write_failures(), 0);
    assert!(store.is_degraded());
    assert_eq!(store.location(), &StorageLocation::MemoryOnly);
}

#[test]
fn healthy_disk_store_is_not_degraded() {
    let dir = TempDir::new().unwrap();
    let store = disk_store(&dir);
    store.save("k", &1).unwrap();
    assert!(!store.is_degraded());
}

// ── Delete / exists / keys / clear ──────────────────────────────

#[test]
fn delete_removes_both_tiers() {
    let dir = TempDir::new().unwrap();
    let store = disk_store(&dir);
    store.save("gone", &1).unwrap();
    assert!(dir.path().join("gone.json").exists());

    assert!(store.delete("gone").unwrap());
    assert!(!store.exists("gone"));
    assert!(!dir.path().join("gone.json").exists());
}

#[test]
fn delete_absent_key_is_not_an_error() {
    let store = KvStore::in_memory();
    assert!(!store.delete("never-saved").unwrap());
}

#[test]
fn exists_sees_disk_only_keys() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("cold.json"), "1").unwrap();
    let store = disk_store(&dir);
    assert!(store.exists("cold"));
}

#[test]
fn keys_union_cache_and_disk() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("on_disk.json"), "1").unwrap();
    fs::write(dir.path().join("ignored.txt"), "x").unwrap();
    let store = disk_store(&dir);
    store.save("in_both", &2).unwrap();

    assert_eq!(store.keys(), vec!["in_both".to_string(), "on_disk".to_string()]);
}

#[test]
fn clear_removes_everything() {
    let dir = TempDir::new().unwrap();
    let store = disk_store(&dir);
    store.save("a", &1).unwrap();
    store.save("b", &2).unwrap();

    store.clear();
    assert!(store.keys().is_empty());
    assert!(!dir.path().join("a.json").exists());
}

#[test]
fn clear_removes_leftover_temp_files() {
    let dir = TempDir::new().unwrap();
    let store = disk_store(&dir);
    store.save("real", &1).unwrap();
    // As left behind by a write whose rename never happened.
    std::fs::write(dir.path().join("real.json.tmp"), b"{}").unwrap();
    std::fs::write(dir.path().join("orphan.json.tmp"), b"{}").unwrap();

    store.clear();
    assert!(!dir.path().join("real.json").exists());
    assert!(!dir.path().join("real.json.tmp").exists());
    assert!(!dir.path().join("orphan.json.tmp").exists());
}

#[test]
fn invalid_keys_are_rejected() {
    let store = KvStore::in_memory();
    assert!(matches!(
        store.save("../escape", &1).unwrap_err(),
        StorageError::InvalidKey(_)
    ));
    assert!(store.get::<i32>("").is_err());
    assert!(store.delete("a/b").is_err());
    assert!(!store.exists("a/b"));
}

#[test]
fn debug_output_names_the_store() {
    let store = KvStore::in_memory();
    let debug = format!("{store:?}");
    assert!(debug.contains("KvStore"));
    assert!(debug.contains("MemoryOnly"));
}
