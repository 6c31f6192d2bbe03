//! Dual-tier key-value store: in-process cache plus one JSON file per key.

use crate::error::{StorageError, StorageResult};
use crate::location::{StorageConfig, StorageLocation};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

const FILE_EXTENSION: &str = "json";
const TEMP_SUFFIX: &str = "json.tmp";

/// Platform-aware durable key-value store.
///
/// Every value is held as a `serde_json::Value` in the cache and handed out
/// by deserializing a fresh copy, so callers never share a reference with
/// the store. Disk I/O failures are logged and counted, never returned.
pub struct KvStore {
    location: StorageLocation,
    cache: RwLock<HashMap<String, Value>>,
    disk_write_failures: AtomicU64,
}

impl KvStore {
    /// Opens a store at `location`, creating the root directory if needed.
    ///
    /// A root that cannot be created does not fail the open: every later
    /// disk write will fail and be absorbed, leaving the cache in charge.
    pub fn open(location: StorageLocation) -> Self {
        if let Some(root) = location.root() {
            match fs::create_dir_all(root) {
                Ok(()) => info!(root = %root.display(), "Storage root ready ({})", location.label()),
                Err(e) => warn!(
                    root = %root.display(),
                    "Failed to create storage root, continuing cache-only: {e}"
                ),
            }
        } else {
            info!("Storage running memory-only; disk writes are skipped");
        }

        Self {
            location,
            cache: RwLock::new(HashMap::new()),
            disk_write_failures: AtomicU64::new(0),
        }
    }

    /// Opens a store at the location detected for this process.
    pub fn detect(config: &StorageConfig) -> Self {
        Self::open(StorageLocation::detect(config))
    }

    /// Opens a memory-only store (for testing).
    pub fn in_memory() -> Self {
        Self::open(StorageLocation::MemoryOnly)
    }

    /// Returns the location this store resolved at construction.
    pub fn location(&self) -> &StorageLocation {
        &self.location
    }

    /// Number of disk writes that failed and were absorbed.
    pub fn disk_write_failures(&self) -> u64 {
        self.disk_write_failures.load(Ordering::Relaxed)
    }

    /// True when the disk tier is missing or has failed at least once.
    pub fn is_degraded(&self) -> bool {
        self.location.root().is_none() || self.disk_write_failures() > 0
    }

    // ── Core operations ──────────────────────────────────────────

    /// Stores `value` under `key`.
    ///
    /// The cache is updated unconditionally; the disk copy is best-effort.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        validate_key(key)?;
        let json = serde_json::to_value(value)?;
        self.write_cache().insert(key.to_string(), json.clone());
        self.write_to_disk(key, &json);
        Ok(())
    }

    /// Loads `key`, seeding it with `default` when absent from both tiers.
    ///
    /// The seeded default is persisted, so a subsequent [`get`](Self::get)
    /// returns it as well.
    pub fn load<T: Serialize + DeserializeOwned>(&self, key: &str, default: T) -> StorageResult<T> {
        match self.lookup(key)? {
            Some(json) => Ok(serde_json::from_value(json)?),
            None => {
                debug!(key, "Seeding missing key with default");
                self.save(key, &default)?;
                Ok(default)
            }
        }
    }

    /// Loads `key` without seeding. `None` when absent from both tiers.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        self.lookup(key)?
            .map(serde_json::from_value)
            .transpose()
            .map_err(StorageError::from)
    }

    /// Removes `key` from the cache and the disk. Absent keys are not an error.
    ///
    /// Returns whether anything was removed.
    pub fn delete(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        let in_cache = self.write_cache().remove(key).is_some();

        let mut on_disk = false;
        if let Some(path) = self.file_path(key) {
            match fs::remove_file(&path) {
                Ok(()) => on_disk = true,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(key, "Failed to remove storage file: {e}"),
            }
        }

        Ok(in_cache || on_disk)
    }

    /// True when `key` is held by either tier.
    pub fn exists(&self, key: &str) -> bool {
        if validate_key(key).is_err() {
            return false;
        }
        if self.read_cache().contains_key(key) {
            return true;
        }
        self.file_path(key).is_some_and(|path| path.is_file())
    }

    /// All keys known to either tier, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: BTreeSet<String> = self.read_cache().keys().cloned().collect();
        if let Some(root) = self.location.root() {
            keys.extend(list_json_stems(root));
        }
        keys.into_iter().collect()
    }

    /// Removes every key from both tiers, along with temp files left by
    /// interrupted writes.
    pub fn clear(&self) {
        self.write_cache().clear();
        if let Some(root) = self.location.root() {
            for stem in list_json_stems(root) {
                let path = root.join(format!("{stem}.{FILE_EXTENSION}"));
                if let Err(e) = fs::remove_file(&path) {
                    warn!(key = %stem, "Failed to remove storage file during clear: {e}");
                }
            }
            for path in list_temp_files(root) {
                if let Err(e) = fs::remove_file(&path) {
                    warn!(path = %path.display(), "Failed to remove temp file during clear: {e}");
                }
            }
        }
        info!("Storage cleared");
    }

    // ── Tiers ────────────────────────────────────────────────────

    /// Cache first; on a miss, the disk copy populates the cache.
    fn lookup(&self, key: &str) -> StorageResult<Option<Value>> {
        validate_key(key)?;
        if let Some(json) = self.read_cache().get(key) {
            return Ok(Some(json.clone()));
        }

        let Some(json) = self.read_from_disk(key) else {
            return Ok(None);
        };
        self.write_cache()
            .entry(key.to_string())
            .or_insert_with(|| json.clone());
        Ok(Some(json))
    }

    fn read_from_disk(&self, key: &str) -> Option<Value> {
        let path = self.file_path(key)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(key, "Failed to read storage file: {e}");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(json) => {
                debug!(key, "Loaded key from disk");
                Some(json)
            }
            Err(e) => {
                warn!(key, "Ignoring unparseable storage file: {e}");
                None
            }
        }
    }

    fn write_to_disk(&self, key: &str, json: &Value) {
        let Some(path) = self.file_path(key) else {
            return;
        };
        if let Err(e) = write_atomic(&path, json) {
            self.disk_write_failures.fetch_add(1, Ordering::Relaxed);
            warn!(key, "Disk write failed, value kept in cache only: {e}");
        }
    }

    fn file_path(&self, key: &str) -> Option<PathBuf> {
        self.location
            .root()
            .map(|root| root.join(format!("{key}.{FILE_EXTENSION}")))
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, HashMap<String, Value>> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, HashMap<String, Value>> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for KvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvStore")
            .field("location", &self.location)
            .field("cached_keys", &self.read_cache().len())
            .field("disk_write_failures", &self.disk_write_failures())
            .finish()
    }
}

/// Keys become file stems, so they must stay inside the root.
fn validate_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && key != "."
        && key != ".."
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// Writes to a sibling temp file, then renames over the target.
fn write_atomic(path: &Path, json: &Value) -> StorageResult<()> {
    let bytes = serde_json::to_vec_pretty(json)?;
    let temp_path = path.with_extension(TEMP_SUFFIX);
    fs::write(&temp_path, bytes)?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}

fn list_json_stems(root: &Path) -> Vec<String> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(root = %root.display(), "Cannot list storage root: {e}");
            return Vec::new();
        }
    };

    entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| path.extension().is_some_and(|ext| ext == FILE_EXTENSION))
        .filter_map(|path| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .collect()
}

/// Leftover `<key>.json.tmp` files under `root`.
fn list_temp_files(root: &Path) -> Vec<PathBuf> {
    let suffix = format!(".{TEMP_SUFFIX}");
    let Ok(entries) = fs::read_dir(root) else {
        return Vec::new();
    };

    entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .is_some_and(|name| name.to_string_lossy().ends_with(&suffix))
        })
        .collect()
}
