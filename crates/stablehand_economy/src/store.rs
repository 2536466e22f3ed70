//! # Persistence Store
//!
//! **Whole-record, crash-safe saves**
//!
//! The progression record lives under one fixed, versioned key in a generic
//! keyed string store. Every save writes the entire record; there are no
//! partial-field patches at this layer.
//!
//! ## Guarantees
//!
//! 1. **Atomicity**: a `FileStore` write goes to a temp file, is fsynced and
//!    renamed over the old value. A crash leaves either the old or the new
//!    record, never a mix.
//! 2. **Integrity**: each stored value carries a CRC32 and length. A torn or
//!    edited file is detected and reported as corrupt.
//! 3. **Recovery**: `ProgressionStore::load` never fails. Absent means first
//!    launch; corrupt means log and start from defaults.
//!
//! ## File Format
//!
//! ```text
//! SHKV <version> <crc32 as 8 hex digits> <payload length>\n
//! <payload (UTF-8 JSON)>
//! ```

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{EconomyError, EconomyResult};
use crate::record::ProgressionRecord;

/// Key the progression record is stored under.
pub const PROGRESSION_KEY: &str = "progression_v1";

/// Magic tag at the start of every stored value.
const STORE_MAGIC: &str = "SHKV";

/// Current framing version.
const STORE_VERSION: u32 = 1;

/// A durable keyed string store.
pub trait KeyValueStore: Send + Sync {
    /// Reads a value. `Ok(None)` if the key was never written.
    ///
    /// # Errors
    ///
    /// `Persistence` on I/O failure, `CorruptRecord` if the value fails its integrity check.
    fn get(&self, key: &str) -> EconomyResult<Option<String>>;

    /// Replaces the value under `key` as a single atomic write.
    ///
    /// # Errors
    ///
    /// `Persistence` if the value could not be made durable.
    fn set(&self, key: &str, value: &str) -> EconomyResult<()>;

    /// Removes the key. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// `Persistence` on I/O failure.
    fn remove(&self, key: &str) -> EconomyResult<()>;
}

// ============================================================================
// File-backed store
// ============================================================================

/// One file per key inside a directory.
pub struct FileStore {
    /// Directory holding the files.
    dir: PathBuf,
    /// Serializes writers so temp files are never shared.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Opens (creating if needed) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// `Persistence` if the directory cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> EconomyResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            EconomyError::Persistence(format!("failed to create {}: {e}", dir.display()))
        })?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Directory this store writes into.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    ///
    /// # Errors
    ///
    /// `Persistence` if the key contains characters unsafe in a file name.
    pub fn path_for(&self, key: &str) -> EconomyResult<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(EconomyError::Persistence(format!("invalid store key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.kv")))
    }

    fn encode(value: &str) -> String {
        let crc = crc32fast::hash(value.as_bytes());
        format!(
            "{STORE_MAGIC} {STORE_VERSION} {crc:08x} {}\n{value}",
            value.len()
        )
    }

    fn decode(raw: &str) -> EconomyResult<String> {
        let (header, payload) = raw
            .split_once('\n')
            .ok_or_else(|| EconomyError::CorruptRecord("missing header".to_string()))?;

        let mut fields = header.split(' ');
        if fields.next() != Some(STORE_MAGIC) {
            return Err(EconomyError::CorruptRecord("invalid magic".to_string()));
        }
        let version: u32 = parse_field(fields.next(), "version")?;
        if version != STORE_VERSION {
            return Err(EconomyError::CorruptRecord(format!(
                "unsupported store version: {version}"
            )));
        }
        let crc_hex = fields
            .next()
            .ok_or_else(|| EconomyError::CorruptRecord("missing checksum".to_string()))?;
        let stored_crc = u32::from_str_radix(crc_hex, 16)
            .map_err(|e| EconomyError::CorruptRecord(format!("bad checksum field: {e}")))?;
        let len: usize = parse_field(fields.next(), "length")?;

        if payload.len() != len {
            return Err(EconomyError::CorruptRecord(format!(
                "length mismatch: header says {len}, found {}",
                payload.len()
            )));
        }
        let computed_crc = crc32fast::hash(payload.as_bytes());
        if stored_crc != computed_crc {
            return Err(EconomyError::CorruptRecord("CRC mismatch".to_string()));
        }
        Ok(payload.to_string())
    }

    /// Writes `encoded` to `tmp_path`, syncs it and renames it over `path`.
    fn write_replacing(tmp_path: &Path, path: &Path, encoded: &str) -> EconomyResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(tmp_path)
            .map_err(|e| EconomyError::Persistence(format!("failed to open temp file: {e}")))?;
        file.write_all(encoded.as_bytes())
            .map_err(|e| EconomyError::Persistence(format!("write failed: {e}")))?;
        file.sync_all()
            .map_err(|e| EconomyError::Persistence(format!("sync failed: {e}")))?;
        drop(file);

        fs::rename(tmp_path, path).map_err(|e| {
            EconomyError::Persistence(format!("failed to replace {}: {e}", path.display()))
        })
    }

    /// Flushes the directory entry after a rename. Not every platform
    /// allows opening a directory, so failure here is only logged.
    fn sync_dir(&self) {
        if let Err(e) = File::open(&self.dir).and_then(|d| d.sync_all()) {
            tracing::debug!(dir = %self.dir.display(), error = %e, "directory sync skipped");
        }
    }
}

fn parse_field<T: std::str::FromStr>(field: Option<&str>, name: &str) -> EconomyResult<T>
where
    T::Err: std::fmt::Display,
{
    field
        .ok_or_else(|| EconomyError::CorruptRecord(format!("missing {name}")))?
        .parse()
        .map_err(|e| EconomyError::CorruptRecord(format!("bad {name} field: {e}")))
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> EconomyResult<Option<String>> {
        let path = self.path_for(key)?;
        let raw = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(EconomyError::Persistence(format!(
                    "failed to read {}: {e}",
                    path.display()
                )))
            }
        };
        let raw = String::from_utf8(raw)
            .map_err(|e| EconomyError::CorruptRecord(format!("not UTF-8: {e}")))?;
        Self::decode(&raw).map(Some)
    }

    fn set(&self, key: &str, value: &str) -> EconomyResult<()> {
        let path = self.path_for(key)?;
        let tmp_path = self.dir.join(format!(".{key}.tmp"));
        let encoded = Self::encode(value);

        let _guard = self.write_lock.lock();

        if let Err(e) = Self::write_replacing(&tmp_path, &path, &encoded) {
            fs::remove_file(&tmp_path).ok();
            return Err(e);
        }
        self.sync_dir();
        Ok(())
    }

    fn remove(&self, key: &str) -> EconomyResult<()> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock();
        match fs::remove_file(&path) {
            Ok(()) => {
                self.sync_dir();
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EconomyError::Persistence(format!(
                "failed to remove {}: {e}",
                path.display()
            ))),
        }
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Process-local store. Used by tests and by sessions that should not touch disk.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    /// Number of upcoming `set` calls that will fail.
    failing_writes: AtomicU32,
    /// Successful `set` calls so far.
    writes: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` writes fail with `Persistence`.
    pub fn fail_next_writes(&self, count: u32) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Number of successful writes.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Raw stored value.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> EconomyResult<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> EconomyResult<()> {
        let should_fail = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(EconomyError::Persistence(format!(
                "injected write failure for {key}"
            )));
        }
        self.values.lock().insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, key: &str) -> EconomyResult<()> {
        self.values.lock().remove(key);
        Ok(())
    }
}

// ============================================================================
// Progression record store
// ============================================================================

/// Where a loaded record came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordSource {
    /// Decoded from the store.
    Stored,
    /// Key absent; first launch defaults.
    Fresh,
    /// Key present but unreadable; defaults substituted.
    Recovered,
}

/// Typed access to the progression record in a [`KeyValueStore`].
#[derive(Clone)]
pub struct ProgressionStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
    total_stalls: usize,
}

impl ProgressionStore {
    /// Wraps a store. `total_stalls` sizes the default record.
    pub fn new(store: Arc<dyn KeyValueStore>, total_stalls: usize) -> Self {
        Self {
            store,
            key: PROGRESSION_KEY.to_string(),
            total_stalls,
        }
    }

    /// Key the record is stored under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// First-launch record for this store's stall count.
    #[must_use]
    pub fn default_record(&self) -> ProgressionRecord {
        ProgressionRecord::new(self.total_stalls)
    }

    /// Loads the record, falling back to defaults. Never fails.
    #[must_use]
    pub fn load(&self) -> ProgressionRecord {
        self.load_with_source().0
    }

    /// Loads the record and reports where it came from.
    #[must_use]
    pub fn load_with_source(&self) -> (ProgressionRecord, RecordSource) {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::info!(key = %self.key, "no saved progression, starting fresh");
                return (self.default_record(), RecordSource::Fresh);
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "saved progression unreadable, using defaults");
                return (self.default_record(), RecordSource::Recovered);
            }
        };

        match serde_json::from_str::<ProgressionRecord>(&raw) {
            Ok(record) => (record, RecordSource::Stored),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "saved progression unparsable, using defaults");
                (self.default_record(), RecordSource::Recovered)
            }
        }
    }

    /// Writes the entire record.
    ///
    /// # Errors
    ///
    /// `Persistence` if encoding or the store write fails.
    pub fn save(&self, record: &ProgressionRecord) -> EconomyResult<()> {
        let json = serde_json::to_string(record)
            .map_err(|e| EconomyError::Persistence(format!("failed to encode record: {e}")))?;
        self.store.set(&self.key, &json)
    }

    /// Deletes the saved record.
    ///
    /// # Errors
    ///
    /// `Persistence` on store failure.
    pub fn clear(&self) -> EconomyResult<()> {
        self.store.remove(&self.key)
    }
}
