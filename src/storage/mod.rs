//! Durable key→text storage behind a narrow, swappable interface.
//!
//! Read and write failures are swallowed here: a missing or unreadable key
//! reads as absent, a failed write is logged and reported as `false`. The
//! in-memory store stays the source of truth for the session either way.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Utc;
use tracing::warn;

pub trait Storage: Send + Sync {
    /// Fetches the raw text stored under `key`, absent on any failure.
    fn read(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`. Returns whether the write landed; a
    /// failed write must never propagate into a store mutation.
    fn write(&self, key: &str, value: &str) -> bool;
}

/// Writes `value` under a timestamped sibling of `key`. Used to preserve
/// rejected or about-to-be-replaced payloads for forensic recovery.
pub fn backup(storage: &dyn Storage, key: &str, value: &str, tag: &str) {
    let backup_key = format!("{}__{}_{}", key, tag, Utc::now().timestamp_millis());
    storage.write(&backup_key, value);
}

/// One file per key under a base directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn write(&self, key: &str, value: &str) -> bool {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            warn!("failed to create storage dir {:?}: {}", self.dir, e);
            return false;
        }
        match fs::write(self.path_for(key), value) {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to write {} to storage: {}", key, e);
                false
            }
        }
    }
}

/// In-memory storage for tests.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().expect("storage lock").keys().cloned().collect()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.lock().expect("storage lock").get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) -> bool {
        self.entries
            .lock()
            .expect("storage lock")
            .insert(key.to_string(), value.to_string());
        true
    }
}
