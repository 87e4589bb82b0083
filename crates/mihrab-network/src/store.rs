//! Durable key-value storage for the cached location.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use mihrab_types::MihrabError;
use tempfile::NamedTempFile;
use tracing::debug;

/// String-keyed, string-valued storage that survives restarts.
pub trait LocationStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, MihrabError>;
    fn set(&self, key: &str, value: &str) -> Result<(), MihrabError>;
    fn remove(&self, key: &str) -> Result<(), MihrabError>;
}

/// All entries in a single JSON object file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

/// `<user cache dir>/mihrab/storage.json`.
pub fn default_store_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("mihrab").join("storage.json"))
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at [`default_store_path`].
    ///
    /// # Errors
    /// `StorageError` when the platform has no user cache directory.
    pub fn open_default() -> Result<Self, MihrabError> {
        default_store_path()
            .map(Self::new)
            .ok_or_else(|| MihrabError::StorageError("no user cache directory".into()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, MihrabError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(MihrabError::StorageError(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };
        serde_json::from_str(&text).map_err(|e| {
            MihrabError::StorageError(format!("Corrupt store {}: {}", self.path.display(), e))
        })
    }

    /// Replaces the file atomically: a sibling temp file is written, then renamed over it.
    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), MihrabError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)
            .map_err(|e| MihrabError::StorageError(format!("Failed to create {}: {}", dir.display(), e)))?;

        let text = serde_json::to_string_pretty(entries)
            .map_err(|e| MihrabError::StorageError(e.to_string()))?;
        let write_err =
            |e: std::io::Error| MihrabError::StorageError(format!("Failed to write {}: {}", self.path.display(), e));

        let mut staged = NamedTempFile::new_in(dir).map_err(write_err)?;
        staged.write_all(text.as_bytes()).map_err(write_err)?;
        staged.as_file().sync_all().map_err(write_err)?;
        staged.persist(&self.path).map_err(|e| write_err(e.error))?;

        debug!(path = %self.path.display(), entries = entries.len(), "store written");
        Ok(())
    }
}

impl LocationStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, MihrabError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), MihrabError> {
        // a corrupt file is replaced rather than blocking the write
        let mut entries = self.read_all().unwrap_or_default();
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), MihrabError> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// Process-local store for tests and embedders without a disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, MihrabError> {
        self.entries
            .lock()
            .map_err(|_| MihrabError::StorageError("memory store poisoned".into()))
    }
}

impl LocationStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, MihrabError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), MihrabError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), MihrabError> {
        self.lock()?.remove(key);
        Ok(())
    }
}
