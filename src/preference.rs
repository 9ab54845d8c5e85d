//! Persisted key/value preferences.

use std::collections::BTreeMap;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::{
    Mutex,
    MutexGuard,
    PoisonError,
};

use thiserror::Error;

/// Why a preference could not be read or written.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backing file cannot be accessed.
    #[error("Preference storage unavailable: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not a JSON object of strings.
    #[error("Preference file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Opaque string key/value storage that survives sessions.
pub trait PreferenceStore: Send + Sync {
    /// Value stored under `key`.
    ///
    /// # Errors
    /// The storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// The storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Session-only storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Stored entries.
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with one entry.
    #[must_use]
    pub fn with(key: &str, value: &str) -> Self {
        let store = Self::new();
        store.values_mut().insert(key.to_string(), value.to_string());
        store
    }

    /// Locked entries; a poisoned lock still yields the data.
    fn values_mut(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values_mut().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Stores all preferences as one JSON object in a file.
///
/// A missing file reads as empty. Every `set` replaces the file through a
/// sibling temporary file, so readers never see a partial write. A corrupt
/// file fails reads until the next `set` overwrites it.
#[derive(Debug)]
pub struct FileStore {
    /// Backing JSON file.
    path: PathBuf,
    /// Serializes read-modify-write cycles within the process.
    lock: Mutex<()>,
}

impl FileStore {
    /// Store backed by `path`. Nothing is touched until first use.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored entry.
    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(error) => Err(error.into()),
        }
    }

    /// Replaces the file with `values`.
    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(values)?;
        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, content)?;
        if let Err(error) = std::fs::rename(&temp_path, &self.path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(error.into());
        }
        Ok(())
    }
}

impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = match self.read_all() {
            Ok(values) => values,
            Err(StorageError::Corrupt(error)) => {
                tracing::warn!(path = %self.path.display(), "Discarding corrupt preference file: {}", error);
                BTreeMap::new()
            }
            Err(error) => return Err(error),
        };
        values.insert(key.to_string(), value.to_string());

        self.write_all(&values)?;
        tracing::debug!(key, path = %self.path.display(), "Preference saved");
        Ok(())
    }
}
