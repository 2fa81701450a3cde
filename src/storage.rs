// Durable Storage
//
// *Le Stockage* (The Storage) - Named key/value partitions that survive process restarts

use crate::errors::{LeRecoError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key/value storage for small persisted records.
///
/// Implementations are injected explicitly; nothing in the crate reaches for a
/// process-wide instance.
pub trait DurableStorage: Send + Sync {
    /// Read the raw value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`; deleting a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(LeRecoError::validation_error(format!(
            "Invalid storage key: {:?}",
            key
        )))
    }
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the records
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(format!("{}.json", key)))
    }
}

impl DurableStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }

        fs::read_to_string(&path).map(Some).map_err(|e| {
            LeRecoError::storage_error(format!("Failed to read {}: {}", key, e), Some(path))
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root).map_err(|e| {
            LeRecoError::storage_error(
                format!("Failed to create storage directory: {}", e),
                Some(self.root.clone()),
            )
        })?;

        // Write-then-rename; readers never observe a partial record
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|e| {
            LeRecoError::storage_error(format!("Failed to write {}: {}", key, e), Some(tmp.clone()))
        })?;
        fs::rename(&tmp, &path).map_err(|e| {
            LeRecoError::storage_error(format!("Failed to commit {}: {}", key, e), Some(path))
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LeRecoError::storage_error(
                format!("Failed to remove {}: {}", key, e),
                Some(path),
            )),
        }
    }
}

/// In-process storage, lost on exit
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create empty storage
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| LeRecoError::storage_error("Memory storage lock poisoned", None))
    }
}

impl DurableStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.lock()?.remove(key);
        Ok(())
    }
}
