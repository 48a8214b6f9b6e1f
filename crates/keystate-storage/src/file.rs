//! Persistent file-backed store.
//!
//! The whole store is one JSON object (`{"key": "raw value", ...}`). The file
//! is the only copy: reads go to disk, and every mutation re-reads the file,
//! applies the change and writes a sibling staging file that is renamed over
//! the original, so a crash never leaves a half-written store behind and
//! several handles on one path see each other's writes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, trace};

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};

type Entries = BTreeMap<String, String>;

/// Local storage persisted to a JSON file.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    /// Serializes read-modify-write cycles made through this handle.
    write_lock: Mutex<()>,
}

impl FileBackend {
    /// Open the store at `path`.
    ///
    /// A missing file is an empty store; it is created on the first write
    /// along with any missing parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the file exists but cannot be read, or
    /// [`StorageError::Serialization`] if it is not a JSON object of strings.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let entries = load(&path)?;
        debug!(path = %path.display(), entries = entries.len(), "opened local store");
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|e| StorageError::Internal(e.to_string()))
    }

    fn persist(&self, data: &Entries) -> StorageResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        let content = serde_json::to_string_pretty(data)?;
        std::fs::write(&staging, content)?;
        if let Err(e) = std::fs::rename(&staging, &self.path) {
            let _ = std::fs::remove_file(&staging);
            return Err(e.into());
        }
        trace!(path = %self.path.display(), entries = data.len(), "local store written");
        Ok(())
    }
}

/// Read the store from disk. Missing or blank files are empty.
fn load(path: &Path) -> StorageResult<Entries> {
    match std::fs::read_to_string(path) {
        Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(e.into()),
    }
}

impl StorageBackend for FileBackend {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(load(&self.path)?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let _guard = self.lock()?;
        let mut data = load(&self.path)?;
        data.insert(key.to_owned(), value.to_owned());
        self.persist(&data)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let _guard = self.lock()?;
        let mut data = load(&self.path)?;
        if data.remove(key).is_none() {
            return Ok(());
        }
        self.persist(&data)
    }

    fn clear(&self) -> StorageResult<()> {
        let _guard = self.lock()?;
        if load(&self.path)?.is_empty() {
            return Ok(());
        }
        self.persist(&BTreeMap::new())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(load(&self.path)?.into_keys().collect())
    }

    fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(load(&self.path)?.contains_key(key))
    }
}
