//! The backend contract shared by every store.

use std::sync::Arc;

use crate::error::StorageResult;

/// String key-value storage.
///
/// Values are stored as their encoded text. Backends are interchangeable:
/// a façade only ever talks to this trait.
pub trait StorageBackend: Send + Sync {
    /// Get the raw value for `key`. `None` if the key does not exist.
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, overwriting any existing value.
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete `key`. Deleting a missing key is not an error.
    fn remove_item(&self, key: &str) -> StorageResult<()>;

    /// Delete every key this backend can see.
    fn clear(&self) -> StorageResult<()>;

    /// All keys this backend can see.
    fn keys(&self) -> StorageResult<Vec<String>>;

    /// Whether `key` exists.
    fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get_item(key)?.is_some())
    }
}

impl<B: StorageBackend + ?Sized> StorageBackend for Arc<B> {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        (**self).remove_item(key)
    }

    fn clear(&self) -> StorageResult<()> {
        (**self).clear()
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        (**self).keys()
    }

    fn has(&self, key: &str) -> StorageResult<bool> {
        (**self).has(key)
    }
}
