//! Namespace-scoped view over another backend.

use tracing::debug;

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};

const SEPARATOR: char = ':';

/// Validate that a namespace is safe for use as a key prefix.
///
/// Namespaces must be non-empty and must not contain `:` (the
/// namespace/key separator).
pub fn validate_namespace(namespace: &str) -> StorageResult<()> {
    if namespace.is_empty() {
        return Err(StorageError::InvalidKey(
            "namespace must not be empty".into(),
        ));
    }
    if namespace.contains(SEPARATOR) {
        return Err(StorageError::InvalidKey(format!(
            "namespace must not contain '{SEPARATOR}'"
        )));
    }
    Ok(())
}

fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("key must not be empty".into()));
    }
    Ok(())
}

/// A backend view where every key is stored as `"{namespace}:{key}"`.
///
/// `keys` and `clear` only see entries inside the namespace, so several
/// scopes can share one underlying store.
#[derive(Debug, Clone)]
pub struct ScopedBackend<B> {
    inner: B,
    namespace: String,
    prefix: String,
}

impl<B: StorageBackend> ScopedBackend<B> {
    /// Create a scoped view into `inner` for `namespace`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] if the namespace is empty
    /// or contains `:`.
    pub fn new(inner: B, namespace: impl Into<String>) -> StorageResult<Self> {
        let namespace = namespace.into();
        validate_namespace(&namespace)?;
        let prefix = format!("{namespace}{SEPARATOR}");
        Ok(Self {
            inner,
            namespace,
            prefix,
        })
    }

    /// The namespace this view is scoped to.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The unscoped backend.
    #[must_use]
    pub fn inner(&self) -> &B {
        &self.inner
    }

    fn full_key(&self, key: &str) -> StorageResult<String> {
        validate_key(key)?;
        Ok(format!("{}{key}", self.prefix))
    }
}

impl<B: StorageBackend> StorageBackend for ScopedBackend<B> {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.get_item(&self.full_key(key)?)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.inner.set_item(&self.full_key(key)?, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.inner.remove_item(&self.full_key(key)?)
    }

    fn clear(&self) -> StorageResult<()> {
        let keys = self.inner.keys()?;
        let mut cleared: usize = 0;
        for key in keys.iter().filter(|k| k.starts_with(&self.prefix)) {
            self.inner.remove_item(key)?;
            cleared = cleared.saturating_add(1);
        }
        debug!(namespace = %self.namespace, cleared, "scope cleared");
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self
            .inner
            .keys()?
            .iter()
            .filter_map(|k| k.strip_prefix(&self.prefix).map(String::from))
            .collect())
    }

    fn has(&self, key: &str) -> StorageResult<bool> {
        self.inner.has(&self.full_key(key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use std::sync::Arc;

    #[test]
    fn test_validate_namespace_rejects_empty() {
        assert!(validate_namespace("").is_err());
    }

    #[test]
    fn test_validate_namespace_rejects_separator() {
        assert!(validate_namespace("app:bad").is_err());
        assert!(validate_namespace("app").is_ok());
    }

    #[test]
    fn test_scoped_get_set() {
        let store = Arc::new(MemoryBackend::new());
        let scoped = ScopedBackend::new(Arc::clone(&store), "app").unwrap();

        scoped.set_item("greeting", "hello").unwrap();
        assert_eq!(
            scoped.get_item("greeting").unwrap().as_deref(),
            Some("hello")
        );
        assert_eq!(
            store.get_item("app:greeting").unwrap().as_deref(),
            Some("hello")
        );
    }

    #[test]
    fn test_scoped_isolation() {
        let store = Arc::new(MemoryBackend::new());
        let a = ScopedBackend::new(Arc::clone(&store), "a").unwrap();
        let b = ScopedBackend::new(Arc::clone(&store), "b").unwrap();

        a.set_item("key", "a-value").unwrap();
        b.set_item("key", "b-value").unwrap();

        assert_eq!(a.get_item("key").unwrap().as_deref(), Some("a-value"));
        assert_eq!(b.get_item("key").unwrap().as_deref(), Some("b-value"));
    }

    #[test]
    fn test_scoped_remove_and_has() {
        let scoped = ScopedBackend::new(MemoryBackend::new(), "ns").unwrap();
        assert!(!scoped.has("k").unwrap());
        scoped.set_item("k", "v").unwrap();
        assert!(scoped.has("k").unwrap());
        scoped.remove_item("k").unwrap();
        assert!(!scoped.has("k").unwrap());
    }

    #[test]
    fn test_scoped_keys_and_clear_stay_in_namespace() {
        let store = Arc::new(MemoryBackend::new());
        store.set_item("outside", "x").unwrap();
        let scoped = ScopedBackend::new(Arc::clone(&store), "ns").unwrap();

        scoped.set_item("b", "2").unwrap();
        scoped.set_item("a", "1").unwrap();
        assert_eq!(scoped.keys().unwrap(), vec!["a", "b"]);

        scoped.clear().unwrap();
        assert!(scoped.keys().unwrap().is_empty());
        assert_eq!(store.keys().unwrap(), vec!["outside"]);
    }

    #[test]
    fn test_scoped_rejects_empty_key() {
        let scoped = ScopedBackend::new(MemoryBackend::new(), "ns").unwrap();
        assert!(matches!(
            scoped.get_item(""),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_scoped_rejects_empty_namespace() {
        assert!(ScopedBackend::new(MemoryBackend::new(), "").is_err());
    }
}
