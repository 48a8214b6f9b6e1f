//! The state façade.

use std::path::PathBuf;
use std::sync::Arc;

use keystate_core::{GetOptions, ProviderKind, StateError, StateResult, StateValue, codec};
use keystate_events::{EventRegistry, ListenerId, StateEvent};
use keystate_storage::{
    CookieBackend, CookieDocument, CookieOptions, FileBackend, MemoryBackend, MemoryCookieJar,
    StorageBackend, StorageError,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

/// Process-lifetime state.
pub type MemoryState = State<MemoryBackend>;
/// Session-lifetime state.
pub type SessionState = State<MemoryBackend>;
/// Persistent local state, scoped or unscoped.
pub type LocalState = State<Arc<dyn StorageBackend>>;
/// Cookie state over a cookie document.
pub type CookieState<D = Arc<MemoryCookieJar>> = State<CookieBackend<D>>;

fn storage_err(e: StorageError) -> StateError {
    StateError::Storage(e.to_string())
}

/// Key-value state over one backend.
///
/// Reads go through the value codec (fallback, cast, strict). Every `set`,
/// `remove` and `clear` notifies this façade's own listeners, keyed by the
/// state key. Clones share the backend and the listeners.
pub struct State<B> {
    backend: Arc<B>,
    provider: ProviderKind,
    events: Arc<EventRegistry>,
}

impl<B> Clone for State<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            provider: self.provider.clone(),
            events: Arc::clone(&self.events),
        }
    }
}

impl<B> std::fmt::Debug for State<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("provider", &self.provider)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl State<MemoryBackend> {
    /// Empty in-memory state.
    #[must_use]
    pub fn memory() -> Self {
        Self::with_backend(MemoryBackend::new(), ProviderKind::Memory)
    }

    /// Empty session state.
    #[must_use]
    pub fn session() -> Self {
        Self::with_backend(MemoryBackend::new(), ProviderKind::Session)
    }
}

impl State<FileBackend> {
    /// Local state persisted at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Storage`] if an existing file cannot be read.
    pub fn local(path: impl Into<PathBuf>) -> StateResult<Self> {
        let backend = FileBackend::open(path).map_err(storage_err)?;
        Ok(Self::with_backend(backend, ProviderKind::Local))
    }
}

impl<D: CookieDocument> State<CookieBackend<D>> {
    /// Cookie state over `document`. `defaults` apply to every plain `set`.
    pub fn cookie(document: D, defaults: CookieOptions) -> Self {
        Self::with_backend(CookieBackend::new(document, defaults), ProviderKind::Cookie)
    }

    /// Write a cookie with explicit attributes, then notify listeners.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Storage`] if the expiry is out of range.
    pub fn set_with(
        &self,
        key: &str,
        value: impl Into<StateValue>,
        options: &CookieOptions,
    ) -> StateResult<()> {
        let value = value.into();
        self.backend
            .set_with(key, &codec::encode(&value), options)
            .map_err(storage_err)?;
        self.notify(key, Some(value));
        Ok(())
    }

    /// Every cookie in the document, decoded.
    pub fn cookies(&self) -> Vec<(String, String)> {
        self.backend.entries()
    }

    /// The cookie document.
    pub fn document(&self) -> &D {
        self.backend.document()
    }
}

impl<B: StorageBackend> State<B> {
    /// State over any backend, with a fresh listener registry.
    pub fn with_backend(backend: B, provider: ProviderKind) -> Self {
        Self {
            backend: Arc::new(backend),
            provider,
            events: Arc::new(EventRegistry::new()),
        }
    }

    /// The storage this façade reads and writes.
    pub fn provider(&self) -> &ProviderKind {
        &self.provider
    }

    /// The backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Read `key`.
    ///
    /// `Ok(None)` means unset. See [`codec::decode`] for how `options`
    /// shape the result.
    ///
    /// # Errors
    ///
    /// With [`GetOptions::strict`], [`StateError::NotFound`] for a missing
    /// key without fallback and [`StateError::InvalidCast`] for a value that
    /// does not cast. [`StateError::Storage`] if the backend fails.
    pub fn get(&self, key: &str, options: GetOptions) -> StateResult<Option<StateValue>> {
        let raw = self.backend.get_item(key).map_err(storage_err)?;
        trace!(key, provider = %self.provider, present = raw.is_some(), "state read");
        codec::decode(key, raw.as_deref(), &options, &self.provider)
    }

    /// Read `key`, falling back to `fallback` (whose type also picks the cast).
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Storage`] if the backend fails.
    pub fn get_or(&self, key: &str, fallback: impl Into<StateValue>) -> StateResult<StateValue> {
        let fallback = fallback.into();
        let value = self.get(key, GetOptions::new().fallback(fallback.clone()))?;
        Ok(value.unwrap_or(fallback))
    }

    /// Read `key` and deserialize it into `T`.
    ///
    /// Stored text that is not JSON is offered to `T` as a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Serialization`] if the value does not fit `T`.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> StateResult<Option<T>> {
        let Some(raw) = self.backend.get_item(key).map_err(storage_err)? else {
            return Ok(None);
        };
        let parsed = serde_json::from_str::<serde_json::Value>(&raw)
            .unwrap_or(serde_json::Value::String(raw));
        Ok(Some(serde_json::from_value(parsed)?))
    }

    /// Store `value` under `key`, then notify the key's listeners with it.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Storage`] if the backend fails. Listeners are
    /// not notified in that case.
    pub fn set(&self, key: &str, value: impl Into<StateValue>) -> StateResult<()> {
        let value = value.into();
        self.backend
            .set_item(key, &codec::encode(&value))
            .map_err(storage_err)?;
        debug!(key, provider = %self.provider, kind = %value.kind(), "state set");
        self.notify(key, Some(value));
        Ok(())
    }

    /// Serialize `value` and store it under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Serialization`] if `value` does not serialize,
    /// or [`StateError::Storage`] if the backend fails.
    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StateResult<()> {
        self.set(key, StateValue::from_serialize(value)?)
    }

    /// Delete `key`, then notify its listeners with no value.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Storage`] if the backend fails.
    pub fn remove(&self, key: &str) -> StateResult<()> {
        self.backend.remove_item(key).map_err(storage_err)?;
        debug!(key, provider = %self.provider, "state removed");
        self.notify(key, None);
        Ok(())
    }

    /// Delete every key, then notify each key's listeners with no value.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Storage`] if the backend fails.
    pub fn clear(&self) -> StateResult<()> {
        let keys = self.backend.keys().map_err(storage_err)?;
        self.backend.clear().map_err(storage_err)?;
        debug!(provider = %self.provider, cleared = keys.len(), "state cleared");
        for key in &keys {
            self.notify(key, None);
        }
        Ok(())
    }

    /// Whether `key` has a stored entry.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Storage`] if the backend fails.
    pub fn has(&self, key: &str) -> StateResult<bool> {
        self.backend.has(key).map_err(storage_err)
    }

    /// All stored keys.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Storage`] if the backend fails.
    pub fn keys(&self) -> StateResult<Vec<String>> {
        self.backend.keys().map_err(storage_err)
    }

    fn notify(&self, key: &str, value: Option<StateValue>) {
        let event = match value {
            Some(value) => StateEvent::set(key, value, self.provider.clone()),
            None => StateEvent::removed(key, self.provider.clone()),
        };
        self.events.emit(key, &event);
    }

    // -- Listeners --

    /// Listen for every change of `key`.
    pub fn on<F>(&self, key: impl Into<String>, callback: F) -> ListenerId
    where
        F: Fn(&StateEvent) + Send + Sync + 'static,
    {
        self.events.on(key, callback)
    }

    /// Listen for the next change of `key` only.
    pub fn once<F>(&self, key: impl Into<String>, callback: F) -> ListenerId
    where
        F: Fn(&StateEvent) + Send + Sync + 'static,
    {
        self.events.once(key, callback)
    }

    /// Remove one listener. Returns `true` if it was registered.
    pub fn off(&self, key: &str, id: ListenerId) -> bool {
        self.events.off(key, id)
    }

    /// Remove every listener of `key`.
    pub fn remove_listener(&self, key: &str) {
        self.events.remove_listener(key);
    }

    /// Remove every listener of every key.
    pub fn remove_all_listeners(&self) {
        self.events.remove_all_listeners();
    }

    /// Number of listeners for `key`.
    pub fn listener_count(&self, key: &str) -> usize {
        self.events.listener_count(key)
    }

    /// Keys with at least one listener, sorted.
    pub fn event_names(&self) -> Vec<String> {
        self.events.event_names()
    }

    /// This façade's listener registry.
    pub fn events(&self) -> &Arc<EventRegistry> {
        &self.events
    }
}
