//! Listener registry.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::event::StateEvent;

/// Callback invoked with each matching event.
pub type Listener = Arc<dyn Fn(&StateEvent) + Send + Sync>;

/// Handle returned by [`EventRegistry::on`] / [`EventRegistry::once`].
///
/// Closures cannot be compared, so removal goes through this handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

struct Registration {
    id: ListenerId,
    callback: Listener,
}

#[derive(Default)]
struct Table {
    persistent: BTreeMap<String, Vec<Registration>>,
    once: BTreeMap<String, Vec<Registration>>,
}

impl Table {
    fn detach(map: &mut BTreeMap<String, Vec<Registration>>, event: &str, id: ListenerId) -> bool {
        let Some(list) = map.get_mut(event) else {
            return false;
        };
        let before = list.len();
        list.retain(|r| r.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            map.remove(event);
        }
        removed
    }
}

/// Listener table for one façade.
///
/// Listeners are keyed by event name and fire in registration order:
/// persistent listeners first, then single-fire ones. No lock is held while
/// a listener runs, so a listener may write to the façade, register or
/// remove listeners, or emit again.
#[derive(Default)]
pub struct EventRegistry {
    table: RwLock<Table>,
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.read();
        f.debug_struct("EventRegistry")
            .field("persistent_events", &table.persistent.len())
            .field("once_events", &table.once.len())
            .finish()
    }
}

impl EventRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // Callbacks never run under the lock, so a poisoned lock still guards a
    // consistent table.
    fn read(&self) -> RwLockReadGuard<'_, Table> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Table> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a listener that fires on every emission of `event`.
    pub fn on<F>(&self, event: impl Into<String>, callback: F) -> ListenerId
    where
        F: Fn(&StateEvent) + Send + Sync + 'static,
    {
        let event = event.into();
        let id = ListenerId::new();
        trace!(event = %event, "listener registered");
        self.write()
            .persistent
            .entry(event)
            .or_default()
            .push(Registration {
                id,
                callback: Arc::new(callback),
            });
        id
    }

    /// Register a listener that fires on the next emission of `event` only.
    pub fn once<F>(&self, event: impl Into<String>, callback: F) -> ListenerId
    where
        F: Fn(&StateEvent) + Send + Sync + 'static,
    {
        let event = event.into();
        let id = ListenerId::new();
        trace!(event = %event, "single-fire listener registered");
        self.write().once.entry(event).or_default().push(Registration {
            id,
            callback: Arc::new(callback),
        });
        id
    }

    /// Remove one listener. Returns `true` if it was registered.
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        let mut table = self.write();
        let persistent = Table::detach(&mut table.persistent, event, id);
        let once = Table::detach(&mut table.once, event, id);
        persistent || once
    }

    /// Remove every listener registered for `event`.
    pub fn remove_listener(&self, event: &str) {
        let mut table = self.write();
        table.persistent.remove(event);
        table.once.remove(event);
    }

    /// Remove every listener of every event.
    pub fn remove_all_listeners(&self) {
        let mut table = self.write();
        table.persistent.clear();
        table.once.clear();
        debug!("all listeners removed");
    }

    /// Number of listeners (persistent and single-fire) for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        let table = self.read();
        let persistent = table.persistent.get(event).map_or(0, Vec::len);
        let once = table.once.get(event).map_or(0, Vec::len);
        persistent.saturating_add(once)
    }

    /// Names of all events with at least one listener, sorted.
    #[must_use]
    pub fn event_names(&self) -> Vec<String> {
        let table = self.read();
        table
            .persistent
            .keys()
            .chain(table.once.keys())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Whether no listeners are registered at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let table = self.read();
        table.persistent.is_empty() && table.once.is_empty()
    }

    /// Deliver `payload` to the listeners of `event`.
    ///
    /// Single-fire listeners for `event` are taken out of the table before
    /// any listener runs, so a re-entrant emission cannot fire them twice.
    /// A panicking listener is logged and skipped.
    ///
    /// Returns the number of listeners invoked.
    pub fn emit(&self, event: &str, payload: &StateEvent) -> usize {
        let (persistent, once) = {
            let mut table = self.write();
            let persistent: Vec<Listener> = table
                .persistent
                .get(event)
                .map(|list| list.iter().map(|r| Arc::clone(&r.callback)).collect())
                .unwrap_or_default();
            let once = table.once.remove(event).unwrap_or_default();
            (persistent, once)
        };

        if persistent.is_empty() && once.is_empty() {
            trace!(event, "no listeners for event");
            return 0;
        }

        let listeners = persistent
            .iter()
            .chain(once.iter().map(|r| &r.callback));

        let mut invoked: usize = 0;
        for listener in listeners {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener(payload);
            }));
            if let Err(e) = result {
                warn!(event, error = ?e, "listener panicked");
            }
            invoked = invoked.saturating_add(1);
        }

        trace!(event, invoked, "event emitted");
        invoked
    }
}
