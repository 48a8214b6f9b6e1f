//! Change event payload.

use keystate_core::{ProviderKind, StateValue};

/// Payload delivered to listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct StateEvent {
    /// The key that changed.
    pub key: String,
    /// The value that was written, or `None` after a remove or clear.
    pub value: Option<StateValue>,
    /// The storage the change happened in.
    pub provider: ProviderKind,
}

impl StateEvent {
    /// Event for a write. Carries the typed value as given to `set`.
    #[must_use]
    pub fn set(key: impl Into<String>, value: StateValue, provider: ProviderKind) -> Self {
        Self {
            key: key.into(),
            value: Some(value),
            provider,
        }
    }

    /// Event for a remove or clear.
    #[must_use]
    pub fn removed(key: impl Into<String>, provider: ProviderKind) -> Self {
        Self {
            key: key.into(),
            value: None,
            provider,
        }
    }

    /// Whether the key no longer holds a value.
    #[must_use]
    pub fn is_removal(&self) -> bool {
        self.value.is_none()
    }
}
