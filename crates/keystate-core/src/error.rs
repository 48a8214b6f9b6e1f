//! State error types.

use crate::cast::Cast;
use crate::provider::ProviderKind;

/// Errors surfaced by a state façade.
///
/// `NotFound` and `InvalidCast` are only produced for strict reads. A
/// non-strict read degrades to the fallback or to an unset value instead.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// A strict read found no entry for the key.
    #[error("key \"{key}\" does not exist in the {provider} storage")]
    NotFound {
        /// The key that was looked up.
        key: String,
        /// The storage the key was looked up in.
        provider: ProviderKind,
    },

    /// A strict read could not coerce the stored value to the requested type.
    #[error("cannot cast value for key \"{key}\" in {provider} storage to type \"{cast}\". Value: {value}")]
    InvalidCast {
        /// The key whose value failed to cast.
        key: String,
        /// The storage holding the value.
        provider: ProviderKind,
        /// The raw stored string.
        value: String,
        /// The requested type.
        cast: Cast,
    },

    /// A typed value could not be converted to or from JSON.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backing storage reported a failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl StateError {
    /// Whether this is the strict-mode missing-key condition.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this is the strict-mode cast failure.
    #[must_use]
    pub fn is_invalid_cast(&self) -> bool {
        matches!(self, Self::InvalidCast { .. })
    }
}

impl From<serde_json::Error> for StateError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type for state operations.
pub type StateResult<T> = Result<T, StateError>;
