//! Identity of the storage a façade is bound to.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which storage a façade reads and writes.
///
/// Carried in every emitted event and in strict-mode errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Process-lifetime map.
    Memory,
    /// Session-lifetime map.
    Session,
    /// Persistent local store.
    Local,
    /// Cookie document.
    Cookie,
    /// A caller-supplied backend.
    Custom(String),
}

impl ProviderKind {
    /// Short lowercase name, e.g. `"local"`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Memory => "memory",
            Self::Session => "session",
            Self::Local => "local",
            Self::Cookie => "cookie",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
