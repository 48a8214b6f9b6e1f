use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Persistent local store.
    pub local: LocalSection,
    /// Default attributes for cookie writes.
    pub cookie: CookieSection,
    /// Logging and tracing.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// LocalSection
// ---------------------------------------------------------------------------

/// Where local state lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalSection {
    /// Backing file. Empty selects `~/.keystate/local.json`.
    pub path: String,
    /// Key namespace. Empty leaves keys unscoped.
    pub namespace: String,
}

impl LocalSection {
    /// The configured path, if one is set.
    #[must_use]
    pub fn explicit_path(&self) -> Option<PathBuf> {
        (!self.path.is_empty()).then(|| PathBuf::from(&self.path))
    }

    /// The configured namespace, if one is set.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        (!self.namespace.is_empty()).then_some(self.namespace.as_str())
    }
}

// ---------------------------------------------------------------------------
// CookieSection
// ---------------------------------------------------------------------------

/// Attributes applied to every plain cookie write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieSection {
    /// `path` attribute.
    pub path: String,
    /// `domain` attribute. Empty omits it.
    pub domain: String,
    /// Write the `secure` flag.
    pub secure: bool,
    /// `SameSite` policy: `"strict"`, `"lax"` or `"none"`.
    pub same_site: String,
    /// Lifetime in days. `0` writes session cookies.
    pub expires_days: u32,
}

impl Default for CookieSection {
    fn default() -> Self {
        Self {
            path: "/".to_owned(),
            domain: String::new(),
            secure: false,
            same_site: "lax".to_owned(),
            expires_days: 365,
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"` (human-friendly), `"compact"` (one-line),
    /// `"json"` (structured), or `"full"` (verbose).
    pub format: String,
    /// Per-crate tracing directives (e.g. `["keystate_storage=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
