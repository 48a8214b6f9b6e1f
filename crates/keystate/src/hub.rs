//! Startup wiring: one façade per storage, built from configuration.

use std::sync::Arc;

use keystate_config::{CookieSection, StateConfig};
use keystate_storage::{
    CookieOptions, FileBackend, MemoryCookieJar, ScopedBackend, StorageBackend, StorageError,
};
use tracing::info;

use crate::state::{CookieState, LocalState, MemoryState, SessionState, State};

/// Errors from building a [`StateHub`].
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The configuration could not be resolved.
    #[error(transparent)]
    Config(#[from] keystate_config::ConfigError),

    /// A backend could not be opened.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for hub construction.
pub type HubResult<T> = Result<T, HubError>;

/// The four façades of one process.
///
/// Each façade owns its listener registry, so a listener on `memory` never
/// hears writes to `local`.
#[derive(Debug, Clone)]
pub struct StateHub {
    /// Process-lifetime state.
    pub memory: MemoryState,
    /// Session-lifetime state.
    pub session: SessionState,
    /// Persistent local state.
    pub local: LocalState,
    /// Cookie state.
    pub cookie: CookieState,
}

impl StateHub {
    /// Build every façade from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`HubError`] if the local store path cannot be resolved or
    /// opened, or the namespace is invalid.
    pub fn from_config(config: &StateConfig) -> HubResult<Self> {
        let local = open_local(config)?;
        let cookie = State::cookie(
            Arc::new(MemoryCookieJar::new()),
            cookie_options(&config.cookie)?,
        );
        Ok(Self {
            memory: State::memory(),
            session: State::session(),
            local,
            cookie,
        })
    }
}

/// Open the local store described by `[local]`, scoped when a namespace is
/// configured.
///
/// # Errors
///
/// Returns [`HubError`] if the path cannot be resolved, the file cannot be
/// read or the namespace is invalid.
pub fn open_local(config: &StateConfig) -> HubResult<LocalState> {
    let path = config.local_store_path()?;
    let file = FileBackend::open(&path)?;
    let backend: Arc<dyn StorageBackend> = match config.local.namespace() {
        Some(namespace) => Arc::new(ScopedBackend::new(file, namespace)?),
        None => Arc::new(file),
    };
    info!(
        path = %path.display(),
        namespace = config.local.namespace().unwrap_or("-"),
        "local store ready"
    );
    Ok(State::with_backend(
        backend,
        keystate_core::ProviderKind::Local,
    ))
}

/// Default cookie attributes from the `[cookie]` section.
///
/// # Errors
///
/// Returns [`HubError::Storage`] if the same-site policy is unknown.
pub fn cookie_options(section: &CookieSection) -> HubResult<CookieOptions> {
    let mut options = CookieOptions::new()
        .path(section.path.clone())
        .secure(section.secure)
        .same_site(section.same_site.parse()?);
    if section.expires_days > 0 {
        options = options.expires_in_days(i64::from(section.expires_days));
    }
    if !section.domain.is_empty() {
        options = options.domain(section.domain.clone());
    }
    Ok(options)
}
