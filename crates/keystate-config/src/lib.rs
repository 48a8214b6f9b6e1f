#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Layered configuration for keystate.
//!
//! # Usage
//!
//! ```rust,no_run
//! use keystate_config::StateConfig;
//!
//! // Defaults → ~/.keystate/config.toml → KEYSTATE_* env overrides.
//! let config = StateConfig::load(None).unwrap();
//! println!("cookies live for {} days", config.cookie.expires_days);
//! ```
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Environment variables** (`KEYSTATE_LOCAL_PATH`, `KEYSTATE_LOG_LEVEL`,
//!    `KEYSTATE_COOKIE_DOMAIN`)
//! 2. **User** (`~/.keystate/config.toml`) or an explicit `--config` file
//! 3. **Embedded defaults** (`defaults.toml` compiled into binary)
//!
//! This crate depends on no other keystate crate. Turning sections into
//! backend options happens in the `keystate` crate.

/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

use std::path::{Path, PathBuf};

pub use error::{ConfigError, ConfigResult};
pub use types::*;

impl StateConfig {
    /// Load configuration with the full precedence chain.
    ///
    /// `explicit` replaces `~/.keystate/config.toml` when given.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any config file is malformed or the final
    /// configuration fails validation.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Self> {
        loader::load(explicit)
    }

    /// Load configuration from a single file (no layering).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load_file(path: &Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }

    /// File backing local state: the configured path, or
    /// `~/.keystate/local.json`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoHomeDir`] if no path is configured and the
    /// home directory is unknown.
    pub fn local_store_path(&self) -> ConfigResult<PathBuf> {
        match self.local.explicit_path() {
            Some(path) => Ok(path),
            None => Ok(loader::keystate_home()?.join("local.json")),
        }
    }
}
