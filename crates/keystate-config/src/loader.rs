//! Config file discovery and layered loading.
//!
//! Implements the `StateConfig::load()` algorithm:
//! 1. Parse `defaults.toml` → base
//! 2. Merge the user file (`~/.keystate/config.toml`) or an explicit file
//! 3. Apply `KEYSTATE_*` environment overrides
//! 4. Deserialize merged tree → `StateConfig`
//! 5. Validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::types::StateConfig;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Directory under the home directory that holds keystate files.
pub const HOME_DIR_NAME: &str = ".keystate";

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Environment variables that override config fields.
const ENV_OVERRIDES: &[(&str, &str, &str)] = &[
    ("KEYSTATE_LOCAL_PATH", "local", "path"),
    ("KEYSTATE_LOG_LEVEL", "logging", "level"),
    ("KEYSTATE_COOKIE_DOMAIN", "cookie", "domain"),
];

/// Where the user-level layer comes from.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    /// `config.toml` inside this keystate home directory (`~/.keystate`).
    Home(&'a Path),
    /// Exactly this file. It must exist.
    File(&'a Path),
}

/// Load configuration with layered precedence.
///
/// `explicit` replaces the user file when given. Environment overrides are
/// read from the process environment.
///
/// # Errors
///
/// Returns a [`ConfigError`] if a config file is malformed, the home
/// directory cannot be found, or the merged configuration fails validation.
pub fn load(explicit: Option<&Path>) -> ConfigResult<StateConfig> {
    let env_vars: HashMap<String, String> = std::env::vars()
        .filter(|(k, _)| k.starts_with("KEYSTATE_"))
        .collect();
    match explicit {
        Some(path) => load_layers(Source::File(path), &env_vars),
        None => {
            let home = keystate_home()?;
            load_layers(Source::Home(&home), &env_vars)
        },
    }
}

/// Load configuration from `source` with the given environment.
///
/// # Errors
///
/// Returns a [`ConfigError`] if a config file is malformed or the merged
/// configuration fails validation.
pub fn load_layers(
    source: Source<'_>,
    env_vars: &HashMap<String, String>,
) -> ConfigResult<StateConfig> {
    // 1. Parse embedded defaults.
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    // 2. User or explicit file.
    let (path, required) = match source {
        Source::Home(home) => (home.join("config.toml"), false),
        Source::File(path) => (path.to_path_buf(), true),
    };
    match try_load_file(&path)? {
        Some(overlay) => {
            deep_merge(&mut merged, &overlay);
            info!(path = %path.display(), "loaded config");
        },
        None if required => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        },
        None => {},
    }

    // 3. Environment overrides.
    let applied = apply_env_overrides(&mut merged, env_vars);
    if applied > 0 {
        debug!(count = applied, "applied environment overrides");
    }

    // 4. Deserialize.
    let config: StateConfig =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    // 5. Validate.
    validate::validate(&config)?;
    Ok(config)
}

/// Load a config from a specific file path (no layering).
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed or fails
/// validation.
pub fn load_file(path: &Path) -> ConfigResult<StateConfig> {
    let overlay = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
        path: path.display().to_string(),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
    })?;
    let config: StateConfig =
        overlay
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: path.display().to_string(),
                source: e,
            })?;
    validate::validate(&config)?;
    Ok(config)
}

/// The keystate home directory, `~/.keystate`.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDir`] if the home directory is unknown.
pub fn keystate_home() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().join(HOME_DIR_NAME))
        .ok_or(ConfigError::NoHomeDir)
}

/// Recursively deep-merge `overlay` into `base`.
///
/// - Tables merge recursively per-field.
/// - Scalars and arrays from the overlay **replace** the base value.
fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}

/// Write every set `KEYSTATE_*` override into `merged`. Returns how many
/// were applied.
fn apply_env_overrides(merged: &mut toml::Value, env_vars: &HashMap<String, String>) -> usize {
    let Some(root) = merged.as_table_mut() else {
        return 0;
    };
    let mut applied: usize = 0;
    for (var, section, field) in ENV_OVERRIDES {
        let Some(value) = env_vars.get(*var) else {
            continue;
        };
        let table = root
            .entry((*section).to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
        if let Some(table) = table.as_table_mut() {
            table.insert((*field).to_owned(), toml::Value::String(value.clone()));
            debug!(var, field = %format!("{section}.{field}"), "env override");
            applied = applied.saturating_add(1);
        }
    }
    applied
}

/// Try to load a file, returning `None` if the file doesn't exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if u64::try_from(content.len()).unwrap_or(u64::MAX) > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len(),
            ),
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}
