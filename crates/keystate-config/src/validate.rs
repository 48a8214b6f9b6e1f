//! Post-merge configuration validation.
//!
//! Checks ranges and cross-field rules on a deserialized
//! [`StateConfig`](crate::StateConfig).

use crate::error::{ConfigError, ConfigResult};
use crate::types::StateConfig;

/// Longest cookie lifetime accepted, in days.
pub const MAX_COOKIE_DAYS: u32 = 3650;

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &StateConfig) -> ConfigResult<()> {
    validate_local(config)?;
    validate_cookie(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_local(config: &StateConfig) -> ConfigResult<()> {
    if config.local.namespace.contains(':') {
        return Err(ConfigError::ValidationError {
            field: "local.namespace".to_owned(),
            message: format!(
                "namespace '{}' must not contain ':'",
                config.local.namespace
            ),
        });
    }
    Ok(())
}

fn validate_cookie(config: &StateConfig) -> ConfigResult<()> {
    let c = &config.cookie;

    let same_site = c.same_site.to_ascii_lowercase();
    if !matches!(same_site.as_str(), "strict" | "lax" | "none") {
        return Err(ConfigError::ValidationError {
            field: "cookie.same_site".to_owned(),
            message: format!(
                "unsupported same-site policy '{}'; expected one of: strict, lax, none",
                c.same_site
            ),
        });
    }

    if same_site == "none" && !c.secure {
        return Err(ConfigError::ValidationError {
            field: "cookie.secure".to_owned(),
            message: "same_site = \"none\" requires secure = true".to_owned(),
        });
    }

    if c.expires_days > MAX_COOKIE_DAYS {
        return Err(ConfigError::ValidationError {
            field: "cookie.expires_days".to_owned(),
            message: format!("expires_days must be between 0 and {MAX_COOKIE_DAYS}"),
        });
    }

    if c.path.is_empty() || !c.path.starts_with('/') {
        return Err(ConfigError::ValidationError {
            field: "cookie.path".to_owned(),
            message: format!("cookie path '{}' must start with '/'", c.path),
        });
    }

    Ok(())
}

fn validate_logging(config: &StateConfig) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        });
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        });
    }

    Ok(())
}
