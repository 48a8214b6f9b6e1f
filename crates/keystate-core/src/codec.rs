//! Read and write contract between typed values and stored strings.
//!
//! # Reading
//!
//! [`decode`] turns an optional stored string into an optional
//! [`StateValue`] (`None` being the unset sentinel):
//!
//! 1. Missing entry: the fallback, else `NotFound` in strict mode, else unset.
//! 2. Present entry: parse as JSON. An *empty* result (`null`, `""`, `[]`,
//!    `{}`) yields the fallback when one is given; a bare `null` otherwise
//!    reads as unset. Text that is not JSON is taken as-is.
//! 3. Apply the cast chosen by [`resolve_cast`].
//! 4. A failed cast yields `InvalidCast` in strict mode, else the fallback,
//!    else unset.
//!
//! Emptiness is structural only: `NaN`, `"null"` and `"undefined"` as
//! string content are ordinary values.
//!
//! # Writing
//!
//! [`encode`] passes strings through untouched and serializes everything
//! else, so `25` is stored as `25` and `{"id":1}` as `{"id":1}`.

use tracing::trace;

use crate::cast::{self, Cast, resolve_cast};
use crate::error::{StateError, StateResult};
use crate::options::GetOptions;
use crate::provider::ProviderKind;
use crate::value::StateValue;

/// Decode a stored entry according to `options`.
///
/// `key` and `provider` only feed error reporting.
///
/// # Errors
///
/// In strict mode, returns [`StateError::NotFound`] when `raw` is `None` and
/// no fallback is given, and [`StateError::InvalidCast`] when the stored
/// value cannot be coerced to the resolved cast.
pub fn decode(
    key: &str,
    raw: Option<&str>,
    options: &GetOptions,
    provider: &ProviderKind,
) -> StateResult<Option<StateValue>> {
    let Some(raw) = raw else {
        if let Some(fallback) = options.fallback_value() {
            return Ok(Some(fallback.clone()));
        }
        if options.is_strict() {
            return Err(StateError::NotFound {
                key: key.to_owned(),
                provider: provider.clone(),
            });
        }
        return Ok(None);
    };

    let parsed = serde_json::from_str::<serde_json::Value>(raw).ok();
    let empty = match &parsed {
        Some(value) => is_empty(value),
        None => raw.is_empty(),
    };
    if empty && let Some(fallback) = options.fallback_value() {
        trace!(key, "empty stored value, using fallback");
        return Ok(Some(fallback.clone()));
    }
    if matches!(parsed, Some(serde_json::Value::Null)) {
        return Ok(None);
    }

    let Some(target) = resolve_cast(options) else {
        return Ok(Some(match parsed {
            Some(value) => cast::uncast(value, raw),
            None => StateValue::String(raw.to_owned()),
        }));
    };

    let coerced = match parsed {
        Some(value) => cast::from_parsed(value, raw, target),
        None => cast::from_raw(raw, target),
    };
    match coerced {
        Some(value) => Ok(Some(value)),
        None => cast_failure(key, raw, target, options, provider),
    }
}

fn cast_failure(
    key: &str,
    raw: &str,
    cast: Cast,
    options: &GetOptions,
    provider: &ProviderKind,
) -> StateResult<Option<StateValue>> {
    trace!(key, %cast, "stored value does not cast");
    if options.is_strict() {
        return Err(StateError::InvalidCast {
            key: key.to_owned(),
            provider: provider.clone(),
            value: raw.to_owned(),
            cast,
        });
    }
    Ok(options.fallback_value().cloned())
}

/// Whether a parsed value counts as empty for the fallback rule.
#[must_use]
pub fn is_empty(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Array(a) => a.is_empty(),
        serde_json::Value::Object(o) => o.is_empty(),
        serde_json::Value::Bool(_) | serde_json::Value::Number(_) => false,
    }
}

/// Encode a value into its stored string form.
#[must_use]
pub fn encode(value: &StateValue) -> String {
    match value {
        StateValue::String(s) => s.clone(),
        StateValue::Number(n) => encode_number(*n),
        StateValue::Boolean(b) => b.to_string(),
        StateValue::BigInt(n) => n.to_string(),
        StateValue::Json(v) => v.to_string(),
    }
}

fn encode_number(n: f64) -> String {
    if n.is_finite() {
        // Display prints integral floats without a fractional part ("25").
        n.to_string()
    } else {
        "null".to_owned()
    }
}
