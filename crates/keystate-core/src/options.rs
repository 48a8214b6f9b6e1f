//! Per-read options.

use crate::cast::Cast;
use crate::value::StateValue;

/// Options for a single `get`.
///
/// ```rust
/// use keystate_core::{Cast, GetOptions};
///
/// let opts = GetOptions::new().strict().cast(Cast::Number);
/// assert!(opts.is_strict());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetOptions {
    strict: bool,
    fallback: Option<StateValue>,
    cast: Option<Cast>,
}

impl GetOptions {
    /// Options with no fallback, no cast and strict mode off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with `NotFound` / `InvalidCast` instead of degrading silently.
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Value returned when the key is missing, empty, or fails to cast.
    ///
    /// Without an explicit [`cast`](Self::cast), the fallback's variant also
    /// selects the cast.
    #[must_use]
    pub fn fallback(mut self, value: impl Into<StateValue>) -> Self {
        self.fallback = Some(value.into());
        self
    }

    /// Read the stored value back as `cast`.
    #[must_use]
    pub fn cast(mut self, cast: Cast) -> Self {
        self.cast = Some(cast);
        self
    }

    /// Whether strict mode is on.
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// The fallback, if any.
    #[must_use]
    pub fn fallback_value(&self) -> Option<&StateValue> {
        self.fallback.as_ref()
    }

    /// The explicit cast, if any.
    #[must_use]
    pub fn cast_target(&self) -> Option<Cast> {
        self.cast
    }
}
