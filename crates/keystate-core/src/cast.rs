//! Cast targets and the coercion rules behind them.
//!
//! A stored entry reaches the cast step in one of two shapes: a value that
//! parsed as JSON, or the raw text when parsing failed. Both shapes have a
//! coercion function here so that the rules for each target type live next
//! to each other.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::options::GetOptions;
use crate::value::StateValue;

/// The type a stored value should be read back as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cast {
    /// Text.
    String,
    /// `f64`.
    Number,
    /// `bool`.
    Boolean,
    /// `i128`.
    BigInt,
    /// Structured JSON.
    Object,
}

impl Cast {
    /// Lowercase name, e.g. `"bigint"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::BigInt => "bigint",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for Cast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cast {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "boolean" | "bool" => Ok(Self::Boolean),
            "bigint" => Ok(Self::BigInt),
            "object" | "json" => Ok(Self::Object),
            other => Err(format!(
                "unknown cast '{other}'; expected one of: string, number, boolean, bigint, object"
            )),
        }
    }
}

/// Decide which cast a read applies.
///
/// An explicit cast wins. Otherwise the fallback's variant decides, so that
/// `fallback: 0` reads a number and `fallback: false` reads a boolean. With
/// neither, no cast is applied.
#[must_use]
pub fn resolve_cast(options: &GetOptions) -> Option<Cast> {
    options
        .cast_target()
        .or_else(|| options.fallback_value().map(StateValue::kind))
}

/// Read a parsed value without a cast.
///
/// JSON strings yield their content, objects and arrays stay JSON, and
/// numbers and booleans keep the stored text (`raw`) as a string.
pub(crate) fn uncast(parsed: serde_json::Value, raw: &str) -> StateValue {
    use serde_json::Value;

    match parsed {
        Value::String(s) => StateValue::String(s),
        Value::Number(_) | Value::Bool(_) | Value::Null => StateValue::String(raw.to_owned()),
        container => StateValue::Json(container),
    }
}

/// Coerce a value that parsed as JSON.
///
/// `raw` is the stored text the value was parsed from. Returns `None` when
/// the coercion is not possible.
pub(crate) fn from_parsed(parsed: serde_json::Value, raw: &str, cast: Cast) -> Option<StateValue> {
    use serde_json::Value;

    match cast {
        Cast::String => Some(StateValue::String(match parsed {
            Value::String(s) => s,
            _ => raw.to_owned(),
        })),
        Cast::Number => match parsed {
            Value::Number(n) => n.as_f64().map(StateValue::Number),
            Value::Bool(b) => Some(StateValue::Number(if b { 1.0 } else { 0.0 })),
            Value::String(s) => parse_number(&s),
            _ => None,
        },
        Cast::Boolean => Some(StateValue::Boolean(match parsed {
            Value::Bool(b) => b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
            Value::String(s) => truthy_text(&s),
            Value::Null => false,
            Value::Array(_) | Value::Object(_) => true,
        })),
        Cast::BigInt => match parsed {
            Value::Number(n) => parse_bigint(raw).or_else(|| n.as_f64().and_then(integral)),
            Value::Bool(b) => Some(StateValue::BigInt(i128::from(b))),
            Value::String(s) => parse_bigint(&s),
            _ => None,
        },
        Cast::Object => Some(StateValue::Json(parsed)),
    }
}

/// Coerce stored text that is not valid JSON.
pub(crate) fn from_raw(raw: &str, cast: Cast) -> Option<StateValue> {
    match cast {
        Cast::String => Some(StateValue::String(raw.to_owned())),
        Cast::Number => parse_number(raw),
        Cast::Boolean => Some(StateValue::Boolean(truthy_text(raw))),
        Cast::BigInt => parse_bigint(raw),
        Cast::Object => None,
    }
}

fn truthy_text(s: &str) -> bool {
    let s = s.trim();
    s.eq_ignore_ascii_case("true") || s == "1"
}

/// Finite decimal numbers only; `NaN` and `inf` spellings are not numbers.
fn parse_number(s: &str) -> Option<StateValue> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(StateValue::Number)
}

fn parse_bigint(s: &str) -> Option<StateValue> {
    s.trim().parse::<i128>().ok().map(StateValue::BigInt)
}

#[allow(clippy::cast_possible_truncation)]
fn integral(f: f64) -> Option<StateValue> {
    // 2^127 is exactly representable; anything at or past it overflows i128.
    const LIMIT: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < LIMIT {
        Some(StateValue::BigInt(f as i128))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_cast_prefers_explicit_cast() {
        let opts = GetOptions::new().cast(Cast::String).fallback(0);
        assert_eq!(resolve_cast(&opts), Some(Cast::String));
    }

    #[test]
    fn test_resolve_cast_falls_back_to_fallback_kind() {
        assert_eq!(
            resolve_cast(&GetOptions::new().fallback(0)),
            Some(Cast::Number)
        );
        assert_eq!(
            resolve_cast(&GetOptions::new().fallback(false)),
            Some(Cast::Boolean)
        );
        assert_eq!(
            resolve_cast(&GetOptions::new().fallback(json!(["x"]))),
            Some(Cast::Object)
        );
        assert_eq!(resolve_cast(&GetOptions::new()), None);
    }

    #[test]
    fn test_cast_from_str() {
        assert_eq!("BigInt".parse::<Cast>().unwrap(), Cast::BigInt);
        assert_eq!("bool".parse::<Cast>().unwrap(), Cast::Boolean);
        assert!("date".parse::<Cast>().is_err());
    }

    #[test]
    fn test_uncast_scalars_keep_stored_text() {
        assert_eq!(uncast(json!(25), "25"), StateValue::String("25".into()));
        assert_eq!(uncast(json!(true), "true"), StateValue::String("true".into()));
        assert_eq!(
            uncast(json!("John"), "\"John\""),
            StateValue::String("John".into())
        );
        assert_eq!(uncast(json!({"a": 1}), "{\"a\":1}"), StateValue::Json(json!({"a": 1})));
    }

    #[test]
    fn test_number_cast() {
        assert_eq!(
            from_parsed(json!(25), "25", Cast::Number),
            Some(StateValue::Number(25.0))
        );
        assert_eq!(
            from_parsed(json!(" 4.5 "), "\" 4.5 \"", Cast::Number),
            Some(StateValue::Number(4.5))
        );
        assert_eq!(from_raw("abc", Cast::Number), None);
        assert_eq!(from_raw("NaN", Cast::Number), None);
        assert_eq!(from_raw("inf", Cast::Number), None);
        assert_eq!(from_parsed(json!("-Infinity"), "\"-Infinity\"", Cast::Number), None);
        assert_eq!(from_parsed(json!({"a": 1}), "{\"a\":1}", Cast::Number), None);
    }

    #[test]
    fn test_boolean_cast() {
        assert_eq!(
            from_parsed(json!(1), "1", Cast::Boolean),
            Some(StateValue::Boolean(true))
        );
        assert_eq!(
            from_parsed(json!(0), "0", Cast::Boolean),
            Some(StateValue::Boolean(false))
        );
        assert_eq!(
            from_parsed(json!("false"), "\"false\"", Cast::Boolean),
            Some(StateValue::Boolean(false))
        );
        assert_eq!(
            from_raw("TRUE", Cast::Boolean),
            Some(StateValue::Boolean(true))
        );
        assert_eq!(
            from_raw("yes", Cast::Boolean),
            Some(StateValue::Boolean(false))
        );
    }

    #[test]
    fn test_bigint_cast_keeps_precision() {
        assert_eq!(
            from_parsed(
                json!(9_007_199_254_740_993_u64),
                "9007199254740993",
                Cast::BigInt
            ),
            Some(StateValue::BigInt(9_007_199_254_740_993))
        );
        assert_eq!(
            from_raw("170141183460469231731687303715884105727", Cast::BigInt),
            Some(StateValue::BigInt(i128::MAX))
        );
    }

    #[test]
    fn test_bigint_cast_rejects_fractions_and_text() {
        assert_eq!(from_parsed(json!(1.5), "1.5", Cast::BigInt), None);
        assert_eq!(from_raw("invalid", Cast::BigInt), None);
        assert_eq!(
            from_parsed(json!(1e3), "1e3", Cast::BigInt),
            Some(StateValue::BigInt(1000))
        );
    }

    #[test]
    fn test_object_cast() {
        assert_eq!(
            from_parsed(json!([1, 2]), "[1,2]", Cast::Object),
            Some(StateValue::Json(json!([1, 2])))
        );
        assert_eq!(from_raw("not json", Cast::Object), None);
    }
}
