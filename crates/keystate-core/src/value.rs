//! Typed state values.

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cast::Cast;
use crate::codec;
use crate::error::StateResult;

/// A value as seen by callers of a state façade.
///
/// Backends only ever hold strings; a `StateValue` is what the codec turns
/// those strings into and back.
#[derive(Debug, Clone, PartialEq)]
pub enum StateValue {
    /// Text.
    String(String),
    /// A double-precision number.
    Number(f64),
    /// A boolean.
    Boolean(bool),
    /// An integer too large or too exact for `Number`.
    BigInt(i128),
    /// Structured JSON, usually an object or an array.
    Json(serde_json::Value),
}

impl StateValue {
    /// Build a value from anything `serde` can turn into JSON.
    ///
    /// Scalars map onto their matching variants; objects, arrays and `null`
    /// stay as [`StateValue::Json`].
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Serialization`](crate::StateError::Serialization)
    /// if `value` cannot be represented as JSON.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> StateResult<Self> {
        Ok(Self::from(serde_json::to_value(value)?))
    }

    /// The cast that reads a stored value back into this variant.
    #[must_use]
    pub fn kind(&self) -> Cast {
        match self {
            Self::String(_) => Cast::String,
            Self::Number(_) => Cast::Number,
            Self::Boolean(_) => Cast::Boolean,
            Self::BigInt(_) => Cast::BigInt,
            Self::Json(_) => Cast::Object,
        }
    }

    /// The text, if this is a `String`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The number, if this is a `Number`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The boolean, if this is a `Boolean`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer, if this is a `BigInt`.
    #[must_use]
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Self::BigInt(n) => Some(*n),
            _ => None,
        }
    }

    /// The JSON tree, if this is `Json`.
    #[must_use]
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Convert to a JSON tree.
    ///
    /// Big integers that fit in `i64`/`u64` become JSON numbers; wider ones
    /// become decimal strings. Non-finite numbers become `null`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Boolean(b) => serde_json::Value::Bool(*b),
            Self::BigInt(n) => {
                if let Ok(small) = i64::try_from(*n) {
                    serde_json::Value::from(small)
                } else if let Ok(unsigned) = u64::try_from(*n) {
                    serde_json::Value::from(unsigned)
                } else {
                    serde_json::Value::String(n.to_string())
                }
            },
            Self::Json(v) => v.clone(),
        }
    }

    /// Deserialize this value into a concrete Rust type.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Serialization`](crate::StateError::Serialization)
    /// if the JSON shape does not match `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> StateResult<T> {
        Ok(serde_json::from_value(self.to_json())?)
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&codec::encode(self))
    }
}

impl From<serde_json::Value> for StateValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Bool(b) => Self::Boolean(b),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => Self::Number(f),
                None => Self::Json(serde_json::Value::Number(n)),
            },
            other => Self::Json(other),
        }
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&String> for StateValue {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

impl From<f64> for StateValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<f32> for StateValue {
    fn from(value: f32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i32> for StateValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for StateValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i64> for StateValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i128> for StateValue {
    fn from(value: i128) -> Self {
        Self::BigInt(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_follows_variant() {
        assert_eq!(StateValue::from("x").kind(), Cast::String);
        assert_eq!(StateValue::from(1.5).kind(), Cast::Number);
        assert_eq!(StateValue::from(true).kind(), Cast::Boolean);
        assert_eq!(StateValue::from(7_i128).kind(), Cast::BigInt);
        assert_eq!(StateValue::from(json!({"a": 1})).kind(), Cast::Object);
    }

    #[test]
    fn test_from_json_maps_scalars_to_variants() {
        assert_eq!(StateValue::from(json!("hi")), StateValue::String("hi".into()));
        assert_eq!(StateValue::from(json!(3)), StateValue::Number(3.0));
        assert_eq!(StateValue::from(json!(false)), StateValue::Boolean(false));
        assert_eq!(
            StateValue::from(json!([1, 2])),
            StateValue::Json(json!([1, 2]))
        );
        assert_eq!(StateValue::from(json!(null)), StateValue::Json(json!(null)));
    }

    #[test]
    fn test_from_serialize_struct() {
        #[derive(serde::Serialize)]
        struct User {
            id: u32,
            name: String,
        }

        let value = StateValue::from_serialize(&User {
            id: 1,
            name: "John".into(),
        })
        .unwrap();
        assert_eq!(value, StateValue::Json(json!({"id": 1, "name": "John"})));
    }

    #[test]
    fn test_deserialize_round_trip() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Point {
            x: i32,
            y: i32,
        }

        let value = StateValue::Json(json!({"x": 3, "y": -4}));
        let point: Point = value.deserialize().unwrap();
        assert_eq!(point, Point { x: 3, y: -4 });

        let n: u8 = StateValue::Number(12.0).deserialize().unwrap();
        assert_eq!(n, 12);
    }

    #[test]
    fn test_to_json_bigint_widths() {
        assert_eq!(StateValue::BigInt(-5).to_json(), json!(-5));
        assert_eq!(
            StateValue::BigInt(i128::from(u64::MAX)).to_json(),
            json!(u64::MAX)
        );
        let huge = i128::MAX;
        assert_eq!(
            StateValue::BigInt(huge).to_json(),
            json!(huge.to_string())
        );
    }

    #[test]
    fn test_to_json_non_finite_number_is_null() {
        assert_eq!(StateValue::Number(f64::NAN).to_json(), json!(null));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(StateValue::from("a").as_str(), Some("a"));
        assert_eq!(StateValue::from(2).as_f64(), Some(2.0));
        assert_eq!(StateValue::from(true).as_bool(), Some(true));
        assert_eq!(StateValue::from(9_i128).as_i128(), Some(9));
        assert!(StateValue::from("a").as_f64().is_none());
        assert!(StateValue::from(json!({})).as_json().is_some());
    }
}
