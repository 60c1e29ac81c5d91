//! Normalized output values.
//!
//! A [`Value`] is what record builders put into output field mappings. It is
//! deliberately richer than JSON (timestamps and raw bytes stay typed, float
//! NaN is representable) and only collapses to JSON at the sink boundary via
//! [`Value::to_json`].

use crate::{ConvertError, ConvertResult};
use base64::Engine;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde_json::json;

/// A normalized field value produced by type conversion
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean scalar
    Bool(bool),
    /// Integer scalar (int32 and int64 both widen to i64)
    Integer(i64),
    /// Floating-point scalar; NaN/Infinity are representable here and only
    /// rejected when forced into canonical JSON
    Float(f64),
    /// UTF-8 string, also used for enum symbol names
    String(String),
    /// Raw byte sequence
    Bytes(Vec<u8>),
    /// Well-known timestamp as a UTC instant
    Timestamp(DateTime<Utc>),
    /// Well-known duration, kept as its wire components
    Duration { seconds: i64, nanos: i32 },
    /// Ordered sequence: repeated fields and map entry lists
    Array(Vec<Value>),
    /// Nested mapping in schema field order
    Record(Vec<(String, Value)>),
}

impl Value {
    /// Build a timestamp value from wire seconds/nanos
    ///
    /// Fails when nanos is outside `0..1_000_000_000` or the components are
    /// outside the chrono-representable range.
    pub fn timestamp(seconds: i64, nanos: i32) -> ConvertResult<Self> {
        let out_of_range = || {
            ConvertError::Conversion(format!(
                "timestamp out of range: seconds={seconds} nanos={nanos}"
            ))
        };
        if !(0..1_000_000_000).contains(&nanos) {
            return Err(out_of_range());
        }
        match Utc.timestamp_opt(seconds, nanos as u32) {
            chrono::LocalResult::Single(ts) => Ok(Value::Timestamp(ts)),
            _ => Err(out_of_range()),
        }
    }

    /// The zero value for a scalar, mirroring wire-format "no presence bit
    /// means default value" semantics
    pub fn zero_of(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Bool => Value::Bool(false),
            ScalarKind::Integer => Value::Integer(0),
            ScalarKind::Float => Value::Float(0.0),
            ScalarKind::String => Value::String(String::new()),
            ScalarKind::Bytes => Value::Bytes(Vec::new()),
        }
    }

    /// Get the string content, if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer content, if this is an integer value
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Convert into a JSON value for sinks that emit JSON bodies
    ///
    /// Bytes encode as standard base64, timestamps as ISO-8601 strings,
    /// durations as `{seconds, nanos}` objects. Fails on NaN/Infinity,
    /// which have no canonical JSON representation.
    pub fn to_json(&self) -> ConvertResult<serde_json::Value> {
        Ok(match self {
            Value::Bool(b) => json!(b),
            Value::Integer(i) => json!(i),
            Value::Float(f) => serde_json::Value::Number(
                serde_json::Number::from_f64(*f).ok_or_else(|| {
                    ConvertError::Conversion(format!("{f} has no JSON representation"))
                })?,
            ),
            Value::String(s) => json!(s),
            Value::Bytes(b) => {
                json!(base64::engine::general_purpose::STANDARD.encode(b))
            }
            Value::Timestamp(ts) => json!(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Duration { seconds, nanos } => {
                json!({ "seconds": seconds, "nanos": nanos })
            }
            Value::Array(items) => serde_json::Value::Array(
                items.iter().map(|v| v.to_json()).collect::<ConvertResult<_>>()?,
            ),
            Value::Record(fields) => {
                let mut map = serde_json::Map::with_capacity(fields.len());
                for (name, value) in fields {
                    map.insert(name.clone(), value.to_json()?);
                }
                serde_json::Value::Object(map)
            }
        })
    }

    /// Render as a plain string for key templates and metadata columns
    pub fn render(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => base64::engine::general_purpose::STANDARD.encode(b),
            Value::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Value::Duration { seconds, nanos } => format!("{seconds}.{nanos:09}s"),
            Value::Array(_) | Value::Record(_) => self
                .to_json()
                .map(|j| j.to_string())
                .unwrap_or_else(|e| e.to_string()),
        }
    }
}

impl From<serde_json::Value> for Value {
    /// Lift a JSON value into the normalized representation (used by the
    /// schemaless JSON parsing mode)
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::String(String::new()),
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Record(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Scalar kinds that carry a wire default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Integer,
    Float,
    String,
    Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_values() {
        assert_eq!(Value::zero_of(ScalarKind::Bool), Value::Bool(false));
        assert_eq!(Value::zero_of(ScalarKind::Integer), Value::Integer(0));
        assert_eq!(
            Value::zero_of(ScalarKind::String),
            Value::String(String::new())
        );
    }

    #[test]
    fn test_timestamp_to_json() {
        let ts = Value::timestamp(1700000000, 0).unwrap();
        assert_eq!(ts.to_json().unwrap(), json!("2023-11-14T22:13:20Z"));
    }

    #[test]
    fn test_timestamp_out_of_range() {
        assert!(Value::timestamp(i64::MAX, 0).is_err());
    }

    #[test]
    fn test_timestamp_rejects_invalid_nanos() {
        assert!(Value::timestamp(1700000000, -1).is_err());
        assert!(Value::timestamp(1700000000, 1_000_000_000).is_err());
        assert!(Value::timestamp(1700000000, 999_999_999).is_ok());
    }

    #[test]
    fn test_nan_rejected_in_json() {
        let v = Value::Float(f64::NAN);
        assert!(v.to_json().is_err());

        let nested = Value::Array(vec![Value::Float(f64::INFINITY)]);
        assert!(nested.to_json().is_err());
    }

    #[test]
    fn test_plain_float_passes_through() {
        // NaN is representable as a Value, only JSON conversion rejects it
        let v = Value::Float(f64::NAN);
        assert!(matches!(v, Value::Float(f) if f.is_nan()));
    }

    #[test]
    fn test_bytes_encode_base64() {
        let v = Value::Bytes(vec![1, 2, 3]);
        assert_eq!(v.to_json().unwrap(), json!("AQID"));
    }

    #[test]
    fn test_duration_json_shape() {
        let v = Value::Duration {
            seconds: 3,
            nanos: 500_000_000,
        };
        assert_eq!(v.to_json().unwrap(), json!({"seconds": 3, "nanos": 500000000}));
    }

    #[test]
    fn test_from_json_numbers() {
        assert_eq!(Value::from(json!(42)), Value::Integer(42));
        assert_eq!(Value::from(json!(1.5)), Value::Float(1.5));
        assert_eq!(
            Value::from(json!({"a": true})),
            Value::Record(vec![("a".to_string(), Value::Bool(true))])
        );
    }

    #[test]
    fn test_render_scalars() {
        assert_eq!(Value::Integer(7).render(), "7");
        assert_eq!(Value::String("x".into()).render(), "x");
        assert_eq!(Value::Bool(true).render(), "true");
    }
}
