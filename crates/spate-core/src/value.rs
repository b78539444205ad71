// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Tagged point values and declared-type coercion.
//!
//! Point values crossing the bridge are represented by [`TagValue`], a small
//! tagged variant over the shapes the automation server actually produces.
//! Write requests arrive as raw JSON plus an optional declared type; the
//! [`coerce`] function turns that pair into a typed value with explicit,
//! pure rules.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};

// =============================================================================
// TagValue
// =============================================================================

/// A dynamically-typed point value.
///
/// Serializes untagged, so values appear on the wire as bare JSON scalars
/// (`42`, `3.14`, `true`, `"run"`, `null`) and byte sequences as arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    /// Boolean value.
    Bool(bool),

    /// Signed integer value.
    Integer(i64),

    /// Floating-point value.
    Float(f64),

    /// UTF-8 string value.
    Text(String),

    /// Raw byte sequence.
    Bytes(Vec<u8>),

    /// Absent value (bad quality reads, unset points).
    Null,
}

impl TagValue {
    /// Returns the type name of this value.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Null => "null",
        }
    }

    /// Returns `true` if this is the null value.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Attempts to read the value as an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Bool(v) => Some(i64::from(*v)),
            Self::Integer(v) => Some(*v),
            Self::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Attempts to read the value as an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Self::Integer(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempts to read the value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            Self::Integer(v) => Some(*v != 0),
            _ => None,
        }
    }

    /// Attempts to read the value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Converts a raw JSON value into a tag value without coercion.
    ///
    /// Integral JSON numbers become [`TagValue::Integer`], other numbers
    /// [`TagValue::Float`]. Arrays and objects have no tag-value shape and
    /// are rejected.
    pub fn from_json(raw: &serde_json::Value) -> BridgeResult<Self> {
        match raw {
            serde_json::Value::Null => Ok(Self::Null),
            serde_json::Value::Bool(v) => Ok(Self::Bool(*v)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Self::Float(f))
                } else {
                    Err(BridgeError::coercion(format!(
                        "number {} is out of representable range",
                        n
                    )))
                }
            }
            serde_json::Value::String(v) => Ok(Self::Text(v.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => Err(
                BridgeError::coercion("arrays and objects are not valid point values"),
            ),
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "{}", v),
            Self::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Self::Null => write!(f, "null"),
        }
    }
}

impl From<bool> for TagValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for TagValue {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<i64> for TagValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for TagValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for TagValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for TagValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for TagValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

// =============================================================================
// DeclaredType
// =============================================================================

/// Declared target type of a write request.
///
/// Parsed from the caller-supplied `dataType` field; spellings the caller
/// might reasonably use map to the same tag. An unrecognized spelling is
/// treated as absent, which makes the write pass the raw value through
/// unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclaredType {
    /// Signed integer target (`int`, `int32`).
    Integer,

    /// Floating-point target (`double`, `float`).
    Double,

    /// Boolean target (`bool`, `boolean`).
    Boolean,

    /// String target (`string`).
    Text,
}

impl DeclaredType {
    /// Parses a declared type name, returning `None` for unrecognized or
    /// empty spellings.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "int" | "int32" => Some(Self::Integer),
            "double" | "float" => Some(Self::Double),
            "bool" | "boolean" => Some(Self::Boolean),
            "string" => Some(Self::Text),
            _ => None,
        }
    }

    /// Returns the canonical name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Integer => "int",
            Self::Double => "double",
            Self::Boolean => "bool",
            Self::Text => "string",
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// Coercion
// =============================================================================

/// Coerces a raw JSON value to a tag value according to a declared type.
///
/// Pure function: the same inputs always produce the same output. With no
/// declared type the raw value passes through via [`TagValue::from_json`].
///
/// # Errors
///
/// Returns [`BridgeError::Coercion`] when the raw value cannot be converted
/// to the declared type (for example `"abc"` declared as `int`).
pub fn coerce(raw: &serde_json::Value, declared: Option<DeclaredType>) -> BridgeResult<TagValue> {
    let Some(declared) = declared else {
        return TagValue::from_json(raw);
    };

    match declared {
        DeclaredType::Integer => coerce_integer(raw),
        DeclaredType::Double => coerce_double(raw),
        DeclaredType::Boolean => coerce_boolean(raw),
        DeclaredType::Text => coerce_text(raw),
    }
}

fn coerce_integer(raw: &serde_json::Value) -> BridgeResult<TagValue> {
    match raw {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(TagValue::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(TagValue::Integer(f.round() as i64))
            } else {
                Err(BridgeError::coercion(format!("cannot convert {} to int", n)))
            }
        }
        serde_json::Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(TagValue::Integer)
            .map_err(|_| BridgeError::coercion(format!("cannot convert '{}' to int", s))),
        serde_json::Value::Bool(b) => Ok(TagValue::Integer(i64::from(*b))),
        other => Err(BridgeError::coercion(format!(
            "cannot convert {} to int",
            json_kind(other)
        ))),
    }
}

fn coerce_double(raw: &serde_json::Value) -> BridgeResult<TagValue> {
    match raw {
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(TagValue::Float)
            .ok_or_else(|| BridgeError::coercion(format!("cannot convert {} to double", n))),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(TagValue::Float)
            .map_err(|_| BridgeError::coercion(format!("cannot convert '{}' to double", s))),
        serde_json::Value::Bool(b) => Ok(TagValue::Float(if *b { 1.0 } else { 0.0 })),
        other => Err(BridgeError::coercion(format!(
            "cannot convert {} to double",
            json_kind(other)
        ))),
    }
}

fn coerce_boolean(raw: &serde_json::Value) -> BridgeResult<TagValue> {
    match raw {
        serde_json::Value::Bool(b) => Ok(TagValue::Bool(*b)),
        serde_json::Value::Number(n) => Ok(TagValue::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
        serde_json::Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" => Ok(TagValue::Bool(true)),
            "false" | "0" => Ok(TagValue::Bool(false)),
            _ => Err(BridgeError::coercion(format!(
                "cannot convert '{}' to bool",
                s
            ))),
        },
        other => Err(BridgeError::coercion(format!(
            "cannot convert {} to bool",
            json_kind(other)
        ))),
    }
}

fn coerce_text(raw: &serde_json::Value) -> BridgeResult<TagValue> {
    match raw {
        serde_json::Value::String(s) => Ok(TagValue::Text(s.clone())),
        serde_json::Value::Number(n) => Ok(TagValue::Text(n.to_string())),
        serde_json::Value::Bool(b) => Ok(TagValue::Text(b.to_string())),
        serde_json::Value::Null => Ok(TagValue::Text(String::new())),
        other => Err(BridgeError::coercion(format!(
            "cannot convert {} to string",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tag_value_accessors() {
        assert_eq!(TagValue::Integer(42).as_i64(), Some(42));
        assert_eq!(TagValue::Integer(42).as_f64(), Some(42.0));
        assert_eq!(TagValue::Bool(true).as_i64(), Some(1));
        assert_eq!(TagValue::Text("run".into()).as_str(), Some("run"));
        assert!(TagValue::Null.is_null());
        assert_eq!(TagValue::Text("run".into()).as_i64(), None);
    }

    #[test]
    fn test_tag_value_untagged_serialization() {
        assert_eq!(serde_json::to_value(TagValue::Integer(7)).unwrap(), json!(7));
        assert_eq!(
            serde_json::to_value(TagValue::Float(2.5)).unwrap(),
            json!(2.5)
        );
        assert_eq!(
            serde_json::to_value(TagValue::Text("on".into())).unwrap(),
            json!("on")
        );
        assert_eq!(serde_json::to_value(TagValue::Null).unwrap(), json!(null));
    }

    #[test]
    fn test_declared_type_parse() {
        assert_eq!(DeclaredType::parse("int"), Some(DeclaredType::Integer));
        assert_eq!(DeclaredType::parse("Int32"), Some(DeclaredType::Integer));
        assert_eq!(DeclaredType::parse("FLOAT"), Some(DeclaredType::Double));
        assert_eq!(DeclaredType::parse("boolean"), Some(DeclaredType::Boolean));
        assert_eq!(DeclaredType::parse("string"), Some(DeclaredType::Text));
        assert_eq!(DeclaredType::parse("decimal"), None);
        assert_eq!(DeclaredType::parse(""), None);
    }

    #[test]
    fn test_coerce_string_to_integer() {
        // "123" declared as int dispatches the integer 123, not the string.
        let value = coerce(&json!("123"), Some(DeclaredType::Integer)).unwrap();
        assert_eq!(value, TagValue::Integer(123));
    }

    #[test]
    fn test_coerce_rounding_and_bool() {
        assert_eq!(
            coerce(&json!(12.7), Some(DeclaredType::Integer)).unwrap(),
            TagValue::Integer(13)
        );
        assert_eq!(
            coerce(&json!(true), Some(DeclaredType::Integer)).unwrap(),
            TagValue::Integer(1)
        );
        assert_eq!(
            coerce(&json!(0), Some(DeclaredType::Boolean)).unwrap(),
            TagValue::Bool(false)
        );
        assert_eq!(
            coerce(&json!("true"), Some(DeclaredType::Boolean)).unwrap(),
            TagValue::Bool(true)
        );
    }

    #[test]
    fn test_coerce_passthrough_without_declared_type() {
        assert_eq!(coerce(&json!("123"), None).unwrap(), TagValue::Text("123".into()));
        assert_eq!(coerce(&json!(42), None).unwrap(), TagValue::Integer(42));
        assert_eq!(coerce(&json!(2.5), None).unwrap(), TagValue::Float(2.5));
        assert_eq!(coerce(&json!(null), None).unwrap(), TagValue::Null);
    }

    #[test]
    fn test_coerce_failures() {
        assert!(coerce(&json!("abc"), Some(DeclaredType::Integer)).is_err());
        assert!(coerce(&json!("maybe"), Some(DeclaredType::Boolean)).is_err());
        assert!(coerce(&json!([1, 2, 3]), Some(DeclaredType::Integer)).is_err());
        assert!(coerce(&json!({"a": 1}), None).is_err());
    }
}
