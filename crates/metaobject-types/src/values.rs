//! Field value representation.
//!
//! The Admin API encodes every metaobject field value as a string. Locally a
//! value keeps its logical type so that validation can tell an integer from
//! a piece of text; the conversion to the wire's text form is explicit.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single metaobject field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean value
    Boolean(bool),

    /// 64-bit signed integer
    Integer(i64),

    /// 64-bit floating point
    Decimal(f64),

    /// Plain text (the shape every value takes when hydrated from the wire)
    Text(String),

    /// Structured JSON (objects, arrays, or null)
    Json(serde_json::Value),
}

impl FieldValue {
    /// Render the value the way the wire expects it.
    ///
    /// `Json(Null)` renders as the empty string; other JSON values render as
    /// compact JSON text.
    pub fn to_wire_text(&self) -> String {
        match self {
            Self::Boolean(b) => b.to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Decimal(f) => f.to_string(),
            Self::Text(s) => s.clone(),
            Self::Json(serde_json::Value::Null) => String::new(),
            Self::Json(serde_json::Value::String(s)) => s.clone(),
            Self::Json(v) => v.to_string(),
        }
    }

    /// Name of the runtime type held by this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Decimal(_) => "decimal",
            Self::Text(_) => "text",
            Self::Json(serde_json::Value::Object(_)) => "object",
            Self::Json(serde_json::Value::Array(_)) => "array",
            Self::Json(serde_json::Value::Null) => "null",
            Self::Json(_) => "json",
        }
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Json(serde_json::Value::Null))
    }

    /// Try to get this value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Coerce the value to a floating point number.
    ///
    /// Numbers convert directly, text is parsed after trimming. Booleans and
    /// structured JSON never coerce.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Decimal(f) => Some(*f),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Json(serde_json::Value::Number(n)) => n.as_f64(),
            Self::Boolean(_) | Self::Json(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire_text())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_text_rendering() {
        assert_eq!(FieldValue::from("abc").to_wire_text(), "abc");
        assert_eq!(FieldValue::from(42).to_wire_text(), "42");
        assert_eq!(FieldValue::from(2.5).to_wire_text(), "2.5");
        assert_eq!(FieldValue::from(true).to_wire_text(), "true");
        assert_eq!(
            FieldValue::from(json!({"a": 1})).to_wire_text(),
            r#"{"a":1}"#
        );
        assert_eq!(FieldValue::Json(serde_json::Value::Null).to_wire_text(), "");
    }

    #[test]
    fn test_type_names() {
        assert_eq!(FieldValue::from("x").type_name(), "text");
        assert_eq!(FieldValue::from(json!([1, 2])).type_name(), "array");
        assert_eq!(FieldValue::from(json!({})).type_name(), "object");
        assert_eq!(FieldValue::Json(serde_json::Value::Null).type_name(), "null");
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(FieldValue::from(" 3.25 ").as_f64(), Some(3.25));
        assert_eq!(FieldValue::from(7).as_f64(), Some(7.0));
        assert_eq!(FieldValue::from("seven").as_f64(), None);
        assert_eq!(FieldValue::from(true).as_f64(), None);
    }
}
