//! Schema-driven record validation.
//!
//! [`validate`] checks a record against a [`TypeDescriptor`] and returns every
//! violation it finds as a human-readable message. An empty result means the
//! record is valid. The record is never modified.
//!
//! Checks run in three passes:
//!
//! 1. Every required field must be present.
//! 2. Every present field's value must be compatible with its declared type.
//! 3. Every declared validation rule (`min`, `max`, `pattern`, `in`) must hold.
//!
//! Field values hydrated from the wire or read from CSV are text. Use
//! [`coerce_to_schema`] first when typed checks should apply to such records.

use metaobject_types::{FieldDefinition, FieldType, FieldValue, Metaobject, TypeDescriptor};
use regex::Regex;
use serde_json::Value;

/// Validate `record` against `descriptor`.
pub fn validate(record: &Metaobject, descriptor: &TypeDescriptor) -> Vec<String> {
    let mut violations = Vec::new();

    for field in descriptor.required_fields() {
        if !record.fields.contains_key(&field.key) {
            violations.push(format!("Missing required field: {}", field.key));
        }
    }

    for field in &descriptor.fields {
        let Some(value) = record.get_field(&field.key) else {
            continue;
        };

        if let Some(expected) = type_mismatch(&field.declared_type, value) {
            violations.push(format!(
                "Invalid type for field {}: expected {expected}, got {}",
                field.key,
                value.type_name()
            ));
        }

        for rule in &field.validations {
            if !rule_holds(&rule.name, &rule.value, value) {
                violations.push(format!(
                    "Validation failed for field {}: {} = {}",
                    field.key, rule.name, rule.value
                ));
            }
        }
    }

    violations
}

/// Expected type name when `value` does not fit `declared`.
fn type_mismatch(declared: &FieldType, value: &FieldValue) -> Option<&'static str> {
    let accepted = match declared {
        FieldType::Integer => matches!(value, FieldValue::Integer(_)),
        FieldType::Decimal => matches!(value, FieldValue::Integer(_) | FieldValue::Decimal(_)),
        FieldType::Boolean => matches!(value, FieldValue::Boolean(_)),
        FieldType::Json => matches!(
            value,
            FieldValue::Json(Value::Object(_)) | FieldValue::Json(Value::Array(_))
        ),
        FieldType::Text
        | FieldType::MultilineText
        | FieldType::Date
        | FieldType::DateTime
        | FieldType::Color => matches!(value, FieldValue::Text(_)),
        FieldType::Rating
        | FieldType::Dimension
        | FieldType::Volume
        | FieldType::Weight
        | FieldType::Other(_) => true,
    };
    if accepted {
        return None;
    }
    Some(match declared {
        FieldType::Integer => "integer",
        FieldType::Decimal => "decimal",
        FieldType::Boolean => "boolean",
        FieldType::Json => "json",
        _ => "text",
    })
}

fn rule_holds(name: &str, rule: &str, value: &FieldValue) -> bool {
    match name {
        "min" => compare(rule, value, |actual, bound| actual >= bound),
        "max" => compare(rule, value, |actual, bound| actual <= bound),
        "pattern" | "regex" => match Regex::new(rule) {
            Ok(re) => re.is_match(&value.to_wire_text()),
            Err(_) => false,
        },
        "in" => choice_list(rule).iter().any(|c| *c == value.to_wire_text()),
        "choices" => json_choices(rule)
            .unwrap_or_else(|| choice_list(rule))
            .iter()
            .any(|c| *c == value.to_wire_text()),
        _ => true,
    }
}

/// Numeric comparison; either side failing to coerce fails the rule.
fn compare(rule: &str, value: &FieldValue, holds: impl Fn(f64, f64) -> bool) -> bool {
    match (value.as_f64(), rule.trim().parse::<f64>()) {
        (Some(actual), Ok(bound)) => holds(actual, bound),
        _ => false,
    }
}

fn choice_list(rule: &str) -> Vec<String> {
    rule.split(',').map(|c| c.trim().to_string()).collect()
}

fn json_choices(rule: &str) -> Option<Vec<String>> {
    let items: Vec<Value> = serde_json::from_str(rule.trim()).ok()?;
    Some(
        items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
    )
}

/// Reinterpret text values according to each field's declared type.
///
/// Text that does not parse as the declared type is left as text, so that
/// [`validate`] reports it as a type mismatch.
pub fn coerce_to_schema(record: &Metaobject, descriptor: &TypeDescriptor) -> Metaobject {
    let mut coerced = record.clone();
    for field in &descriptor.fields {
        let Some(FieldValue::Text(text)) = record.get_field(&field.key) else {
            continue;
        };
        if let Some(value) = coerce_text(field, text) {
            coerced.set_field(field.key.clone(), value);
        }
    }
    coerced
}

fn coerce_text(field: &FieldDefinition, text: &str) -> Option<FieldValue> {
    let trimmed = text.trim();
    match field.declared_type {
        FieldType::Integer => trimmed.parse::<i64>().ok().map(FieldValue::Integer),
        FieldType::Decimal => trimmed
            .parse::<i64>()
            .map(FieldValue::Integer)
            .or_else(|_| trimmed.parse::<f64>().map(FieldValue::Decimal))
            .ok(),
        FieldType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "true" => Some(FieldValue::Boolean(true)),
            "false" => Some(FieldValue::Boolean(false)),
            _ => None,
        },
        FieldType::Json => match serde_json::from_str::<Value>(trimmed) {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(FieldValue::Json(value)),
            _ => None,
        },
        _ => None,
    }
}
