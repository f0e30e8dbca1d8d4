//! Metaobject type definitions as fetched from the Admin API.
//!
//! A [`TypeDescriptor`] is immutable once fetched; callers may keep one for
//! the duration of a session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declared type of a metaobject field.
///
/// Both short names (`integer`) and the Admin API names (`number_integer`)
/// parse to the same variant. Names this crate does not know are kept as
/// [`FieldType::Other`] so that newer server types do not break parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Text,
    MultilineText,
    Integer,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Json,
    Color,
    Rating,
    Dimension,
    Volume,
    Weight,
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::MultilineText => "multiline_text",
            FieldType::Integer => "integer",
            FieldType::Decimal => "decimal",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Json => "json",
            FieldType::Color => "color",
            FieldType::Rating => "rating",
            FieldType::Dimension => "dimension",
            FieldType::Volume => "volume",
            FieldType::Weight => "weight",
            FieldType::Other(name) => name,
        }
    }

    /// Parse a declared type name. Never fails.
    pub fn parse(name: &str) -> Self {
        match name {
            "text" | "single_line_text_field" => FieldType::Text,
            "multiline_text" | "multi_line_text_field" => FieldType::MultilineText,
            "integer" | "number_integer" => FieldType::Integer,
            "decimal" | "number_decimal" => FieldType::Decimal,
            "boolean" => FieldType::Boolean,
            "date" => FieldType::Date,
            "datetime" | "date_time" => FieldType::DateTime,
            "json" => FieldType::Json,
            "color" => FieldType::Color,
            "rating" => FieldType::Rating,
            "dimension" => FieldType::Dimension,
            "volume" => FieldType::Volume,
            "weight" => FieldType::Weight,
            other => FieldType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FieldType::parse(s))
    }
}

impl Serialize for FieldType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(FieldType::parse(&name))
    }
}

/// A named validation rule attached to a field definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub name: String,
    pub value: String,
}

impl Validation {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Field definition within a metaobject type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub key: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub declared_type: FieldType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub validations: Vec<Validation>,
}

impl FieldDefinition {
    /// Create an optional field with no validations.
    pub fn new(key: impl Into<String>, declared_type: FieldType) -> Self {
        let key = key.into();
        Self {
            display_name: key.clone(),
            key,
            declared_type,
            description: None,
            required: false,
            validations: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_validation(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.validations.push(Validation::new(name, value));
        self
    }
}

/// Derived counts over a type's fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub total_fields: usize,
    pub required_count: usize,
    pub optional_count: usize,
    /// Declared type -> number of fields, in first-seen order.
    pub field_type_histogram: Vec<(String, usize)>,
}

/// A metaobject type and its field definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    #[serde(rename = "type")]
    pub type_name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub fields: Vec<FieldDefinition>,
}

impl TypeDescriptor {
    pub fn new(type_name: impl Into<String>, fields: Vec<FieldDefinition>) -> Self {
        let type_name = type_name.into();
        Self {
            display_name: type_name.clone(),
            type_name,
            description: None,
            fields,
        }
    }

    pub fn field(&self, key: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Required fields in schema order.
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| f.required)
    }

    /// Optional fields in schema order.
    pub fn optional_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| !f.required)
    }

    pub fn summary(&self) -> FieldSummary {
        let mut histogram: Vec<(String, usize)> = Vec::new();
        for field in &self.fields {
            let name = field.declared_type.as_str();
            match histogram.iter_mut().find(|(t, _)| t == name) {
                Some((_, count)) => *count += 1,
                None => histogram.push((name.to_string(), 1)),
            }
        }
        let required_count = self.required_fields().count();
        FieldSummary {
            total_fields: self.fields.len(),
            required_count,
            optional_count: self.fields.len() - required_count,
            field_type_histogram: histogram,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> TypeDescriptor {
        TypeDescriptor::new(
            "region",
            vec![
                FieldDefinition::new("name", FieldType::Text).required(),
                FieldDefinition::new("population", FieldType::Integer),
                FieldDefinition::new("code", FieldType::Text).required(),
                FieldDefinition::new("description", FieldType::MultilineText),
            ],
        )
    }

    #[test]
    fn test_field_type_parsing_accepts_wire_names() {
        assert_eq!(FieldType::parse("single_line_text_field"), FieldType::Text);
        assert_eq!(FieldType::parse("number_decimal"), FieldType::Decimal);
        assert_eq!(FieldType::parse("date_time"), FieldType::DateTime);
        assert_eq!(
            FieldType::parse("product_reference"),
            FieldType::Other("product_reference".to_string())
        );
        assert_eq!(FieldType::parse("weight").to_string(), "weight");
    }

    #[test]
    fn test_summary_counts_and_histogram() {
        let summary = region().summary();
        assert_eq!(summary.total_fields, 4);
        assert_eq!(summary.required_count, 2);
        assert_eq!(summary.optional_count, 2);
        assert_eq!(
            summary.field_type_histogram,
            vec![
                ("text".to_string(), 2),
                ("integer".to_string(), 1),
                ("multiline_text".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_partition_preserves_schema_order() {
        let descriptor = region();
        let required: Vec<_> = descriptor.required_fields().map(|f| f.key.as_str()).collect();
        let optional: Vec<_> = descriptor.optional_fields().map(|f| f.key.as_str()).collect();
        assert_eq!(required, ["name", "code"]);
        assert_eq!(optional, ["population", "description"]);
    }

    #[test]
    fn test_field_type_serde_roundtrip_through_json() {
        let def = FieldDefinition::new("code", FieldType::Text).with_validation("regex", "^[A-Z]+$");
        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(json["type"], "text");
        let back: FieldDefinition = serde_json::from_value(json).unwrap();
        assert_eq!(back, def);
    }
}
