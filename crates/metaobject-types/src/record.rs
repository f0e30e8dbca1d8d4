//! In-memory metaobject records and their mapping to and from the wire shape.

use crate::error::RecordError;
use crate::values::FieldValue;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Namespace used when a metafield does not name one.
pub const DEFAULT_NAMESPACE: &str = "custom";

/// Declared type used by `set_metafield` when none is given.
pub const DEFAULT_METAFIELD_TYPE: &str = "text";

/// A namespaced metafield attached to a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metafield {
    pub namespace: String,
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub declared_type: String,
}

/// Ordered field mapping with unique keys.
///
/// Insertion order is kept; re-inserting an existing key overwrites the value
/// in place. Serializes as a JSON object in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(String, FieldValue)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Insert or overwrite a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (k, v) in iter {
            map.insert(k, v.into());
        }
        map
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for FieldMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldMapVisitor;

        impl<'de> Visitor<'de> for FieldMapVisitor {
            type Value = FieldMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FieldMap, A::Error> {
                let mut map = FieldMap::new();
                while let Some((key, value)) = access.next_entry::<String, FieldValue>()? {
                    map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(FieldMapVisitor)
    }
}

/// A metaobject record.
///
/// A record built locally has no `id` until the server assigns one on
/// upsert. Records hydrated from the server always carry their `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metaobject {
    #[serde(rename = "type")]
    pub object_type: String,
    handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub fields: FieldMap,
    /// namespace -> key -> metafield
    #[serde(default)]
    pub metafields: BTreeMap<String, BTreeMap<String, Metafield>>,
}

impl Metaobject {
    /// Create a pending record with no fields.
    pub fn new(object_type: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            handle: handle.into(),
            id: None,
            fields: FieldMap::new(),
            metafields: BTreeMap::new(),
        }
    }

    /// Builder-style field assignment.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key, value.into());
        self
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Rename a pending record.
    ///
    /// The handle of a record the server has already stored is fixed.
    pub fn set_handle(&mut self, handle: impl Into<String>) -> Result<(), RecordError> {
        if let Some(id) = &self.id {
            return Err(RecordError::HandleImmutable { id: id.clone() });
        }
        self.handle = handle.into();
        Ok(())
    }

    /// Whether the server has assigned this record an identity.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Build a record from a server-shaped object.
    ///
    /// Field values hydrate as text (the wire is text-typed). Metafields may
    /// arrive as a plain list or as a GraphQL connection and are grouped by
    /// namespace, then key.
    pub fn from_wire(payload: &Value) -> Result<Self, RecordError> {
        let object_type = payload
            .get("type")
            .and_then(Value::as_str)
            .ok_or(RecordError::MalformedRecord { missing: "type" })?;
        let handle = payload
            .get("handle")
            .and_then(Value::as_str)
            .ok_or(RecordError::MalformedRecord { missing: "handle" })?;

        let mut record = Metaobject::new(object_type, handle);
        record.id = payload
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string);

        if let Some(fields) = payload.get("fields") {
            for field in connection_nodes(fields) {
                let Some(key) = field.get("key").and_then(Value::as_str) else {
                    continue;
                };
                let value = match field.get("value") {
                    Some(Value::String(s)) => FieldValue::Text(s.clone()),
                    Some(other) => FieldValue::Json(other.clone()),
                    None => FieldValue::Json(Value::Null),
                };
                record.fields.insert(key, value);
            }
        }

        if let Some(metafields) = payload.get("metafields") {
            for node in connection_nodes(metafields) {
                let Some(key) = node.get("key").and_then(Value::as_str) else {
                    continue;
                };
                let namespace = node
                    .get("namespace")
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_NAMESPACE);
                let value = match node.get("value") {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                };
                let declared_type = node
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_METAFIELD_TYPE);
                record.set_metafield_typed(key, value, declared_type, namespace);
            }
        }

        Ok(record)
    }

    /// Project fields to the upsert input shape: `[{key, value}]`, values as text.
    pub fn to_wire_fields(&self) -> Vec<Value> {
        self.fields
            .iter()
            .map(|(key, value)| json!({ "key": key, "value": value.to_wire_text() }))
            .collect()
    }

    /// Render the full record in the server object shape.
    pub fn to_wire(&self) -> Value {
        let mut object = serde_json::Map::new();
        if let Some(id) = &self.id {
            object.insert("id".to_string(), Value::String(id.clone()));
        }
        object.insert("type".to_string(), Value::String(self.object_type.clone()));
        object.insert("handle".to_string(), Value::String(self.handle.clone()));
        object.insert("fields".to_string(), Value::Array(self.to_wire_fields()));
        let metafields: Vec<Value> = self
            .metafields()
            .map(|m| {
                json!({
                    "namespace": m.namespace,
                    "key": m.key,
                    "value": m.value,
                    "type": m.declared_type,
                })
            })
            .collect();
        object.insert("metafields".to_string(), Value::Array(metafields));
        Value::Object(object)
    }

    pub fn get_field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key, value.into());
    }

    /// Look up a metafield in the `custom` namespace.
    pub fn get_metafield(&self, key: &str) -> Option<&Metafield> {
        self.get_metafield_in(key, DEFAULT_NAMESPACE)
    }

    pub fn get_metafield_in(&self, key: &str, namespace: &str) -> Option<&Metafield> {
        self.metafields.get(namespace).and_then(|bucket| bucket.get(key))
    }

    /// Set a `text` metafield in the `custom` namespace.
    pub fn set_metafield(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.set_metafield_typed(key, value, DEFAULT_METAFIELD_TYPE, DEFAULT_NAMESPACE);
    }

    pub fn set_metafield_typed(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        declared_type: impl Into<String>,
        namespace: impl Into<String>,
    ) {
        let key = key.into();
        let namespace = namespace.into();
        let metafield = Metafield {
            namespace: namespace.clone(),
            key: key.clone(),
            value: value.into(),
            declared_type: declared_type.into(),
        };
        self.metafields
            .entry(namespace)
            .or_default()
            .insert(key, metafield);
    }

    /// Iterate over every metafield, namespace by namespace.
    pub fn metafields(&self) -> impl Iterator<Item = &Metafield> {
        self.metafields.values().flat_map(|bucket| bucket.values())
    }

    pub fn metafield_count(&self) -> usize {
        self.metafields.values().map(BTreeMap::len).sum()
    }
}

/// Items of a list-shaped value.
///
/// Accepts a plain array, a connection with `nodes`, or a connection with
/// `edges[].node`. Anything else yields no items.
pub fn connection_nodes(value: &Value) -> Vec<&Value> {
    if let Some(items) = value.as_array() {
        return items.iter().collect();
    }
    if let Some(nodes) = value.get("nodes").and_then(Value::as_array) {
        return nodes.iter().collect();
    }
    if let Some(edges) = value.get("edges").and_then(Value::as_array) {
        return edges.iter().filter_map(|edge| edge.get("node")).collect();
    }
    Vec::new()
}
