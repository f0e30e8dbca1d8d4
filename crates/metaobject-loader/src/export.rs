//! Statistics and tabular export over fetched metaobjects.

use metaobject_types::{ExportTable, Metaobject, TabularRow};
use serde::{Deserialize, Serialize};

/// Prefix of exported metafield columns: `metafield.<namespace>.<key>`.
pub const METAFIELD_COLUMN_PREFIX: &str = "metafield";

/// Per-field observations across a record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldStats {
    pub key: String,
    /// Records carrying the field.
    pub count: usize,
    /// Distinct runtime value types, first-seen order.
    pub types: Vec<String>,
    /// Distinct rendered values, first-seen order.
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetafieldDistribution {
    pub min: usize,
    pub max: usize,
    pub average: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaobjectStats {
    pub total: usize,
    pub fields: Vec<FieldStats>,
    /// Metafields per record; `None` for an empty record set, written as `{}`.
    #[serde(default, with = "distribution_or_empty")]
    pub metafields: Option<MetafieldDistribution>,
}

mod distribution_or_empty {
    use serde::de::Error as _;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;

    use super::MetafieldDistribution;

    pub fn serialize<S: Serializer>(
        value: &Option<MetafieldDistribution>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(distribution) => distribution.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<MetafieldDistribution>, D::Error> {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(map)) if map.is_empty() => Ok(None),
            Some(value) => serde_json::from_value(value).map(Some).map_err(D::Error::custom),
        }
    }
}

impl MetaobjectStats {
    pub fn field(&self, key: &str) -> Option<&FieldStats> {
        self.fields.iter().find(|f| f.key == key)
    }
}

fn push_unique(items: &mut Vec<String>, item: &str) {
    if !items.iter().any(|existing| existing == item) {
        items.push(item.to_string());
    }
}

pub fn compute_stats(records: &[Metaobject]) -> MetaobjectStats {
    let mut fields: Vec<FieldStats> = Vec::new();

    for record in records {
        for (key, value) in record.fields.iter() {
            let index = match fields.iter().position(|f| f.key == key) {
                Some(index) => index,
                None => {
                    fields.push(FieldStats {
                        key: key.to_string(),
                        count: 0,
                        types: Vec::new(),
                        values: Vec::new(),
                    });
                    fields.len() - 1
                }
            };
            let stats = &mut fields[index];
            stats.count += 1;
            push_unique(&mut stats.types, value.type_name());
            push_unique(&mut stats.values, &value.to_wire_text());
        }
    }

    let counts: Vec<usize> = records.iter().map(Metaobject::metafield_count).collect();
    let metafields = match (counts.iter().min(), counts.iter().max()) {
        (Some(&min), Some(&max)) => Some(MetafieldDistribution {
            min,
            max,
            average: counts.iter().sum::<usize>() as f64 / counts.len() as f64,
        }),
        _ => None,
    };

    MetaobjectStats {
        total: records.len(),
        fields,
        metafields,
    }
}

fn to_row(record: &Metaobject, include_metafields: bool) -> TabularRow {
    let mut row = TabularRow::new();
    row.push("handle", record.handle());
    for (key, value) in record.fields.iter() {
        row.push(key, value.to_wire_text());
    }
    if include_metafields {
        for metafield in record.metafields() {
            row.push(
                format!(
                    "{METAFIELD_COLUMN_PREFIX}.{}.{}",
                    metafield.namespace, metafield.key
                ),
                metafield.value.as_str(),
            );
        }
    }
    row
}

/// One row per record: `handle`, then fields, then optionally metafields.
///
/// Metafield columns come only from metafields set on the records; those
/// fetched through `METAOBJECTS_QUERY` have none.
pub fn flatten_rows(records: &[Metaobject], include_metafields: bool) -> ExportTable {
    ExportTable::from_rows(
        records
            .iter()
            .map(|record| to_row(record, include_metafields))
            .collect(),
    )
}
