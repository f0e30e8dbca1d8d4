//! Metaobject type introspection.

use metaobject_types::{connection_nodes, FieldDefinition, FieldType, TypeDescriptor, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shopify_client::{ApiError, GraphqlTransport};
use tracing::{debug, info};

use crate::error::{LoaderError, Result};
use crate::pagination::{paginate_cursor, Page};
use crate::queries::{MAX_PAGE_SIZE, METAOBJECT_DEFINITIONS_QUERY, METAOBJECT_DEFINITION_QUERY};

/// A metaobject definition as listed by `metaobjectDefinitions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub display_name: String,
}

fn str_field<'a>(node: &'a Value, key: &str) -> Option<&'a str> {
    node.get(key).and_then(Value::as_str)
}

fn required_str(node: &Value, key: &str, what: &str) -> Result<String> {
    str_field(node, key)
        .map(str::to_string)
        .ok_or_else(|| ApiError::protocol(format!("{what} is missing '{key}'")).into())
}

fn parse_summary(node: &Value) -> Result<TypeSummary> {
    let type_name = required_str(node, "type", "metaobject definition")?;
    Ok(TypeSummary {
        id: required_str(node, "id", "metaobject definition")?,
        display_name: str_field(node, "name").unwrap_or(&type_name).to_string(),
        type_name,
    })
}

/// List every metaobject definition in the shop.
pub async fn list_types<T>(transport: &T) -> Result<Vec<TypeSummary>>
where
    T: GraphqlTransport + ?Sized,
{
    let fetched = paginate_cursor(MAX_PAGE_SIZE, move |first, after| async move {
        let variables = json!({ "first": first, "after": after });
        let data = transport
            .execute(METAOBJECT_DEFINITIONS_QUERY, variables)
            .await?;
        Page::from_connection(&data, "metaobjectDefinitions")
    })
    .await?;

    fetched.items.iter().map(parse_summary).collect()
}

/// Validation values are strings on the wire, but older definitions carry
/// JSON-encoded lists or nulls.
fn validation_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn parse_field_definition(node: &Value) -> Result<FieldDefinition> {
    let key = required_str(node, "key", "field definition")?;
    let type_name = match node.get("type") {
        Some(Value::String(name)) => name.as_str(),
        Some(object) => str_field(object, "name").unwrap_or_default(),
        None => "",
    };

    let validations = node
        .get("validations")
        .map(connection_nodes)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| {
            let name = str_field(v, "name")?;
            Some(Validation::new(name, validation_value(v.get("value"))))
        })
        .collect();

    Ok(FieldDefinition {
        display_name: str_field(node, "name").unwrap_or(&key).to_string(),
        declared_type: FieldType::parse(type_name),
        description: str_field(node, "description")
            .filter(|d| !d.is_empty())
            .map(str::to_string),
        required: node
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        validations,
        key,
    })
}

/// Build a descriptor from a `metaobjectDefinition` node.
pub fn parse_definition(node: &Value) -> Result<TypeDescriptor> {
    let type_name = required_str(node, "type", "metaobject definition")?;
    let fields = node
        .get("fieldDefinitions")
        .map(connection_nodes)
        .unwrap_or_default()
        .into_iter()
        .map(parse_field_definition)
        .collect::<Result<Vec<_>>>()?;

    Ok(TypeDescriptor {
        display_name: str_field(node, "name").unwrap_or(&type_name).to_string(),
        description: str_field(node, "description")
            .filter(|d| !d.is_empty())
            .map(str::to_string),
        type_name,
        fields,
    })
}

/// Resolve `type_name` and fetch its full field schema.
pub async fn describe<T>(transport: &T, type_name: &str) -> Result<TypeDescriptor>
where
    T: GraphqlTransport + ?Sized,
{
    let types = list_types(transport).await?;
    debug!("Shop defines {} metaobject types", types.len());

    let summary = types
        .into_iter()
        .find(|t| t.type_name == type_name)
        .ok_or_else(|| LoaderError::NotFound(type_name.to_string()))?;

    let data = transport
        .execute(METAOBJECT_DEFINITION_QUERY, json!({ "id": summary.id }))
        .await?;
    let node = data
        .get("metaobjectDefinition")
        .filter(|v| !v.is_null())
        .ok_or_else(|| LoaderError::NotFound(type_name.to_string()))?;

    let descriptor = parse_definition(node)?;
    info!(
        "Described {type_name}: {} fields ({} required)",
        descriptor.fields.len(),
        descriptor.required_fields().count()
    );
    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;

    fn definitions_page(nodes: Value, has_next: bool, cursor: Option<&str>) -> Value {
        json!({"metaobjectDefinitions": {
            "nodes": nodes,
            "pageInfo": {"hasNextPage": has_next, "endCursor": cursor},
        }})
    }

    fn region_definition() -> Value {
        json!({"metaobjectDefinition": {
            "id": "gid://shopify/MetaobjectDefinition/2",
            "type": "region",
            "name": "Region",
            "description": "Sales regions",
            "fieldDefinitions": [
                {
                    "key": "name",
                    "name": "Name",
                    "required": true,
                    "type": {"name": "single_line_text_field"},
                    "validations": []
                },
                {
                    "key": "code",
                    "name": "Code",
                    "required": true,
                    "type": {"name": "single_line_text_field"},
                    "validations": [{"name": "regex", "value": "^[A-Z]{2}$"}]
                },
                {
                    "key": "population",
                    "name": "Population",
                    "required": false,
                    "type": {"name": "number_integer"},
                    "validations": [{"name": "min", "value": "0"}, {"name": "max", "value": null}]
                }
            ]
        }})
    }

    #[tokio::test]
    async fn test_describe_resolves_across_definition_pages() {
        let transport = ScriptedTransport::new();
        transport
            .push_data(definitions_page(
                json!([{"id": "gid://shopify/MetaobjectDefinition/1", "type": "store", "name": "Store"}]),
                true,
                Some("d1"),
            ))
            .push_data(definitions_page(
                json!([{"id": "gid://shopify/MetaobjectDefinition/2", "type": "region", "name": "Region"}]),
                false,
                None,
            ))
            .push_data(region_definition());

        let descriptor = describe(&transport, "region").await.unwrap();

        assert_eq!(descriptor.type_name, "region");
        assert_eq!(descriptor.display_name, "Region");
        assert_eq!(descriptor.description.as_deref(), Some("Sales regions"));
        let keys: Vec<&str> = descriptor.fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, ["name", "code", "population"]);
        assert_eq!(descriptor.fields[1].validations[0].value, "^[A-Z]{2}$");
        assert_eq!(descriptor.fields[2].declared_type, FieldType::Integer);
        assert_eq!(descriptor.fields[2].validations[1].value, "");

        let summary = descriptor.summary();
        assert_eq!(summary.required_count, 2);
        assert_eq!(summary.optional_count, 1);
        assert_eq!(
            summary.field_type_histogram,
            vec![("text".to_string(), 2), ("integer".to_string(), 1)]
        );

        let calls = transport.calls();
        assert_eq!(calls[1].variables["after"], "d1");
        assert_eq!(calls[2].variables["id"], "gid://shopify/MetaobjectDefinition/2");
    }

    #[tokio::test]
    async fn test_describe_unknown_type_is_not_found() {
        let transport = ScriptedTransport::new();
        transport.push_data(definitions_page(
            json!([{"id": "gid://shopify/MetaobjectDefinition/1", "type": "store", "name": "Store"}]),
            false,
            None,
        ));

        let err = describe(&transport, "region").await.unwrap_err();
        assert!(matches!(err, LoaderError::NotFound(ref name) if name == "region"));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_describe_null_definition_is_not_found() {
        let transport = ScriptedTransport::new();
        transport
            .push_data(definitions_page(
                json!([{"id": "gid://shopify/MetaobjectDefinition/2", "type": "region"}]),
                false,
                None,
            ))
            .push_data(json!({"metaobjectDefinition": null}));

        let err = describe(&transport, "region").await.unwrap_err();
        assert!(matches!(err, LoaderError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_types_summaries() {
        let transport = ScriptedTransport::new();
        transport.push_data(definitions_page(
            json!([
                {"id": "gid://shopify/MetaobjectDefinition/1", "type": "store", "name": "Store"},
                {"id": "gid://shopify/MetaobjectDefinition/2", "type": "region"}
            ]),
            false,
            None,
        ));

        let types = list_types(&transport).await.unwrap();
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].display_name, "Store");
        assert_eq!(types[1].display_name, "region");
        assert_eq!(transport.calls()[0].variables["first"], 250);
    }

    #[test]
    fn test_field_type_as_plain_string() {
        let node = json!({"type": "region", "fieldDefinitions": [{"key": "on", "type": "boolean"}]});
        let descriptor = parse_definition(&node).unwrap();
        assert_eq!(descriptor.fields[0].declared_type, FieldType::Boolean);
        assert!(!descriptor.fields[0].required);
        assert_eq!(descriptor.fields[0].display_name, "on");
    }

    #[test]
    fn test_field_without_key_is_protocol_error() {
        let node = json!({"type": "region", "fieldDefinitions": [{"name": "Nameless"}]});
        assert!(matches!(
            parse_definition(&node),
            Err(LoaderError::Api(ApiError::Protocol { .. }))
        ));
    }
}
