//! GraphqlTransport trait definition.
//!
//! Higher layers (schema lookup, pagination, upsert) are generic over this
//! trait so that they can be exercised against a scripted transport in tests
//! and against [`ShopifyClient`](crate::ShopifyClient) in production.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{ApiError, UserError};

/// Trait for issuing a single GraphQL operation.
///
/// # Usage Pattern
///
/// ```ignore
/// pub async fn describe<T: GraphqlTransport>(transport: &T, type_name: &str) -> Result<()> {
///     let data = transport.execute(DEFINITIONS_QUERY, json!({ "first": 250 })).await?;
///     // ...
/// }
/// ```
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    /// Execute a document and return its `data` payload.
    ///
    /// The document is opaque to the transport. Implementations map HTTP and
    /// GraphQL-level failures to [`ApiError`] and own any retry behavior.
    async fn execute(&self, document: &str, variables: Value) -> Result<Value, ApiError>;
}

#[async_trait]
impl<T: GraphqlTransport + ?Sized> GraphqlTransport for Arc<T> {
    async fn execute(&self, document: &str, variables: Value) -> Result<Value, ApiError> {
        (**self).execute(document, variables).await
    }
}

/// Extract a mutation payload, failing on `userErrors`.
///
/// `field` is the mutation's root field, e.g. `metaobjectUpsert`.
pub fn check_user_errors<'a>(data: &'a Value, field: &str) -> Result<&'a Value, ApiError> {
    let payload = data
        .get(field)
        .filter(|v| !v.is_null())
        .ok_or_else(|| ApiError::protocol(format!("response is missing '{field}' payload")))?;

    let errors: Vec<UserError> = match payload.get("userErrors") {
        Some(Value::Array(items)) if !items.is_empty() => items
            .iter()
            .map(|item| {
                serde_json::from_value(item.clone()).unwrap_or_else(|_| UserError {
                    field: None,
                    message: item.to_string(),
                    code: None,
                })
            })
            .collect(),
        _ => Vec::new(),
    };

    if errors.is_empty() {
        Ok(payload)
    } else {
        Err(ApiError::BusinessRule { errors })
    }
}
