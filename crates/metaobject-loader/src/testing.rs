//! In-memory transport for exercising the loader without a network.
//!
//! Responses are replayed in order. Once the queue is drained, an optional
//! handler computes responses from the request instead.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use shopify_client::{ApiError, GraphqlTransport};

type Handler = Box<dyn Fn(&str, &Value) -> Result<Value, ApiError> + Send + Sync>;

/// A request observed by [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub document: String,
    pub variables: Value,
}

#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<Value, ApiError>>>,
    calls: Mutex<Vec<RecordedCall>>,
    handler: Option<Handler>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request that is not covered by the queue.
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&str, &Value) -> Result<Value, ApiError> + Send + Sync + 'static,
    {
        Self {
            handler: Some(Box::new(handler)),
            ..Self::default()
        }
    }

    pub fn push_data(&self, data: Value) -> &Self {
        self.push(Ok(data))
    }

    pub fn push_error(&self, error: ApiError) -> &Self {
        self.push(Err(error))
    }

    fn push(&self, response: Result<Value, ApiError>) -> &Self {
        self.responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(response);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl GraphqlTransport for ScriptedTransport {
    async fn execute(&self, document: &str, variables: Value) -> Result<Value, ApiError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(RecordedCall {
                document: document.to_string(),
                variables: variables.clone(),
            });

        let queued = self
            .responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        match (queued, &self.handler) {
            (Some(response), _) => response,
            (None, Some(handler)) => handler(document, &variables),
            (None, None) => Err(ApiError::protocol("scripted transport has no more responses")),
        }
    }
}

/// A metaobject node as the Admin API returns it.
pub fn metaobject_node(object_type: &str, handle: &str, fields: &[(&str, &str)]) -> Value {
    let fields: Vec<Value> = fields
        .iter()
        .map(|(key, value)| json!({"key": key, "value": value, "type": "single_line_text_field"}))
        .collect();
    json!({
        "id": format!("gid://shopify/Metaobject/{handle}"),
        "type": object_type,
        "handle": handle,
        "fields": fields,
    })
}

/// A `metaobjects` connection page.
pub fn metaobjects_page(nodes: Vec<Value>, has_next: bool, end_cursor: Option<&str>) -> Value {
    json!({
        "metaobjects": {
            "nodes": nodes,
            "pageInfo": {"hasNextPage": has_next, "endCursor": end_cursor},
        }
    })
}

/// A successful `metaobjectUpsert` payload echoing `node`.
pub fn upsert_payload(node: Value) -> Value {
    json!({"metaobjectUpsert": {"metaobject": node, "userErrors": []}})
}

/// A `metaobjectUpsert` payload rejected with one user error.
pub fn upsert_rejection(message: &str) -> Value {
    json!({"metaobjectUpsert": {
        "metaobject": null,
        "userErrors": [{"field": ["metaobject", "fields"], "message": message, "code": "INVALID"}],
    }})
}
