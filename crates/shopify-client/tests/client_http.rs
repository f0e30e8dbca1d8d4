//! Integration tests for the Admin API client against a scripted HTTP server.
//!
//! Each test starts an axum server on an ephemeral port that replays a fixed
//! sequence of responses, then points a client at it with a fast retry policy.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use response_cache::FilesystemCache;
use serde_json::{json, Value};
use shopify_client::{ApiError, GraphqlTransport, RetryPolicy, ShopifyClient};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// Server state: the scripted responses and what was received.
struct Script {
    responses: Vec<(u16, Value)>,
    hits: AtomicUsize,
    received: Mutex<Vec<(Option<String>, Value)>>,
}

impl Script {
    fn new(responses: Vec<(u16, Value)>) -> Arc<Self> {
        Arc::new(Self {
            responses,
            hits: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        })
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Replays the next scripted response; the last one repeats forever.
async fn graphql_handler(
    State(script): State<Arc<Script>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let index = script.hits.fetch_add(1, Ordering::SeqCst);
    let token = headers
        .get("x-shopify-access-token")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    script.received.lock().unwrap().push((token, body));

    let (status, payload) = script.responses[index.min(script.responses.len() - 1)].clone();
    (StatusCode::from_u16(status).unwrap(), Json(payload)).into_response()
}

/// Start a test HTTP server and return its GraphQL endpoint.
async fn start_test_server(script: Arc<Script>) -> anyhow::Result<(String, tokio::task::JoinHandle<()>)> {
    let app = Router::new()
        .route("/admin/api/2025-04/graphql.json", post(graphql_handler))
        .with_state(script);

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let endpoint = format!("http://{addr}/admin/api/2025-04/graphql.json");

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Ok((endpoint, server_handle))
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        multiplier: Duration::from_millis(1),
        min_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
    }
}

fn client_for(endpoint: &str) -> ShopifyClient {
    ShopifyClient::builder("test-shop.myshopify.com", "shpat_test_token")
        .with_endpoint(endpoint)
        .with_retry_policy(fast_retry())
        .build()
        .unwrap()
}

fn ok_data() -> (u16, Value) {
    (200, json!({"data": {"shop": {"name": "Test Shop"}}}))
}

fn rate_limited() -> (u16, Value) {
    (429, json!({"errors": "Exceeded 2 calls per second for api client."}))
}

const SHOP_QUERY: &str = "query Shop { shop { name } }";

#[tokio::test]
async fn test_rate_limited_then_success_retries_twice() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .try_init();

    let script = Script::new(vec![rate_limited(), rate_limited(), ok_data()]);
    let (endpoint, server) = start_test_server(script.clone()).await.unwrap();
    let client = client_for(&endpoint);

    let data = client.execute(SHOP_QUERY, json!({})).await.unwrap();

    assert_eq!(data["shop"]["name"], "Test Shop");
    assert_eq!(script.hits(), 3);
    assert_eq!(client.attempts(), 3);
    server.abort();
}

#[tokio::test]
async fn test_rate_limited_every_attempt_surfaces_rate_limit() {
    let script = Script::new(vec![rate_limited()]);
    let (endpoint, server) = start_test_server(script.clone()).await.unwrap();
    let client = client_for(&endpoint);

    let err = client.execute(SHOP_QUERY, json!({})).await.unwrap_err();

    assert!(matches!(err, ApiError::RateLimited { .. }), "got {err:?}");
    assert_eq!(script.hits(), 3);
    server.abort();
}

#[tokio::test]
async fn test_throttled_graphql_error_is_retried() {
    let throttled = (
        200,
        json!({"errors": [{"message": "Throttled", "extensions": {"code": "THROTTLED"}}]}),
    );
    let script = Script::new(vec![throttled, ok_data()]);
    let (endpoint, server) = start_test_server(script.clone()).await.unwrap();
    let client = client_for(&endpoint);

    client.execute(SHOP_QUERY, json!({})).await.unwrap();

    assert_eq!(script.hits(), 2);
    server.abort();
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let script = Script::new(vec![(502, json!({"error": "bad gateway"})), ok_data()]);
    let (endpoint, server) = start_test_server(script.clone()).await.unwrap();
    let client = client_for(&endpoint);

    client.execute(SHOP_QUERY, json!({})).await.unwrap();

    assert_eq!(script.hits(), 2);
    server.abort();
}

#[tokio::test]
async fn test_unauthorized_fails_immediately() {
    let script = Script::new(vec![
        (401, json!({"errors": "[API] Invalid API key or access token"})),
        ok_data(),
    ]);
    let (endpoint, server) = start_test_server(script.clone()).await.unwrap();
    let client = client_for(&endpoint);

    let err = client.execute(SHOP_QUERY, json!({})).await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized { status: 401, .. }), "got {err:?}");
    assert_eq!(script.hits(), 1);
    server.abort();
}

#[tokio::test]
async fn test_graphql_errors_fail_immediately() {
    let script = Script::new(vec![
        (
            200,
            json!({"errors": [{"message": "Field 'nope' doesn't exist on type 'QueryRoot'"}]}),
        ),
        ok_data(),
    ]);
    let (endpoint, server) = start_test_server(script.clone()).await.unwrap();
    let client = client_for(&endpoint);

    let err = client.execute("query { nope }", json!({})).await.unwrap_err();

    match err {
        ApiError::Protocol { errors, .. } => {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].message.contains("nope"));
        }
        other => panic!("expected protocol error, got {other:?}"),
    }
    assert_eq!(script.hits(), 1);
    server.abort();
}

#[tokio::test]
async fn test_request_carries_token_query_and_variables() {
    let script = Script::new(vec![ok_data()]);
    let (endpoint, server) = start_test_server(script.clone()).await.unwrap();
    let client = client_for(&endpoint);

    client
        .execute(SHOP_QUERY, json!({"type": "region"}))
        .await
        .unwrap();

    let received = script.received.lock().unwrap();
    assert_eq!(received.len(), 1);
    let (token, body) = &received[0];
    assert_eq!(token.as_deref(), Some("shpat_test_token"));
    assert_eq!(body["query"], SHOP_QUERY);
    assert_eq!(body["variables"]["type"], "region");
    server.abort();
}

#[tokio::test]
async fn test_cache_serves_repeated_queries_but_not_mutations() {
    let script = Script::new(vec![ok_data()]);
    let (endpoint, server) = start_test_server(script.clone()).await.unwrap();
    let dir = tempfile::TempDir::new().unwrap();
    let client = ShopifyClient::builder("test-shop.myshopify.com", "shpat_test_token")
        .with_endpoint(&endpoint)
        .with_retry_policy(fast_retry())
        .with_cache(Arc::new(FilesystemCache::with_ttl(
            dir.path(),
            Duration::from_secs(60),
        )))
        .build()
        .unwrap();

    client.execute(SHOP_QUERY, json!({})).await.unwrap();
    let cached = client.execute(SHOP_QUERY, json!({})).await.unwrap();
    assert_eq!(cached["shop"]["name"], "Test Shop");
    assert_eq!(script.hits(), 1);

    let mutation = "mutation Touch { shop { name } }";
    client.execute(mutation, json!({})).await.unwrap();
    client.execute(mutation, json!({})).await.unwrap();
    assert_eq!(script.hits(), 3);
    server.abort();
}
