//! Admin API GraphQL HTTP client implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use reqwest::StatusCode;
use response_cache::{CacheKey, ResponseCache};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ApiError, GraphqlError};
use crate::retry::{RetryDecision, RetryPolicy};
use crate::transport::GraphqlTransport;

/// Admin API version used when none is configured.
pub const DEFAULT_API_VERSION: &str = "2025-04";

const ACCESS_TOKEN_HEADER: &str = "x-shopify-access-token";

/// Response envelope. `errors` is usually a list but Shopify occasionally
/// returns a bare string (e.g. for unknown shops).
#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Value>,
}

impl GraphqlResponse {
    fn errors(&self) -> Vec<GraphqlError> {
        match &self.errors {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    serde_json::from_value(item.clone())
                        .unwrap_or_else(|_| GraphqlError::new(item.to_string()))
                })
                .collect(),
            Some(Value::String(message)) => vec![GraphqlError::new(message.clone())],
            Some(Value::Null) | None => Vec::new(),
            Some(other) => vec![GraphqlError::new(other.to_string())],
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ShopifyClientConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// Retry policy.
    pub retry: RetryPolicy,
}

impl Default for ShopifyClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// Client builder.
pub struct ShopifyClientBuilder {
    endpoint: String,
    access_token: String,
    config: ShopifyClientConfig,
    cache: Option<Arc<dyn ResponseCache>>,
}

impl ShopifyClientBuilder {
    /// Start a builder for `https://{shop_domain}/admin/api/{DEFAULT_API_VERSION}/graphql.json`.
    pub fn new(shop_domain: &str, access_token: impl Into<String>) -> Self {
        Self {
            endpoint: admin_endpoint(shop_domain, DEFAULT_API_VERSION),
            access_token: access_token.into(),
            config: ShopifyClientConfig::default(),
            cache: None,
        }
    }

    /// Target a specific shop and API version.
    pub fn with_shop(mut self, shop_domain: &str, api_version: &str) -> Self {
        self.endpoint = admin_endpoint(shop_domain, api_version);
        self
    }

    /// Override the full endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Attach a read-through cache for query (non-mutation) documents.
    pub fn with_cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ShopifyClient, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let token = HeaderValue::from_str(&self.access_token).map_err(|e| ApiError::Transport {
            message: format!("invalid access token header: {e}"),
            status: None,
        })?;
        headers.insert(ACCESS_TOKEN_HEADER, token);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(self.config.timeout)
            .build()?;

        Ok(ShopifyClient {
            endpoint: self.endpoint,
            http,
            config: self.config,
            cache: self.cache,
            attempts: Arc::new(AtomicU64::new(0)),
        })
    }
}

fn admin_endpoint(shop_domain: &str, api_version: &str) -> String {
    let shop = shop_domain
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');
    format!("https://{shop}/admin/api/{api_version}/graphql.json")
}

fn is_mutation(document: &str) -> bool {
    document.trim_start().starts_with("mutation")
}

/// Admin API GraphQL client.
///
/// Stateless across calls apart from the optional cache; cloning is cheap and
/// clones share the underlying connection pool.
#[derive(Clone)]
pub struct ShopifyClient {
    endpoint: String,
    http: reqwest::Client,
    config: ShopifyClientConfig,
    cache: Option<Arc<dyn ResponseCache>>,
    attempts: Arc<AtomicU64>,
}

impl ShopifyClient {
    pub fn builder(shop_domain: &str, access_token: impl Into<String>) -> ShopifyClientBuilder {
        ShopifyClientBuilder::new(shop_domain, access_token)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Total HTTP attempts made by this client (and its clones).
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    async fn send_with_retry(&self, body: &Value) -> Result<Value, ApiError> {
        let body_bytes = serde_json::to_vec(body).map_err(|e| ApiError::Transport {
            message: format!("failed to encode request: {e}"),
            status: None,
        })?;

        let mut attempt = 1;
        loop {
            match self.send_once(&body_bytes).await {
                Ok(data) => return Ok(data),
                Err(err) => match self.config.retry.decide(&err, attempt) {
                    RetryDecision::RetryAfter(delay) => {
                        warn!(
                            "Attempt {attempt}/{} failed ({err}); retrying after {delay:?}",
                            self.config.retry.max_attempts
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    RetryDecision::DoNotRetry => return Err(err),
                },
            }
        }
    }

    async fn send_once(&self, body_bytes: &[u8]) -> Result<Value, ApiError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        let response = self
            .http
            .post(&self.endpoint)
            .body(body_bytes.to_vec())
            .send()
            .await?;

        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let bytes = response.bytes().await?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::RateLimited {
                message: truncate_body(&bytes),
                retry_after,
            });
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized {
                status: status.as_u16(),
                body: truncate_body(&bytes),
            });
        }
        if !status.is_success() {
            return Err(ApiError::Transport {
                message: format!("HTTP status {status} with body: {}", truncate_body(&bytes)),
                status: Some(status.as_u16()),
            });
        }

        let response: GraphqlResponse =
            serde_json::from_slice(&bytes).map_err(|e| ApiError::Transport {
                message: format!("invalid JSON response: {e}"),
                status: Some(status.as_u16()),
            })?;

        let errors = response.errors();
        if !errors.is_empty() {
            if errors.iter().any(GraphqlError::is_throttled) {
                return Err(ApiError::RateLimited {
                    message: errors[0].message.clone(),
                    retry_after,
                });
            }
            return Err(ApiError::from_graphql_errors(errors));
        }

        response
            .data
            .filter(|data| !data.is_null())
            .ok_or_else(|| ApiError::protocol("missing GraphQL data"))
    }
}

#[async_trait]
impl GraphqlTransport for ShopifyClient {
    async fn execute(&self, document: &str, variables: Value) -> Result<Value, ApiError> {
        let cache = self.cache.as_ref().filter(|_| !is_mutation(document));
        let key = CacheKey::for_request(document, &variables);

        if let Some(cache) = cache {
            match cache.get(&key).await {
                Ok(Some(data)) => return Ok(data),
                Ok(None) => {}
                Err(e) => warn!("Response cache read failed: {e:#}"),
            }
        }

        let body = serde_json::json!({ "query": document, "variables": variables });
        debug!("POST {} ({} bytes of query)", self.endpoint, document.len());
        let data = self.send_with_retry(&body).await?;

        if let Some(cache) = cache {
            if let Err(e) = cache.put(&key, &data).await {
                warn!("Response cache write failed: {e:#}");
            }
        }

        Ok(data)
    }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?;
    if let Ok(seconds) = value.trim().parse::<f64>() {
        if seconds.is_finite() && seconds >= 0.0 {
            return Some(Duration::from_secs_f64(seconds));
        }
    }
    None
}

fn truncate_body(bytes: &[u8]) -> String {
    const MAX_LEN: usize = 2048;
    let mut body = String::from_utf8_lossy(bytes).to_string();
    if body.len() > MAX_LEN {
        let mut cut = MAX_LEN;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push('…');
    }
    body
}
