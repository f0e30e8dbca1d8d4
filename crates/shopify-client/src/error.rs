//! Error types for the Admin API transport.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// An entry of a GraphQL response's `errors` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlError {
    /// Human-readable error message.
    pub message: String,
    /// Path within the response where the error occurred.
    #[serde(default)]
    pub path: Vec<serde_json::Value>,
    /// Extensions metadata (Shopify puts `code` here, e.g. `THROTTLED`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

impl GraphqlError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Vec::new(),
            extensions: None,
        }
    }

    /// The `extensions.code` value, if any.
    pub fn code(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .and_then(serde_json::Value::as_str)
    }

    /// Whether this error is Shopify's cost-based throttle signal.
    pub fn is_throttled(&self) -> bool {
        self.code() == Some("THROTTLED")
    }
}

/// Business-rule error reported in a mutation payload's `userErrors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserError {
    /// Input path the error refers to.
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

fn join_messages<'a>(messages: impl Iterator<Item = &'a str>) -> String {
    messages.collect::<Vec<_>>().join("; ")
}

fn user_error_summary(errors: &[UserError]) -> String {
    join_messages(errors.iter().map(|e| e.message.as_str()))
}

/// Error type for Admin API operations.
///
/// Only [`ApiError::RateLimited`] and network-level [`ApiError::Transport`]
/// failures are retried; see [`ApiError::is_retryable`].
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// HTTP 429 or a `THROTTLED` GraphQL error.
    #[error("Shopify API rate limit exceeded: {message}")]
    RateLimited {
        message: String,
        /// Retry-After duration when supplied.
        retry_after: Option<Duration>,
    },

    /// GraphQL-level errors, or a response without `data`.
    #[error("GraphQL errors: {message}")]
    Protocol {
        message: String,
        errors: Vec<GraphqlError>,
    },

    /// Mutation rejected with `userErrors`.
    #[error("User errors: {}", user_error_summary(.errors))]
    BusinessRule { errors: Vec<UserError> },

    /// Network, HTTP status, or response decoding failure.
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        /// HTTP status code (if a response was received).
        status: Option<u16>,
    },

    /// HTTP 401 or 403.
    #[error("Unauthorized (HTTP {status}): {body}")]
    Unauthorized { status: u16, body: String },
}

impl ApiError {
    /// Build a protocol error from a GraphQL `errors` list.
    pub fn from_graphql_errors(errors: Vec<GraphqlError>) -> Self {
        let message = join_messages(errors.iter().map(|e| e.message.as_str()));
        ApiError::Protocol { message, errors }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        ApiError::Protocol {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    /// Returns `true` if the error is retryable.
    ///
    /// Transport failures without a response, and 5xx responses, are treated
    /// as transient. Every other 4xx is permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::RateLimited { .. } => true,
            ApiError::Transport { status: None, .. } => true,
            ApiError::Transport {
                status: Some(status),
                ..
            } => *status >= 500,
            ApiError::Protocol { .. }
            | ApiError::BusinessRule { .. }
            | ApiError::Unauthorized { .. } => false,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ApiError::RateLimited { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport {
            message: err.to_string(),
            status: err.status().map(|status| status.as_u16()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_retryable_classification() {
        let rate = ApiError::RateLimited {
            message: "slow down".into(),
            retry_after: None,
        };
        assert!(rate.is_retryable());

        let network = ApiError::Transport {
            message: "connection reset".into(),
            status: None,
        };
        assert!(network.is_retryable());

        let server = ApiError::Transport {
            message: "bad gateway".into(),
            status: Some(502),
        };
        assert!(server.is_retryable());

        let client = ApiError::Transport {
            message: "bad request".into(),
            status: Some(400),
        };
        assert!(!client.is_retryable());

        assert!(!ApiError::protocol("no data").is_retryable());
        assert!(!ApiError::Unauthorized {
            status: 401,
            body: String::new()
        }
        .is_retryable());
        assert!(!ApiError::BusinessRule { errors: vec![] }.is_retryable());
    }

    #[test]
    fn test_throttled_code_detection() {
        let err = GraphqlError {
            message: "Throttled".into(),
            path: vec![],
            extensions: Some(json!({"code": "THROTTLED"})),
        };
        assert!(err.is_throttled());
        assert!(!GraphqlError::new("Field 'x' doesn't exist").is_throttled());
    }

    #[test]
    fn test_business_rule_message_joins_user_errors() {
        let err = ApiError::BusinessRule {
            errors: vec![
                UserError {
                    field: Some(vec!["handle".into()]),
                    message: "Handle is taken".into(),
                    code: Some("TAKEN".into()),
                },
                UserError {
                    field: None,
                    message: "Value is invalid".into(),
                    code: None,
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "User errors: Handle is taken; Value is invalid"
        );
    }
}
