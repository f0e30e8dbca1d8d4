//! Shopify Admin GraphQL transport.
//!
//! This crate provides:
//! - [`GraphqlTransport`], the seam every higher layer is generic over.
//! - [`ShopifyClient`], the reqwest-backed implementation with retry and an
//!   optional read-through response cache.
//! - [`ApiError`], the error taxonomy shared by every Admin API call.
//!
//! # Retry Behavior
//!
//! Requests are attempted up to three times. Rate limiting (HTTP 429 or a
//! `THROTTLED` GraphQL error) and transient network failures back off
//! exponentially between 4 and 10 seconds; everything else fails on the
//! first occurrence.

mod client;
mod error;
mod retry;
mod transport;

pub use client::{ShopifyClient, ShopifyClientBuilder, ShopifyClientConfig, DEFAULT_API_VERSION};
pub use error::{ApiError, GraphqlError, UserError};
pub use retry::{RetryDecision, RetryPolicy};
pub use transport::{check_user_errors, GraphqlTransport};
