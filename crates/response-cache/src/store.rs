//! Response cache trait and shared types.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identity of a request: the hex SHA-256 of the document and its variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a GraphQL request.
    pub fn for_request(document: &str, variables: &serde_json::Value) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(document.as_bytes());
        hasher.update([0u8]);
        hasher.update(variables.to_string().as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Cached response data stored in a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Expiry instant; the entry is a miss once the current time is past it
    pub timestamp: DateTime<Utc>,
    /// The `data` payload of the cached response
    pub data: serde_json::Value,
}

impl CacheEntry {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.timestamp
    }
}

/// Trait for response cache operations.
///
/// A failed read is the caller's cue to go to the network; implementations
/// report unreadable entries as misses where they can.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Read a live entry. Returns None on a miss or an expired entry.
    async fn get(&self, key: &CacheKey) -> Result<Option<serde_json::Value>>;

    /// Store response data under the key.
    async fn put(&self, key: &CacheKey, data: &serde_json::Value) -> Result<()>;
}

/// Cache that never stores anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

#[async_trait]
impl ResponseCache for NullCache {
    async fn get(&self, _key: &CacheKey) -> Result<Option<serde_json::Value>> {
        Ok(None)
    }

    async fn put(&self, _key: &CacheKey, _data: &serde_json::Value) -> Result<()> {
        Ok(())
    }
}
