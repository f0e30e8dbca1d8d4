//! Filesystem-based response cache implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::store::{CacheEntry, CacheKey, ResponseCache};

/// Default time-to-live for cached responses.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Filesystem implementation of ResponseCache trait.
///
/// Stores each response as `<key>.json` in a directory.
pub struct FilesystemCache {
    dir: PathBuf,
    ttl: chrono::Duration,
}

impl FilesystemCache {
    /// Create a new FilesystemCache with the default TTL.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_ttl(dir, DEFAULT_TTL)
    }

    pub fn with_ttl(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36500));
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    /// Get the directory path.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

#[async_trait]
impl ResponseCache for FilesystemCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<serde_json::Value>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache entry {}", path.display()))?;
        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Ignoring unreadable cache entry {}: {e}", path.display());
                return Ok(None);
            }
        };

        if entry.is_expired_at(Utc::now()) {
            tracing::debug!("Cache entry {} expired at {}", key.as_str(), entry.timestamp);
            return Ok(None);
        }

        tracing::debug!("Cache hit for {}", key.as_str());
        Ok(Some(entry.data))
    }

    async fn put(&self, key: &CacheKey, data: &serde_json::Value) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create cache dir {}", self.dir.display()))?;

        let entry = CacheEntry {
            timestamp: Utc::now() + self.ttl,
            data: data.clone(),
        };

        let path = self.entry_path(key);
        std::fs::write(&path, serde_json::to_string_pretty(&entry)?)?;
        tracing::debug!("Stored cache entry to {}", path.display());
        Ok(())
    }
}
