//! Persisted response cache for metaobject-sync
//!
//! Provides a read-through cache for GraphQL query responses so that repeated
//! schema lookups and exports within the TTL do not hit the Admin API again.
//!
//! # Storage Backends
//!
//! - `FilesystemCache` - One JSON file per cache key under a directory
//! - `NullCache` - Never stores anything
//!
//! Each file holds a [`CacheEntry`]: `{timestamp, data}` where `timestamp`
//! is the instant after which the entry is ignored.

mod filesystem;
mod store;

pub use filesystem::{FilesystemCache, DEFAULT_TTL};
pub use store::{CacheEntry, CacheKey, NullCache, ResponseCache};
