//! metaobject-sync library
//!
//! Synchronizes CSV data with Shopify metaobjects through the Admin GraphQL
//! API.
//!
//! # Crates
//!
//! - `metaobject_types` - records, field values and type schemas
//! - `shopify_client` - GraphQL transport with retry and an optional response cache
//! - `metaobject_loader` - describe, validate, fetch, upsert and export
//! - `metaobject_sync_csv_source` - CSV import and export
//!
//! # CLI Usage
//!
//! ```bash
//! # Show a type's schema
//! metaobject-sync describe region
//!
//! # Check a CSV file against the schema without writing
//! metaobject-sync validate region --file regions.csv
//!
//! # Upsert every row
//! metaobject-sync upsert region --file regions.csv --batch-size 25
//!
//! # Export every record
//! metaobject-sync export region --output regions.csv --include-metafields
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use response_cache::FilesystemCache;
use shopify_client::{ShopifyClient, DEFAULT_API_VERSION};
use tracing::debug;

pub mod config;

pub use metaobject_sync_csv_source as csv;

#[derive(Parser, Clone, Debug)]
pub struct ShopifyOpts {
    /// Shop domain, e.g. my-shop.myshopify.com
    #[arg(long, env = "SHOPIFY_SHOP_DOMAIN")]
    pub shop_domain: String,

    /// Admin API access token
    #[arg(long, env = "SHOPIFY_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,

    /// Admin API version
    #[arg(long, default_value = DEFAULT_API_VERSION, env = "SHOPIFY_API_VERSION")]
    pub api_version: String,

    /// Directory for cached query responses (caching is off when unset)
    #[arg(long, env = "SHOPIFY_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Lifetime of cached responses, e.g. "1h", "30m", "300s"
    #[arg(long, default_value = "1h", env = "SHOPIFY_CACHE_TTL")]
    pub cache_ttl: String,
}

impl ShopifyOpts {
    /// Build an Admin API client from these options.
    pub fn build_client(&self) -> anyhow::Result<ShopifyClient> {
        let mut builder = ShopifyClient::builder(&self.shop_domain, self.access_token.clone())
            .with_shop(&self.shop_domain, &self.api_version);

        if let Some(dir) = &self.cache_dir {
            let ttl = config::parse_duration(&self.cache_ttl)
                .with_context(|| format!("Invalid --cache-ttl '{}'", self.cache_ttl))?;
            debug!("Caching query responses in {} for {ttl:?}", dir.display());
            builder = builder.with_cache(Arc::new(FilesystemCache::with_ttl(dir, ttl)));
        }

        builder
            .build()
            .context("Failed to build Shopify Admin API client")
    }
}
