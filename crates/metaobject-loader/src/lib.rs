//! Metaobject loading for the Shopify Admin API.
//!
//! This crate implements the record-level operations on top of a
//! [`GraphqlTransport`](shopify_client::GraphqlTransport):
//!
//! - **describe**: resolve a type name to its [`TypeDescriptor`]
//! - **validate**: check a record against a descriptor
//! - **pagination**: walk `metaobjects` connections to the end
//! - **upsert**: create-or-update records one by one or in batches
//! - **export**: statistics and tabular rows over fetched records
//!
//! [`MetaobjectLoader`] bundles them behind one transport and configuration.
//!
//! [`TypeDescriptor`]: metaobject_types::TypeDescriptor

pub mod describe;
pub mod error;
pub mod export;
pub mod loader;
pub mod pagination;
pub mod queries;
pub mod testing;
pub mod upsert;
pub mod validate;

pub use describe::{describe, list_types, parse_definition, TypeSummary};
pub use error::{LoaderError, Result};
pub use export::{compute_stats, flatten_rows, FieldStats, MetafieldDistribution, MetaobjectStats};
pub use loader::{LoaderConfig, MetaobjectLoader};
pub use pagination::{fetch_all, fetch_as_mapping, paginate_cursor, FetchedRecords, Page};
pub use upsert::{
    delete, process_tabular_source, process_tabular_source_validated, record_from_row,
    upsert_batch, upsert_batch_validated, upsert_one, RecordFailure, UpsertTally, DEFAULT_BATCH_SIZE,
};
pub use validate::{coerce_to_schema, validate};
