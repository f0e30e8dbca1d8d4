//! Core types for the metaobject-sync framework.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - [`Metaobject`] - A record with typed fields and namespaced metafields
//! - [`FieldValue`] - Closed union of the value shapes a field may hold
//! - [`TypeDescriptor`] - A metaobject type's field schema
//! - [`TabularRow`] - Ordered cells used for CSV import and export
//!
//! # Architecture
//!
//! ```text
//! metaobject-types (this crate)
//!    │
//!    ├─── shopify-client      (GraphQL transport, no dependency on records)
//!    ├─── metaobject-loader   (schema, validation, pagination, upsert, export)
//!    └─── csv-source          (CSV rows in and out)
//! ```
//!
//! # Example
//!
//! ```rust
//! use metaobject_types::{FieldValue, Metaobject};
//!
//! let record = Metaobject::new("region", "north")
//!     .with_field("name", "North")
//!     .with_field("population", 1200);
//!
//! assert_eq!(record.get_field("population"), Some(&FieldValue::Integer(1200)));
//! assert_eq!(record.to_wire_fields()[1]["value"], "1200");
//! ```

pub mod error;
pub mod record;
pub mod row;
pub mod schema;
pub mod values;

pub use error::RecordError;
pub use record::{
    connection_nodes, FieldMap, Metafield, Metaobject, DEFAULT_METAFIELD_TYPE, DEFAULT_NAMESPACE,
};
pub use row::{ExportTable, TabularRow};
pub use schema::{FieldDefinition, FieldSummary, FieldType, TypeDescriptor, Validation};
pub use values::FieldValue;
