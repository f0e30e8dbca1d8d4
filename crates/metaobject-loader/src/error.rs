//! Error types for metaobject-loader crate.

use metaobject_types::RecordError;
use shopify_client::ApiError;
use thiserror::Error;

/// Errors that can occur while loading, validating or exporting metaobjects.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("Metaobject definition not found: {0}")]
    NotFound(String),

    #[error("Record {position} has no value for key field '{key_field}'")]
    KeyFieldMissing { key_field: String, position: usize },

    #[error("Tabular source is empty: {0}")]
    EmptySource(String),
}

/// Result type alias for metaobject-loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;
