//! Error types for metaobject-types crate.

use thiserror::Error;

/// Errors raised while building records from server payloads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Malformed metaobject payload: missing '{missing}'")]
    MalformedRecord { missing: &'static str },
    #[error("Handle of stored metaobject {id} cannot change")]
    HandleImmutable { id: String },
}
