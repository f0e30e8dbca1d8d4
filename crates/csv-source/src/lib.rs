//! CSV import and export for metaobjects.
//!
//! Reading produces [`TabularRow`](metaobject_types::TabularRow)s whose first
//! column is the record handle; writing takes an
//! [`ExportTable`](metaobject_types::ExportTable) and emits its column union
//! as the header.

mod reader;
mod sync;
mod writer;

pub use reader::{read_rows, read_rows_from_reader, DEFAULT_DELIMITER};
pub use sync::{export, sync, Config};
pub use writer::{write_rows, write_rows_to_writer};
