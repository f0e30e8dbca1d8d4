//! CSV synchronization implementation
//!
//! Reads a CSV file and upserts one metaobject per row, or fetches every
//! metaobject of a type and writes it out as CSV.

use anyhow::{Context, Result};
use metaobject_loader::{MetaobjectLoader, UpsertTally};
use shopify_client::GraphqlTransport;
use std::path::PathBuf;
use tracing::info;

use crate::reader::{read_rows, DEFAULT_DELIMITER};
use crate::writer::write_rows;

/// Configuration for CSV import
#[derive(Debug, Clone)]
pub struct Config {
    /// CSV file to import
    pub file: PathBuf,

    /// Target metaobject type
    pub type_name: String,

    /// CSV delimiter character (default: ',')
    pub delimiter: u8,

    /// Read and convert the file without writing anything
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file: PathBuf::new(),
            type_name: String::new(),
            delimiter: DEFAULT_DELIMITER,
            dry_run: false,
        }
    }
}

/// Import `config.file` into `config.type_name`.
///
/// Batch size and validation follow the loader's configuration. A dry run
/// returns an empty tally.
pub async fn sync<T: GraphqlTransport>(
    loader: &MetaobjectLoader<T>,
    config: &Config,
) -> Result<UpsertTally> {
    let rows = read_rows(&config.file, config.delimiter)?;

    if config.dry_run {
        info!(
            "Dry run: would upsert {} {} records from {}",
            rows.len(),
            config.type_name,
            config.file.display()
        );
        return Ok(UpsertTally::default());
    }

    let tally = loader
        .process_tabular_source(&rows, &config.type_name)
        .await
        .with_context(|| format!("Failed to import {}", config.file.display()))?;

    info!(
        "Imported {}: {} upserted, {} failed",
        config.file.display(),
        tally.upserted,
        tally.failed
    );
    Ok(tally)
}

/// Write every metaobject of `type_name` to `path`, returning the row count.
pub async fn export<T: GraphqlTransport>(
    loader: &MetaobjectLoader<T>,
    type_name: &str,
    path: &std::path::Path,
    include_metafields: bool,
) -> Result<usize> {
    let table = loader
        .to_rows(type_name, include_metafields)
        .await
        .with_context(|| format!("Failed to fetch {type_name} metaobjects"))?;
    write_rows(path, &table)?;
    Ok(table.rows.len())
}
