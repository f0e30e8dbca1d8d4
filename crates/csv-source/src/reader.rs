//! CSV reading.

use anyhow::{Context, Result};
use metaobject_types::TabularRow;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

pub const DEFAULT_DELIMITER: u8 = b',';

/// Read a headered CSV file into rows.
///
/// Fails if the file cannot be opened, has no header, or has no data rows.
pub fn read_rows(path: &Path, delimiter: u8) -> Result<Vec<TabularRow>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    read_rows_from_reader(file, delimiter, &path.display().to_string())
}

/// Read headered CSV data from any reader.
pub fn read_rows_from_reader<R: Read>(
    reader: R,
    delimiter: u8,
    source_name: &str,
) -> Result<Vec<TabularRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .with_context(|| format!("Failed to read CSV headers from {source_name}"))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(String::is_empty) {
        anyhow::bail!("CSV source {source_name} has no header row");
    }
    debug!("CSV headers: {headers:?}");

    let mut rows = Vec::new();
    for (index, result) in csv_reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read CSV row {}", index + 1))?;
        if record.len() != headers.len() {
            anyhow::bail!(
                "Column count mismatch in CSV row {}: expected {} columns ({}), but found {} columns",
                index + 1,
                headers.len(),
                headers.join(", "),
                record.len()
            );
        }
        rows.push(
            headers
                .iter()
                .zip(record.iter())
                .map(|(column, value)| (column.as_str(), value))
                .collect::<TabularRow>(),
        );
    }

    if rows.is_empty() {
        anyhow::bail!("CSV source {source_name} has no data rows");
    }
    info!("Read {} rows from {source_name}", rows.len());
    Ok(rows)
}
