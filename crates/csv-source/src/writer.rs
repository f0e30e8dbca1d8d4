//! CSV writing.

use anyhow::{Context, Result};
use metaobject_types::ExportTable;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Write `table` to `path`, creating or truncating the file.
pub fn write_rows(path: &Path, table: &ExportTable) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    write_rows_to_writer(file, table)?;
    info!("Wrote {} rows to {}", table.rows.len(), path.display());
    Ok(())
}

/// Write `table` as CSV. Cells a row does not have are left empty.
pub fn write_rows_to_writer<W: Write>(writer: W, table: &ExportTable) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer
        .write_record(&table.columns)
        .context("Failed to write CSV header")?;

    for (index, row) in table.rows.iter().enumerate() {
        let record = table
            .columns
            .iter()
            .map(|column| row.get(column).unwrap_or_default());
        csv_writer
            .write_record(record)
            .with_context(|| format!("Failed to write CSV row {}", index + 1))?;
    }

    csv_writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use metaobject_types::TabularRow;

    #[test]
    fn test_absent_cells_are_empty() {
        let table = ExportTable::from_rows(vec![
            TabularRow::from_iter([("handle", "north"), ("name", "North")]),
            TabularRow::from_iter([("handle", "south"), ("code", "SO")]),
        ]);

        let mut out = Vec::new();
        write_rows_to_writer(&mut out, &table).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "handle,name,code\nnorth,North,\nsouth,,SO\n"
        );
    }

    #[test]
    fn test_values_are_quoted_when_needed() {
        let table = ExportTable::from_rows(vec![TabularRow::from_iter([
            ("handle", "north"),
            ("notes", "cold, windy"),
        ])]);

        let mut out = Vec::new();
        write_rows_to_writer(&mut out, &table).unwrap();

        assert!(String::from_utf8(out).unwrap().contains("\"cold, windy\""));
    }
}
