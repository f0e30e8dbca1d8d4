//! Create-or-update of metaobjects keyed by `(type, handle)`.
//!
//! Batch calls never fail as a whole: each record is attempted in order and
//! any failure is logged, counted and attributed to the record's handle.

use metaobject_types::{Metaobject, TabularRow, TypeDescriptor};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shopify_client::{check_user_errors, ApiError, GraphqlTransport};
use tracing::{debug, info, warn};

use crate::error::{LoaderError, Result};
use crate::queries::{METAOBJECT_DELETE_MUTATION, METAOBJECT_UPSERT_MUTATION};
use crate::validate::{coerce_to_schema, validate};

/// Default number of records per batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// A record that could not be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFailure {
    pub handle: String,
    pub message: String,
}

/// Outcome of a batch upsert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertTally {
    pub upserted: usize,
    pub failed: usize,
    pub failures: Vec<RecordFailure>,
}

impl UpsertTally {
    /// Total records attempted.
    pub fn total(&self) -> usize {
        self.upserted + self.failed
    }

    fn record_failure(&mut self, handle: &str, message: impl Into<String>) {
        let message = message.into();
        warn!("Failed to upsert '{handle}': {message}");
        self.failed += 1;
        self.failures.push(RecordFailure {
            handle: handle.to_string(),
            message,
        });
    }
}

/// Write one record with full field replacement.
///
/// Returns the record as the server stored it.
pub async fn upsert_one<T>(transport: &T, record: &Metaobject) -> Result<Metaobject>
where
    T: GraphqlTransport + ?Sized,
{
    let variables = json!({
        "handle": { "type": record.object_type, "handle": record.handle() },
        "metaobject": { "fields": record.to_wire_fields() },
    });
    let data = transport
        .execute(METAOBJECT_UPSERT_MUTATION, variables)
        .await?;
    let payload = check_user_errors(&data, "metaobjectUpsert")?;

    let stored = payload
        .get("metaobject")
        .filter(|v| !v.is_null())
        .ok_or_else(|| ApiError::protocol("metaobjectUpsert returned no metaobject"))?;
    let stored = Metaobject::from_wire(stored)?;
    debug!(
        "Upserted {}/{} as {}",
        stored.object_type,
        stored.handle(),
        stored.id.as_deref().unwrap_or("<no id>")
    );
    Ok(stored)
}

/// Upsert `records` in chunks of `batch_size`.
pub async fn upsert_batch<T>(transport: &T, records: &[Metaobject], batch_size: usize) -> UpsertTally
where
    T: GraphqlTransport + ?Sized,
{
    run_batch(transport, records, batch_size, None, UpsertTally::default()).await
}

/// Like [`upsert_batch`], but each record's text values are coerced to the
/// declared field types first. Records that then fail validation against
/// `descriptor` are counted as failures without being sent.
pub async fn upsert_batch_validated<T>(
    transport: &T,
    records: &[Metaobject],
    batch_size: usize,
    descriptor: &TypeDescriptor,
) -> UpsertTally
where
    T: GraphqlTransport + ?Sized,
{
    run_batch(
        transport,
        records,
        batch_size,
        Some(descriptor),
        UpsertTally::default(),
    )
    .await
}

async fn run_batch<T>(
    transport: &T,
    records: &[Metaobject],
    batch_size: usize,
    descriptor: Option<&TypeDescriptor>,
    mut tally: UpsertTally,
) -> UpsertTally
where
    T: GraphqlTransport + ?Sized,
{
    let batch_size = batch_size.max(1);
    let batches = records.len().div_ceil(batch_size);

    for (index, batch) in records.chunks(batch_size).enumerate() {
        debug!("Processing batch {}/{batches} ({} records)", index + 1, batch.len());

        for record in batch {
            let coerced;
            let record = match descriptor {
                Some(descriptor) => {
                    coerced = coerce_to_schema(record, descriptor);
                    let violations = validate(&coerced, descriptor);
                    if !violations.is_empty() {
                        tally.record_failure(coerced.handle(), violations.join("; "));
                        continue;
                    }
                    &coerced
                }
                None => record,
            };

            match upsert_one(transport, record).await {
                Ok(_) => tally.upserted += 1,
                Err(e) => tally.record_failure(record.handle(), e.to_string()),
            }
        }
    }

    info!(
        "Upsert complete: {} upserted, {} failed",
        tally.upserted, tally.failed
    );
    tally
}

/// Build a pending record from a row whose first cell is the handle.
///
/// Returns `None` for a row without cells.
pub fn record_from_row(row: &TabularRow, type_name: &str) -> Option<Metaobject> {
    let (_, handle) = row.first()?;
    let mut record = Metaobject::new(type_name, handle.trim());
    for (column, value) in row.cells().skip(1) {
        record.set_field(column, value);
    }
    Some(record)
}

/// Upsert one record per row.
///
/// The first cell of every row is the handle; the remaining cells become
/// text fields. Rows with a blank handle are counted as failures.
pub async fn process_tabular_source<T>(
    transport: &T,
    rows: &[TabularRow],
    type_name: &str,
    batch_size: usize,
) -> Result<UpsertTally>
where
    T: GraphqlTransport + ?Sized,
{
    run_tabular(transport, rows, type_name, batch_size, None).await
}

/// Like [`process_tabular_source`], but each record's text cells are first
/// coerced to the declared field types and the record is validated before
/// it is sent.
pub async fn process_tabular_source_validated<T>(
    transport: &T,
    rows: &[TabularRow],
    type_name: &str,
    batch_size: usize,
    descriptor: &TypeDescriptor,
) -> Result<UpsertTally>
where
    T: GraphqlTransport + ?Sized,
{
    run_tabular(transport, rows, type_name, batch_size, Some(descriptor)).await
}

async fn run_tabular<T>(
    transport: &T,
    rows: &[TabularRow],
    type_name: &str,
    batch_size: usize,
    descriptor: Option<&TypeDescriptor>,
) -> Result<UpsertTally>
where
    T: GraphqlTransport + ?Sized,
{
    if rows.is_empty() {
        return Err(LoaderError::EmptySource("no rows".to_string()));
    }

    let mut tally = UpsertTally::default();
    let mut records = Vec::with_capacity(rows.len());
    for (position, row) in rows.iter().enumerate() {
        let record = record_from_row(row, type_name)
            .ok_or_else(|| LoaderError::EmptySource(format!("row {position} has no cells")))?;
        if record.handle().is_empty() {
            tally.record_failure(&format!("<row {position}>"), "missing handle");
            continue;
        }
        records.push(record);
    }

    info!(
        "Upserting {} {type_name} records from {} rows",
        records.len(),
        rows.len()
    );
    Ok(run_batch(transport, &records, batch_size, descriptor, tally).await)
}

/// Delete a metaobject by id, returning the deleted id.
pub async fn delete<T>(transport: &T, id: &str) -> Result<String>
where
    T: GraphqlTransport + ?Sized,
{
    let data = transport
        .execute(METAOBJECT_DELETE_MUTATION, json!({ "id": id }))
        .await?;
    let payload = check_user_errors(&data, "metaobjectDelete")?;
    let deleted = payload
        .get("deletedId")
        .and_then(Value::as_str)
        .unwrap_or(id)
        .to_string();
    info!("Deleted metaobject {deleted}");
    Ok(deleted)
}
