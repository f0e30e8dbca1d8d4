//! High-level facade tying the loader operations to one transport.

use metaobject_types::{ExportTable, Metaobject, TabularRow, TypeDescriptor};
use serde_json::Value;
use shopify_client::GraphqlTransport;

use crate::describe::{self, TypeSummary};
use crate::error::{LoaderError, Result};
use crate::export::{compute_stats, flatten_rows, MetaobjectStats};
use crate::pagination::{self, FetchedRecords};
use crate::queries::MAX_PAGE_SIZE;
use crate::upsert::{self, UpsertTally, DEFAULT_BATCH_SIZE};
use crate::validate;

/// Loader configuration.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Records requested per page when fetching.
    pub page_size: usize,
    /// Records per upsert batch.
    pub batch_size: usize,
    /// Check records against the type schema before sending them.
    pub validate_before_upsert: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            validate_before_upsert: false,
        }
    }
}

/// Metaobject operations over a [`GraphqlTransport`].
///
/// Calls are issued one at a time; the loader keeps no state between them.
pub struct MetaobjectLoader<T: GraphqlTransport> {
    transport: T,
    config: LoaderConfig,
}

impl<T: GraphqlTransport> MetaobjectLoader<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, LoaderConfig::default())
    }

    pub fn with_config(transport: T, config: LoaderConfig) -> Self {
        Self { transport, config }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub async fn list_types(&self) -> Result<Vec<TypeSummary>> {
        describe::list_types(&self.transport).await
    }

    pub async fn describe(&self, type_name: &str) -> Result<TypeDescriptor> {
        describe::describe(&self.transport, type_name).await
    }

    /// Validate one record against the type's remote schema.
    ///
    /// Text values are coerced to the declared field types before checking.
    pub async fn validate(&self, record: &Metaobject) -> Result<Vec<String>> {
        let descriptor = self.describe(&record.object_type).await?;
        let coerced = validate::coerce_to_schema(record, &descriptor);
        Ok(validate::validate(&coerced, &descriptor))
    }

    pub async fn fetch_all(&self, type_name: &str) -> Result<FetchedRecords> {
        pagination::fetch_all(&self.transport, type_name, self.config.page_size).await
    }

    /// Every record of `type_name`, hydrated.
    pub async fn fetch_records(&self, type_name: &str) -> Result<Vec<Metaobject>> {
        self.fetch_all(type_name).await?.to_records()
    }

    pub async fn fetch_as_mapping(
        &self,
        type_name: &str,
        key_field: &str,
    ) -> Result<Vec<(String, Value)>> {
        pagination::fetch_as_mapping(&self.transport, type_name, key_field, self.config.page_size)
            .await
    }

    pub async fn upsert_one(&self, record: &Metaobject) -> Result<Metaobject> {
        upsert::upsert_one(&self.transport, record).await
    }

    /// Upsert `records`, all assumed to share one type.
    ///
    /// With `validate_before_upsert` set, the schema of the first record's
    /// type is fetched once and invalid records are skipped.
    pub async fn upsert_batch(&self, records: &[Metaobject]) -> Result<UpsertTally> {
        let batch_size = self.config.batch_size;
        match records.first() {
            Some(first) if self.config.validate_before_upsert => {
                let descriptor = self.describe(&first.object_type).await?;
                Ok(
                    upsert::upsert_batch_validated(&self.transport, records, batch_size, &descriptor)
                        .await,
                )
            }
            _ => Ok(upsert::upsert_batch(&self.transport, records, batch_size).await),
        }
    }

    /// Upsert one record per row; see [`upsert::process_tabular_source`].
    ///
    /// With `validate_before_upsert` set, cells are coerced to the schema of
    /// `type_name` and invalid rows are skipped.
    pub async fn process_tabular_source(
        &self,
        rows: &[TabularRow],
        type_name: &str,
    ) -> Result<UpsertTally> {
        if rows.is_empty() {
            return Err(LoaderError::EmptySource("no rows".to_string()));
        }
        let batch_size = self.config.batch_size;
        if self.config.validate_before_upsert {
            let descriptor = self.describe(type_name).await?;
            return upsert::process_tabular_source_validated(
                &self.transport,
                rows,
                type_name,
                batch_size,
                &descriptor,
            )
            .await;
        }
        upsert::process_tabular_source(&self.transport, rows, type_name, batch_size).await
    }

    pub async fn delete(&self, id: &str) -> Result<String> {
        upsert::delete(&self.transport, id).await
    }

    /// Records are fetched without metafields, so the metafield distribution
    /// of a non-empty type is all zeros.
    pub async fn stats(&self, type_name: &str) -> Result<MetaobjectStats> {
        let records = self.fetch_records(type_name).await?;
        Ok(compute_stats(&records))
    }

    /// `include_metafields` only adds columns for metafields the records
    /// carry; records fetched here carry none.
    pub async fn to_rows(&self, type_name: &str, include_metafields: bool) -> Result<ExportTable> {
        let records = self.fetch_records(type_name).await?;
        Ok(flatten_rows(&records, include_metafields))
    }
}
