use async_trait::async_trait;

use dataops_core::{MetricRecord, Schema, Table};

use crate::errors::StoreResult;

/// Trait implemented by tabular stores that hold generated rows and metrics.
///
/// Implementations serialize writes to one table name: every call runs in a
/// single transaction so concurrent writers never interleave partial batches.
#[async_trait]
pub trait Store: Send + Sync {
    /// Returns the engine identifier (e.g. `sqlite`).
    fn engine(&self) -> &'static str;

    /// Append rows, creating the table from the schema's declared types if absent.
    ///
    /// Returns the number of rows written.
    async fn write_rows(&self, table_name: &str, schema: &Schema, table: &Table) -> StoreResult<u64>;

    /// Read every stored row, typed from the stored column declarations.
    async fn read_rows(&self, table_name: &str) -> StoreResult<Table>;

    /// Append metric records in order. Returns the number written.
    async fn append_metrics(&self, records: &[MetricRecord]) -> StoreResult<u64>;

    /// Most recent metric records first, at most `limit`.
    ///
    /// An absent metrics table reads as empty.
    async fn read_metrics(&self, limit: usize) -> StoreResult<Vec<MetricRecord>>;
}
