use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use dataops_core::{Schema, Table};
use dataops_store::Store;

use crate::errors::GenerationError;
use crate::output::write_table_csv;

/// Outcome of writing a generated table to its sinks.
#[derive(Debug, Clone, Serialize)]
pub struct PersistReport {
    pub csv_path: PathBuf,
    pub csv_bytes: u64,
    pub table_name: String,
    pub rows_stored: u64,
}

/// Write `table` to the CSV file sink, then append it to the row store.
///
/// The table itself is never modified; a failed sink surfaces as a
/// persistence error the caller can tell apart from a generation error.
pub async fn persist_table<S>(
    schema: &Schema,
    table: &Table,
    csv_path: &Path,
    store: &S,
    table_name: &str,
) -> Result<PersistReport, GenerationError>
where
    S: Store + ?Sized,
{
    let csv_bytes = write_table_csv(csv_path, table).inspect_err(|err| {
        warn!(path = %csv_path.display(), error = %err, "csv sink failed");
    })?;
    info!(
        event = "csv_written",
        path = %csv_path.display(),
        rows = table.len(),
        bytes = csv_bytes
    );

    let rows_stored = store
        .write_rows(table_name, schema, table)
        .await
        .inspect_err(|err| {
            warn!(table = %table_name, engine = store.engine(), error = %err, "row store sink failed");
        })?;
    info!(
        event = "rows_stored",
        table = %table_name,
        engine = store.engine(),
        rows = rows_stored
    );

    Ok(PersistReport {
        csv_path: csv_path.to_path_buf(),
        csv_bytes,
        table_name: table_name.to_string(),
        rows_stored,
    })
}
