use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite};
use tracing::{debug, info};

use dataops_core::{FieldType, METRICS_TABLE_NAME, MetricRecord, Schema, Table, Value};

use crate::adapter::Store;
use crate::errors::{StoreError, StoreResult, WriteStep};
use crate::sql::{
    Dialect, column_field_type, create_metrics_sql, create_table_sql, field_type_for_declared,
    insert_metric_sql, insert_sql, quote_ident, validate_table_name,
};

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Store backed by a SQLite database file (or memory).
///
/// The pool holds a single connection, so writes are serialized.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a store using a pre-configured pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect with a `sqlite:` URL, creating the database file if needed.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(StoreError::Unavailable)?
            .create_if_missing(true);
        Self::connect_with(options).await
    }

    /// Open (or create) the database file at `path`.
    pub async fn open(path: &Path) -> StoreResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        Self::connect_with(options).await
    }

    /// Private in-memory database, mostly useful for tests.
    pub async fn in_memory() -> StoreResult<Self> {
        Self::connect("sqlite::memory:").await
    }

    async fn connect_with(options: SqliteConnectOptions) -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(StoreError::Unavailable)?;
        info!(event = "store_connected", engine = "sqlite");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn table_exists(&self, table_name: &str) -> StoreResult<bool> {
        let found = sqlx::query_scalar::<_, String>(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|source| read_error(table_name, source))?;
        Ok(found.is_some())
    }

    async fn stored_columns(&self, table_name: &str) -> StoreResult<Vec<(String, String)>> {
        let rows = sqlx::query(&format!("PRAGMA table_info({})", quote_ident(table_name)))
            .fetch_all(&self.pool)
            .await
            .map_err(|source| read_error(table_name, source))?;

        rows.iter()
            .map(|row| {
                let name: String = row
                    .try_get("name")
                    .map_err(|source| read_error(table_name, source))?;
                let declared: String = row
                    .try_get("type")
                    .map_err(|source| read_error(table_name, source))?;
                Ok((name, declared))
            })
            .collect()
    }
}

#[async_trait]
impl Store for SqliteStore {
    fn engine(&self) -> &'static str {
        "sqlite"
    }

    async fn write_rows(&self, table_name: &str, schema: &Schema, table: &Table) -> StoreResult<u64> {
        validate_table_name(table_name)?;
        let columns = table.columns().to_vec();
        if columns.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(StoreError::Unavailable)?;

        sqlx::query(&create_table_sql(Dialect::Sqlite, table_name, schema, &columns))
            .execute(&mut *tx)
            .await
            .map_err(|source| StoreError::Write {
                step: WriteStep::CreateTable,
                source,
            })?;

        let insert = insert_sql(Dialect::Sqlite, table_name, &columns);
        let types: Vec<FieldType> = columns
            .iter()
            .map(|column| column_field_type(schema, column))
            .collect();

        for row in table.rows() {
            let mut query = sqlx::query(&insert);
            for (column, field_type) in columns.iter().zip(&types) {
                let value = row.get(column).unwrap_or(&Value::Null);
                query = bind_value(query, value, *field_type);
            }
            query
                .execute(&mut *tx)
                .await
                .map_err(|source| StoreError::Write {
                    step: WriteStep::InsertRows,
                    source,
                })?;
        }

        tx.commit().await.map_err(|source| StoreError::Write {
            step: WriteStep::Commit,
            source,
        })?;

        debug!(table = %table_name, rows = table.len(), "rows written");
        Ok(table.len() as u64)
    }

    async fn read_rows(&self, table_name: &str) -> StoreResult<Table> {
        validate_table_name(table_name)?;
        if !self.table_exists(table_name).await? {
            return Err(StoreError::MissingTable(table_name.to_string()));
        }

        let stored = self.stored_columns(table_name).await?;
        let columns: Vec<String> = stored.iter().map(|(name, _)| name.clone()).collect();
        let types: Vec<FieldType> = stored
            .iter()
            .map(|(_, declared)| field_type_for_declared(declared))
            .collect();

        let rows = sqlx::query(&format!(
            "SELECT * FROM {} ORDER BY rowid",
            quote_ident(table_name)
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|source| read_error(table_name, source))?;

        let mut table = Table::with_capacity(columns.clone(), rows.len());
        for row in &rows {
            let mut values = Vec::with_capacity(columns.len());
            for (idx, column) in columns.iter().enumerate() {
                let value = decode_value(row, idx, types[idx]).ok_or_else(|| {
                    StoreError::Decode {
                        column: column.clone(),
                        declared: stored[idx].1.clone(),
                    }
                })?;
                values.push(value);
            }
            table.push_values(values);
        }

        debug!(table = %table_name, rows = table.len(), "rows read");
        Ok(table)
    }

    async fn append_metrics(&self, records: &[MetricRecord]) -> StoreResult<u64> {
        let mut tx = self.pool.begin().await.map_err(StoreError::Unavailable)?;

        sqlx::query(&create_metrics_sql())
            .execute(&mut *tx)
            .await
            .map_err(|source| StoreError::Write {
                step: WriteStep::CreateMetricsTable,
                source,
            })?;

        let insert = insert_metric_sql(Dialect::Sqlite);
        for record in records {
            sqlx::query(&insert)
                .bind(record.recorded_at)
                .bind(record.field.as_str())
                .bind(record.metric.as_str())
                .bind(i64::try_from(record.value).unwrap_or(i64::MAX))
                .execute(&mut *tx)
                .await
                .map_err(|source| StoreError::Write {
                    step: WriteStep::InsertMetrics,
                    source,
                })?;
        }

        tx.commit().await.map_err(|source| StoreError::Write {
            step: WriteStep::Commit,
            source,
        })?;

        debug!(records = records.len(), "metrics appended");
        Ok(records.len() as u64)
    }

    async fn read_metrics(&self, limit: usize) -> StoreResult<Vec<MetricRecord>> {
        if !self.table_exists(METRICS_TABLE_NAME).await? {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(&format!(
            "SELECT date, field, metric, value FROM {METRICS_TABLE_NAME} ORDER BY date DESC, rowid DESC LIMIT ?"
        ))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|source| read_error(METRICS_TABLE_NAME, source))?;

        rows.iter()
            .map(|row| {
                let read = |source| read_error(METRICS_TABLE_NAME, source);
                let value: i64 = row.try_get("value").map_err(read)?;
                Ok(MetricRecord {
                    recorded_at: row.try_get::<NaiveDateTime, _>("date").map_err(read)?,
                    field: row.try_get("field").map_err(read)?,
                    metric: row.try_get("metric").map_err(read)?,
                    value: u64::try_from(value).map_err(|_| StoreError::Decode {
                        column: "value".to_string(),
                        declared: format!("non-negative count, found {value}"),
                    })?,
                })
            })
            .collect()
    }
}

fn read_error(table: &str, source: sqlx::Error) -> StoreError {
    StoreError::Read {
        table: table.to_string(),
        source,
    }
}

fn bind_value<'q>(query: SqliteQuery<'q>, value: &Value, field_type: FieldType) -> SqliteQuery<'q> {
    match value {
        Value::Null => match field_type {
            FieldType::Integer => query.bind(None::<i64>),
            FieldType::Float => query.bind(None::<f64>),
            FieldType::Date => query.bind(None::<NaiveDate>),
            FieldType::String | FieldType::Other => query.bind(None::<String>),
        },
        Value::Int(value) if field_type == FieldType::Float => query.bind(*value as f64),
        Value::Int(value) => query.bind(*value),
        Value::Float(value) => query.bind(*value),
        Value::Text(value) | Value::Uuid(value) => query.bind(value.clone()),
        Value::Date(value) => query.bind(*value),
    }
}

/// Decode by declared type, falling back to text for values SQLite stored
/// with a different storage class.
fn decode_value(row: &SqliteRow, idx: usize, field_type: FieldType) -> Option<Value> {
    let typed = match field_type {
        FieldType::Integer => row.try_get::<Option<i64>, _>(idx).map(Value::from).ok(),
        FieldType::Float => row
            .try_get::<Option<f64>, _>(idx)
            .map(Value::from)
            .or_else(|_| row.try_get::<Option<i64>, _>(idx).map(Value::from))
            .ok(),
        FieldType::Date => row.try_get::<Option<NaiveDate>, _>(idx).map(Value::from).ok(),
        FieldType::String | FieldType::Other => None,
    };
    typed.or_else(|| row.try_get::<Option<String>, _>(idx).map(Value::from).ok())
}
