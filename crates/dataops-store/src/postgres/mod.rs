use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Postgres, Row};
use tracing::{debug, info};

use dataops_core::{FieldType, METRICS_TABLE_NAME, MetricRecord, Schema, Table, Value};

use crate::adapter::Store;
use crate::errors::{StoreError, StoreResult, WriteStep};
use crate::sql::{
    Dialect, column_field_type, create_metrics_sql, create_table_sql, insert_metric_sql,
    insert_sql, quote_ident, validate_table_name,
};

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// Store backed by a Postgres database, using the connection's current schema.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a store using a pre-configured pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await
            .map_err(StoreError::Unavailable)?;
        info!(event = "store_connected", engine = "postgres");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn table_exists(&self, table_name: &str) -> StoreResult<bool> {
        let found = sqlx::query_scalar::<_, String>(
            r#"
            SELECT table_name::text
            FROM information_schema.tables
            WHERE table_schema = current_schema() AND table_name = $1
            "#,
        )
        .bind(table_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|source| read_error(table_name, source))?;
        Ok(found.is_some())
    }

    async fn stored_columns(&self, table_name: &str) -> StoreResult<Vec<(String, String)>> {
        let rows = sqlx::query(
            r#"
            SELECT column_name::text AS name, data_type::text AS declared
            FROM information_schema.columns
            WHERE table_schema = current_schema() AND table_name = $1
            ORDER BY ordinal_position
            "#,
        )
        .bind(table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|source| read_error(table_name, source))?;

        rows.iter()
            .map(|row| {
                let name: String = row
                    .try_get("name")
                    .map_err(|source| read_error(table_name, source))?;
                let declared: String = row
                    .try_get("declared")
                    .map_err(|source| read_error(table_name, source))?;
                Ok((name, declared))
            })
            .collect()
    }

    /// Serializes writers to one table name for the duration of a transaction.
    async fn lock_table(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        table_name: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(table_name)
            .execute(&mut **tx)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl Store for PostgresStore {
    fn engine(&self) -> &'static str {
        "postgres"
    }

    async fn write_rows(&self, table_name: &str, schema: &Schema, table: &Table) -> StoreResult<u64> {
        validate_table_name(table_name)?;
        let columns = table.columns().to_vec();
        if columns.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(StoreError::Unavailable)?;
        let create_error = |source| StoreError::Write {
            step: WriteStep::CreateTable,
            source,
        };

        Self::lock_table(&mut tx, table_name)
            .await
            .map_err(create_error)?;
        sqlx::query(&create_table_sql(Dialect::Postgres, table_name, schema, &columns))
            .execute(&mut *tx)
            .await
            .map_err(create_error)?;

        let insert = insert_sql(Dialect::Postgres, table_name, &columns);
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

        // Rows are only appended, so physical order is insertion order.
        let rows = sqlx::query(&format!(
            "SELECT * FROM {} ORDER BY ctid",
            quote_ident(table_name)
        ))
            .fetch_all(&self.pool)
            .await
            .map_err(|source| read_error(table_name, source))?;

        let mut table = Table::with_capacity(columns.clone(), rows.len());
        for row in &rows {
            let mut values = Vec::with_capacity(columns.len());
            for (idx, (column, declared)) in stored.iter().enumerate() {
                let value = decode_value(row, idx, declared).ok_or_else(|| StoreError::Decode {
                    column: column.clone(),
                    declared: declared.clone(),
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
        let create_error = |source| StoreError::Write {
            step: WriteStep::CreateMetricsTable,
            source,
        };

        Self::lock_table(&mut tx, METRICS_TABLE_NAME)
            .await
            .map_err(create_error)?;
        sqlx::query(&create_metrics_sql())
            .execute(&mut *tx)
            .await
            .map_err(create_error)?;

        let insert = insert_metric_sql(Dialect::Postgres);
        for record in records {
            sqlx::query(&insert)
                .bind(record.recorded_at)
                .bind(record.field.as_str())
                .bind(record.metric.as_str())
                .bind(i32::try_from(record.value).unwrap_or(i32::MAX))
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
            "SELECT date, field, metric, value FROM {METRICS_TABLE_NAME} ORDER BY date DESC LIMIT $1"
        ))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|source| read_error(METRICS_TABLE_NAME, source))?;

        rows.iter()
            .map(|row| {
                let read = |source| read_error(METRICS_TABLE_NAME, source);
                let value: i32 = row.try_get("value").map_err(read)?;
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

fn bind_value<'q>(query: PgQuery<'q>, value: &Value, field_type: FieldType) -> PgQuery<'q> {
    match (value, field_type) {
        (Value::Null, FieldType::Integer) => query.bind(None::<i64>),
        (Value::Null, FieldType::Float) => query.bind(None::<f64>),
        (Value::Null, FieldType::Date) => query.bind(None::<NaiveDate>),
        (Value::Null, _) => query.bind(None::<String>),
        (Value::Int(value), FieldType::Float) => query.bind(*value as f64),
        (Value::Int(value), FieldType::String | FieldType::Other) => query.bind(value.to_string()),
        (Value::Int(value), _) => query.bind(*value),
        (Value::Float(value), FieldType::String | FieldType::Other) => {
            query.bind(value.to_string())
        }
        (Value::Float(value), _) => query.bind(*value),
        (Value::Date(value), FieldType::String | FieldType::Other) => query.bind(value.to_string()),
        (Value::Date(value), _) => query.bind(*value),
        (Value::Text(value) | Value::Uuid(value), _) => query.bind(value.clone()),
    }
}

fn decode_value(row: &PgRow, idx: usize, declared: &str) -> Option<Value> {
    match declared {
        "bigint" => row.try_get::<Option<i64>, _>(idx).map(Value::from).ok(),
        "integer" => row
            .try_get::<Option<i32>, _>(idx)
            .map(|value| Value::from(value.map(i64::from)))
            .ok(),
        "smallint" => row
            .try_get::<Option<i16>, _>(idx)
            .map(|value| Value::from(value.map(i64::from)))
            .ok(),
        "double precision" => row.try_get::<Option<f64>, _>(idx).map(Value::from).ok(),
        "real" => row
            .try_get::<Option<f32>, _>(idx)
            .map(|value| Value::from(value.map(f64::from)))
            .ok(),
        "date" => row.try_get::<Option<NaiveDate>, _>(idx).map(Value::from).ok(),
        "text" | "character varying" | "character" => {
            row.try_get::<Option<String>, _>(idx).map(Value::from).ok()
        }
        _ => None,
    }
}
