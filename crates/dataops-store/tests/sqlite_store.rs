use anyhow::Result;
use chrono::NaiveDate;
use dataops_core::{
    CheckKind, FieldSpec, FieldType, MetricRecord, Row, Schema, Table, Value,
};
use dataops_store::{SqliteStore, Store, StoreError};

fn customer_schema() -> Schema {
    Schema::new(vec![
        FieldSpec::new("id", FieldType::String),
        FieldSpec::new("age", FieldType::Integer),
        FieldSpec::new("salary", FieldType::Float),
        FieldSpec::new("joined", FieldType::Date),
    ])
    .expect("schema")
}

fn row(id: &str, age: Option<i64>, salary: Option<f64>, joined: Option<NaiveDate>) -> Row {
    let mut row = Row::new();
    row.insert("id".to_string(), Value::from(id));
    row.insert("age".to_string(), Value::from(age));
    row.insert("salary".to_string(), Value::from(salary));
    row.insert("joined".to_string(), Value::from(joined));
    row
}

fn sample_table(schema: &Schema) -> Table {
    let joined = NaiveDate::from_ymd_opt(2021, 5, 17);
    let mut table = Table::for_schema(schema);
    table
        .push_row(row("a", Some(31), Some(1234.5), joined))
        .expect("row a");
    table.push_row(row("b", None, None, None)).expect("row b");
    table
}

#[tokio::test]
async fn writes_and_reads_typed_rows() -> Result<()> {
    let store = SqliteStore::in_memory().await?;
    let schema = customer_schema();
    let table = sample_table(&schema);

    let written = store.write_rows("data_table", &schema, &table).await?;
    assert_eq!(written, 2);

    let read = store.read_rows("data_table").await?;
    assert_eq!(read.columns(), schema.field_names().as_slice());
    assert_eq!(read.len(), 2);
    assert_eq!(read.value(0, "id"), &Value::from("a"));
    assert_eq!(read.value(0, "age"), &Value::Int(31));
    assert_eq!(read.value(0, "salary"), &Value::Float(1234.5));
    assert_eq!(
        read.value(0, "joined"),
        &Value::Date(NaiveDate::from_ymd_opt(2021, 5, 17).expect("date"))
    );
    assert!(read.value(1, "age").is_null());
    assert!(read.value(1, "joined").is_null());
    Ok(())
}

#[tokio::test]
async fn repeated_writes_append() -> Result<()> {
    let store = SqliteStore::in_memory().await?;
    let schema = customer_schema();
    let table = sample_table(&schema);

    store.write_rows("data_table", &schema, &table).await?;
    store.write_rows("data_table", &schema, &table).await?;

    assert_eq!(store.read_rows("data_table").await?.len(), 4);
    Ok(())
}

#[tokio::test]
async fn reading_absent_table_is_a_data_source_error() -> Result<()> {
    let store = SqliteStore::in_memory().await?;
    let err = store.read_rows("nothing_here").await.unwrap_err();
    assert!(matches!(err, StoreError::MissingTable(ref name) if name == "nothing_here"));
    assert!(err.is_data_source());
    Ok(())
}

#[tokio::test]
async fn invalid_table_names_are_rejected() -> Result<()> {
    let store = SqliteStore::in_memory().await?;
    let schema = customer_schema();
    let err = store
        .write_rows("data; DROP TABLE results", &schema, &Table::for_schema(&schema))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidName(_)));
    Ok(())
}

#[tokio::test]
async fn metrics_are_appended_and_read_newest_first() -> Result<()> {
    let store = SqliteStore::in_memory().await?;
    assert!(store.read_metrics(10).await?.is_empty());

    let earlier = NaiveDate::from_ymd_opt(2025, 6, 12)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .expect("timestamp");
    let later = NaiveDate::from_ymd_opt(2025, 6, 13)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .expect("timestamp");

    store
        .append_metrics(&[
            MetricRecord::new(earlier, "age", CheckKind::Range, 7),
            MetricRecord::new(earlier, "id", CheckKind::NotNull, 3),
        ])
        .await?;
    store
        .append_metrics(&[MetricRecord::new(later, "age", CheckKind::Range, 2)])
        .await?;

    let records = store.read_metrics(10).await?;
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].recorded_at, later);
    assert_eq!(records[0].metric, "out_of_range");
    assert_eq!(records[0].value, 2);

    let limited = store.read_metrics(1).await?;
    assert_eq!(limited.len(), 1);
    Ok(())
}

#[tokio::test]
async fn negative_stored_metric_is_a_decode_error() -> Result<()> {
    let store = SqliteStore::in_memory().await?;
    let at = NaiveDate::from_ymd_opt(2025, 6, 12)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .expect("timestamp");
    store
        .append_metrics(&[MetricRecord::new(at, "age", CheckKind::Range, 1)])
        .await?;
    sqlx::query("INSERT INTO results (date, field, metric, value) VALUES (?, 'age', 'out_of_range', -4)")
        .bind(at)
        .execute(store.pool())
        .await?;

    let err = store.read_metrics(10).await.unwrap_err();
    assert!(matches!(err, StoreError::Decode { .. }));
    assert!(err.is_data_source());
    Ok(())
}

#[tokio::test]
async fn file_database_persists_across_connections() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("data.db");
    let schema = customer_schema();

    {
        let store = SqliteStore::open(&path).await?;
        store
            .write_rows("data_table", &schema, &sample_table(&schema))
            .await?;
        store.pool().close().await;
    }

    let store = SqliteStore::open(&path).await?;
    assert_eq!(store.read_rows("data_table").await?.len(), 2);
    Ok(())
}
