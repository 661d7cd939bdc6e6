use std::env;

use anyhow::{Context, Result};
use dataops_core::{Schema, Table, Value};
use dataops_store::{PostgresStore, Store};

fn database_url() -> Option<String> {
    env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .ok()
}

#[tokio::test]
async fn round_trips_rows_through_postgres() -> Result<()> {
    let Some(url) = database_url() else {
        eprintln!("skipping: set TEST_DATABASE_URL or DATABASE_URL for integration tests");
        return Ok(());
    };

    let store = PostgresStore::connect(&url)
        .await
        .context("connecting to Postgres")?;
    sqlx::query("DROP TABLE IF EXISTS dataops_it_rows")
        .execute(store.pool())
        .await?;

    let schema = Schema::default_customer();
    let mut table = Table::for_schema(&schema);
    let mut row = dataops_core::Row::new();
    row.insert("id".to_string(), Value::from("c-1"));
    row.insert("email".to_string(), Value::from("ana@example.com"));
    row.insert("age".to_string(), Value::Int(42));
    table.push_row(row)?;
    for age in [30_i64, 20, 50] {
        let mut row = dataops_core::Row::new();
        row.insert("id".to_string(), Value::from(format!("c-{age}")));
        row.insert("age".to_string(), Value::Int(age));
        table.push_row(row)?;
    }

    store.write_rows("dataops_it_rows", &schema, &table).await?;
    let read = store.read_rows("dataops_it_rows").await?;

    assert_eq!(read.len(), 4);
    assert_eq!(read.value(0, "age"), &Value::Int(42));
    assert!(read.value(0, "salary").is_null());
    assert!(read.value(0, "name").is_null());
    let ages: Vec<_> = read.column("age").context("age column")?.cloned().collect();
    assert_eq!(
        ages,
        vec![Value::Int(42), Value::Int(30), Value::Int(20), Value::Int(50)]
    );
    Ok(())
}
