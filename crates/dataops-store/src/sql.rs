use dataops_core::{FieldType, METRICS_TABLE_NAME, Schema};

use crate::errors::{StoreError, StoreResult};

/// SQL flavour of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl Dialect {
    pub fn column_type(&self, field_type: FieldType) -> &'static str {
        match (self, field_type) {
            (_, FieldType::String) | (_, FieldType::Other) => "TEXT",
            (Dialect::Sqlite, FieldType::Integer) => "INTEGER",
            (Dialect::Postgres, FieldType::Integer) => "BIGINT",
            (Dialect::Sqlite, FieldType::Float) => "REAL",
            (Dialect::Postgres, FieldType::Float) => "DOUBLE PRECISION",
            (_, FieldType::Date) => "DATE",
        }
    }

    fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Sqlite => "?".to_string(),
            Dialect::Postgres => format!("${index}"),
        }
    }
}

/// Map a stored column declaration back to a field type.
pub fn field_type_for_declared(declared: &str) -> FieldType {
    let normalized = declared
        .split('(')
        .next()
        .unwrap_or(declared)
        .trim()
        .to_lowercase();
    match normalized.as_str() {
        "integer" | "int" | "bigint" | "smallint" | "int2" | "int4" | "int8" => FieldType::Integer,
        "real" | "float" | "double" | "double precision" | "float4" | "float8" => FieldType::Float,
        "date" => FieldType::Date,
        _ => FieldType::String,
    }
}

/// Reject table names that cannot be used verbatim as identifiers.
pub fn validate_table_name(name: &str) -> StoreResult<()> {
    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Declared type of a column: the schema field's type, else text.
pub fn column_field_type(schema: &Schema, column: &str) -> FieldType {
    schema
        .field(column)
        .map(|field| field.field_type)
        .unwrap_or(FieldType::Other)
}

pub fn create_table_sql(dialect: Dialect, table: &str, schema: &Schema, columns: &[String]) -> String {
    let definitions = columns
        .iter()
        .map(|column| {
            format!(
                "{} {}",
                quote_ident(column),
                dialect.column_type(column_field_type(schema, column))
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE IF NOT EXISTS {} ({definitions})", quote_ident(table))
}

pub fn insert_sql(dialect: Dialect, table: &str, columns: &[String]) -> String {
    let names = columns
        .iter()
        .map(|column| quote_ident(column))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|idx| dialect.placeholder(idx))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({names}) VALUES ({placeholders})",
        quote_ident(table)
    )
}

pub fn create_metrics_sql() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {METRICS_TABLE_NAME} (date TIMESTAMP, field TEXT, metric TEXT, value INTEGER)"
    )
}

pub fn insert_metric_sql(dialect: Dialect) -> String {
    format!(
        "INSERT INTO {METRICS_TABLE_NAME} (date, field, metric, value) VALUES ({}, {}, {}, {})",
        dialect.placeholder(1),
        dialect.placeholder(2),
        dialect.placeholder(3),
        dialect.placeholder(4)
    )
}
