use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, warn};

use dataops_core::{FieldType, Schema, Table, Value};
use dataops_store::Store;

use crate::errors::QualityError;
use crate::model::CheckWarning;

/// A table read from a CSV file plus the values that had to be kept as text.
#[derive(Debug, Clone)]
pub struct CsvSource {
    pub table: Table,
    pub warnings: Vec<CheckWarning>,
}

/// Read a CSV file with a header row, typing each column by the schema.
///
/// Columns not named in the schema are read as text. Empty cells and `null`
/// become nulls.
pub fn load_table_csv(path: &Path, schema: &Schema) -> Result<CsvSource, QualityError> {
    if !path.is_file() {
        return Err(QualityError::MissingSource(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();

    let mut seen = HashSet::new();
    if let Some(duplicate) = columns.iter().find(|column| !seen.insert(column.as_str())) {
        return Err(QualityError::InvalidSource(format!(
            "{}: duplicate column '{duplicate}'",
            path.display()
        )));
    }

    let types: Vec<FieldType> = columns
        .iter()
        .map(|column| {
            schema
                .field(column)
                .map(|field| field.field_type)
                .unwrap_or(FieldType::String)
        })
        .collect();

    let mut table = Table::new(columns.clone());
    let mut warnings = Vec::new();
    for (row_index, record) in reader.records().enumerate() {
        let record = record?;
        let mut values = Vec::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            let raw = record.get(idx).unwrap_or_default();
            let value = match parse_value(types[idx], raw) {
                Ok(value) => value,
                Err(text) => {
                    let warning = CheckWarning::UnparsedValue {
                        field: column.clone(),
                        row: row_index,
                        value: text.clone(),
                        declared: types[idx].to_string(),
                    };
                    warn!(path = %path.display(), "{warning}");
                    warnings.push(warning);
                    Value::Text(text)
                }
            };
            values.push(value);
        }
        table.push_values(values);
    }

    debug!(path = %path.display(), rows = table.len(), "csv source loaded");
    Ok(CsvSource { table, warnings })
}

/// Read every row of `table_name` from the row store.
pub async fn load_table_store<S>(store: &S, table_name: &str) -> Result<Table, QualityError>
where
    S: Store + ?Sized,
{
    let table = store.read_rows(table_name).await?;
    debug!(table = %table_name, engine = store.engine(), rows = table.len(), "store source loaded");
    Ok(table)
}

/// Parse one cell; on failure the trimmed text is returned as the error.
///
/// Surrounding whitespace is ignored for null detection and typed parsing, but
/// text cells keep it.
fn parse_value(field_type: FieldType, raw: &str) -> Result<Value, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        return Ok(Value::Null);
    }

    match field_type {
        FieldType::Integer => trimmed
            .parse::<i64>()
            .ok()
            .or_else(|| trimmed.parse::<f64>().ok().and_then(exact_i64))
            .map(Value::Int)
            .ok_or_else(|| trimmed.to_string()),
        FieldType::Float => match trimmed.parse::<f64>() {
            Ok(value) if value.is_nan() => Ok(Value::Null),
            Ok(value) if value.is_finite() => Ok(Value::Float(value)),
            _ => Err(trimmed.to_string()),
        },
        FieldType::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(Value::Date)
            .map_err(|_| trimmed.to_string()),
        FieldType::String | FieldType::Other => Ok(Value::Text(raw.to_string())),
    }
}

/// Integral floats such as `25.0`, when they fit in an `i64`.
fn exact_i64(value: f64) -> Option<i64> {
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.fract() == 0.0 && in_range).then_some(value as i64)
}
