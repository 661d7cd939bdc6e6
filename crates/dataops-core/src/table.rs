use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::value::Value;

static NULL: Value = Value::Null;

/// A row maps column name to value. Missing keys read as null.
pub type Row = HashMap<String, Value>;

/// Ordered rows sharing one column set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Empty table whose columns are the schema's fields.
    pub fn for_schema(schema: &Schema) -> Self {
        Self::new(schema.field_names())
    }

    pub fn with_capacity(columns: Vec<String>, rows: usize) -> Self {
        Self {
            columns,
            rows: Vec::with_capacity(rows),
        }
    }

    /// Append a row, rejecting keys that are not table columns.
    pub fn push_row(&mut self, row: Row) -> Result<()> {
        if let Some(unknown) = row.keys().find(|key| !self.has_column(key)) {
            return Err(Error::InvalidTable(format!(
                "row has unknown column '{unknown}'"
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Append a row given in column order. Values past the last column are
    /// dropped; missing trailing values read as null.
    pub fn push_values<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = Value>,
    {
        let row = self.columns.iter().cloned().zip(values).collect();
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }

    /// Value at `row` for `column`; null when the row lacks the key.
    pub fn value(&self, row: usize, column: &str) -> &Value {
        self.rows
            .get(row)
            .and_then(|row| row.get(column))
            .unwrap_or(&NULL)
    }

    /// Iterate one column top to bottom, or `None` if the column is absent.
    pub fn column<'a>(&'a self, name: &'a str) -> Option<impl Iterator<Item = &'a Value> + 'a> {
        if !self.has_column(name) {
            return None;
        }
        Some(
            self.rows
                .iter()
                .map(move |row| row.get(name).unwrap_or(&NULL)),
        )
    }
}
