use std::fmt;

use chrono::NaiveDateTime;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use dataops_core::{CheckKind, MetricRecord};

/// Violation counts for one field, in check evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldResult {
    field: String,
    metrics: Vec<(CheckKind, u64)>,
}

impl FieldResult {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            metrics: Vec::new(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn insert(&mut self, kind: CheckKind, value: u64) {
        match self.metrics.iter_mut().find(|(existing, _)| *existing == kind) {
            Some((_, current)) => *current = value,
            None => self.metrics.push((kind, value)),
        }
    }

    pub fn get(&self, kind: CheckKind) -> Option<u64> {
        self.metrics
            .iter()
            .find(|(existing, _)| *existing == kind)
            .map(|(_, value)| *value)
    }

    pub fn metrics(&self) -> &[(CheckKind, u64)] {
        &self.metrics
    }

    pub fn total(&self) -> u64 {
        self.metrics.iter().map(|(_, value)| value).sum()
    }
}

impl Serialize for FieldResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.metrics.len()))?;
        for (kind, value) in &self.metrics {
            map.serialize_entry(kind.metric_name(), value)?;
        }
        map.end()
    }
}

/// `field -> {metric: count}` for every checked field, in schema order.
///
/// Fields missing from the checked table are absent here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckResult {
    fields: Vec<FieldResult>,
}

impl CheckResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: FieldResult) {
        match self.fields.iter_mut().find(|existing| existing.field == result.field) {
            Some(existing) => *existing = result,
            None => self.fields.push(result),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldResult> {
        self.fields.iter().find(|result| result.field == name)
    }

    pub fn get(&self, field: &str, kind: CheckKind) -> Option<u64> {
        self.field(field).and_then(|result| result.get(kind))
    }

    pub fn fields(&self) -> &[FieldResult] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Sum of every violation count.
    pub fn total_violations(&self) -> u64 {
        self.fields.iter().map(FieldResult::total).sum()
    }

    /// Flatten into metrics-store rows sharing one timestamp.
    pub fn to_records(&self, recorded_at: NaiveDateTime) -> Vec<MetricRecord> {
        self.fields
            .iter()
            .flat_map(|result| {
                result
                    .metrics
                    .iter()
                    .map(|(kind, value)| MetricRecord::new(recorded_at, &result.field, *kind, *value))
            })
            .collect()
    }
}

impl Serialize for CheckResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for result in &self.fields {
            map.serialize_entry(&result.field, result)?;
        }
        map.end()
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fields.is_empty() {
            return f.write_str("no checks evaluated");
        }
        for (idx, result) in self.fields.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{}:", result.field)?;
            if result.metrics.is_empty() {
                write!(f, " no checks configured")?;
            }
            for (kind, value) in &result.metrics {
                write!(f, " {}={}", kind.metric_name(), value)?;
            }
        }
        Ok(())
    }
}

/// Non-fatal findings raised while loading or checking a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckWarning {
    /// A schema field has no column in the table.
    MissingField { field: String },
    /// A source value could not be read as the field's declared type.
    UnparsedValue {
        field: String,
        row: usize,
        value: String,
        declared: String,
    },
}

impl fmt::Display for CheckWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckWarning::MissingField { field } => {
                write!(f, "field '{field}' is missing from the data source; skipped")
            }
            CheckWarning::UnparsedValue {
                field,
                row,
                value,
                declared,
            } => write!(
                f,
                "row {row}: value '{value}' of field '{field}' is not a valid {declared}; kept as text"
            ),
        }
    }
}

/// Outcome of one check run.
#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub run_id: String,
    pub checked_at: NaiveDateTime,
    pub rows: usize,
    pub results: CheckResult,
    pub warnings: Vec<CheckWarning>,
    /// Metric records emitted for `results`, in the same order.
    pub records: Vec<MetricRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CheckResult {
        let mut age = FieldResult::new("age");
        age.insert(CheckKind::Range, 2);
        age.insert(CheckKind::NotNull, 1);
        let mut id = FieldResult::new("id");
        id.insert(CheckKind::Unique, 0);
        let mut result = CheckResult::new();
        result.push(age);
        result.push(id);
        result
    }

    #[test]
    fn serializes_as_nested_mapping_in_order() {
        let json = serde_json::to_string(&sample()).expect("json");
        assert_eq!(
            json,
            r#"{"age":{"out_of_range":2,"nulls":1},"id":{"duplicates":0}}"#
        );
    }

    #[test]
    fn totals_and_records_cover_every_metric() {
        let result = sample();
        assert_eq!(result.total_violations(), 3);
        let at = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("timestamp");
        let records = result.to_records(at);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].metric, "out_of_range");
        assert_eq!(records[2].field, "id");
    }

    #[test]
    fn display_lists_metrics_per_field() {
        assert_eq!(
            sample().to_string(),
            "age: out_of_range=2 nulls=1\nid: duplicates=0"
        );
    }
}
