use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A named validation rule that can be configured on a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    NotNull,
    Regex,
    Range,
    Positive,
    Unique,
}

impl CheckKind {
    /// Name of the metric a check produces in results and the metrics store.
    pub fn metric_name(&self) -> &'static str {
        match self {
            CheckKind::NotNull => "nulls",
            CheckKind::Regex => "invalid_format",
            CheckKind::Range => "out_of_range",
            CheckKind::Positive => "non_positive",
            CheckKind::Unique => "duplicates",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.metric_name())
    }
}

/// One row of the append-only metrics log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub recorded_at: NaiveDateTime,
    pub field: String,
    pub metric: String,
    pub value: u64,
}

impl MetricRecord {
    pub fn new(recorded_at: NaiveDateTime, field: &str, kind: CheckKind, value: u64) -> Self {
        Self {
            recorded_at,
            field: field.to_string(),
            metric: kind.metric_name().to_string(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_carry_metric_names() {
        let at = chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .expect("timestamp");
        let record = MetricRecord::new(at, "age", CheckKind::Range, 4);
        assert_eq!(record.metric, "out_of_range");
        assert_eq!(CheckKind::NotNull.to_string(), "nulls");
        assert_eq!(CheckKind::Unique.metric_name(), "duplicates");
    }
}
