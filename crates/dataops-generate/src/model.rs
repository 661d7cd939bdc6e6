use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use dataops_core::Table;

use crate::errors::GenerationError;

/// Probability that a nullable generated value is replaced by null.
pub const DEFAULT_NULL_RATE: f64 = 0.1;

/// Width of the window dates are drawn from, ending today.
pub const DEFAULT_DATE_WINDOW_YEARS: u32 = 10;

/// Options for the synthetic generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Seed for reproducible output; a fresh OS seed is used when absent.
    pub seed: Option<u64>,
    /// Fault-injection rate for nullable branches.
    pub null_rate: f64,
    /// Last day of the date window; defaults to the local date.
    pub today: Option<NaiveDate>,
    pub date_window_years: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            seed: None,
            null_rate: DEFAULT_NULL_RATE,
            today: None,
            date_window_years: DEFAULT_DATE_WINDOW_YEARS,
        }
    }
}

impl GenerateOptions {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        if !(0.0..=1.0).contains(&self.null_rate) {
            return Err(GenerationError::InvalidOptions(format!(
                "null_rate must be within [0, 1], got {}",
                self.null_rate
            )));
        }
        Ok(())
    }
}

/// Summary of a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub rows: u64,
    pub seed: Option<u64>,
    /// Nulls injected per field.
    pub nulls_injected: BTreeMap<String, u64>,
    pub duration_ms: u64,
}

impl GenerationReport {
    pub fn new(run_id: String, seed: Option<u64>) -> Self {
        Self {
            run_id,
            rows: 0,
            seed,
            nulls_injected: BTreeMap::new(),
            duration_ms: 0,
        }
    }

    pub fn record_null(&mut self, field: &str) {
        *self.nulls_injected.entry(field.to_string()).or_insert(0) += 1;
    }
}

/// Generated table plus its report.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub table: Table,
    pub report: GenerationReport,
}
