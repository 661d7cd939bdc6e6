use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};

use dataops_core::{Schema, Table, Value};
use dataops_store::Store;

use crate::checks::evaluate;
use crate::errors::QualityError;
use crate::model::{CheckResult, CheckWarning, FieldResult, QualityReport};
use crate::reporter::{ReportEvent, Reporter, TracingReporter};

/// Evaluates a schema's configured checks against tables.
#[derive(Clone)]
pub struct QualityEngine {
    reporter: Arc<dyn Reporter>,
}

impl Default for QualityEngine {
    fn default() -> Self {
        Self::new(Arc::new(TracingReporter))
    }
}

impl std::fmt::Debug for QualityEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QualityEngine").finish_non_exhaustive()
    }
}

impl QualityEngine {
    pub fn new(reporter: Arc<dyn Reporter>) -> Self {
        Self { reporter }
    }

    /// Violation counts for every field of `schema` present in `table`.
    ///
    /// Depends only on its inputs; missing fields are reported as warnings.
    pub fn check(&self, schema: &Schema, table: &Table) -> CheckResult {
        self.evaluate(schema, table).0
    }

    /// Check `table` and build the metric records for the run.
    ///
    /// `source_warnings` are findings from loading the table and are carried
    /// into the report ahead of the engine's own warnings.
    pub fn run(
        &self,
        schema: &Schema,
        table: &Table,
        source_warnings: Vec<CheckWarning>,
    ) -> QualityReport {
        let run_id = uuid::Uuid::new_v4().to_string();
        self.reporter.report(&ReportEvent::RunStarted {
            run_id: run_id.clone(),
            fields: schema.len(),
            rows: table.len(),
        });
        for warning in &source_warnings {
            self.reporter.report(&ReportEvent::Warning(warning.clone()));
        }

        let (results, drift) = self.evaluate(schema, table);
        let checked_at = now();
        let records = results.to_records(checked_at);
        self.reporter.report(&ReportEvent::RunFinished {
            run_id: run_id.clone(),
            violations: results.total_violations(),
        });

        let mut warnings = source_warnings;
        warnings.extend(drift);
        QualityReport {
            run_id,
            checked_at,
            rows: table.len(),
            results,
            warnings,
            records,
        }
    }

    /// Check `table` and append the run's metrics to `store`.
    pub async fn run_and_store<S>(
        &self,
        schema: &Schema,
        table: &Table,
        source_warnings: Vec<CheckWarning>,
        store: &S,
    ) -> Result<QualityReport, QualityError>
    where
        S: Store + ?Sized,
    {
        let report = self.run(schema, table, source_warnings);
        store.append_metrics(&report.records).await?;
        Ok(report)
    }

    fn evaluate(&self, schema: &Schema, table: &Table) -> (CheckResult, Vec<CheckWarning>) {
        let mut results = CheckResult::new();
        let mut warnings = Vec::new();

        for field in schema.fields() {
            // Zero rows: every configured check reports zero, even without a header.
            if !table.is_empty() && !table.has_column(&field.name) {
                let warning = CheckWarning::MissingField {
                    field: field.name.clone(),
                };
                self.reporter.report(&ReportEvent::Warning(warning.clone()));
                warnings.push(warning);
                continue;
            }

            let mut field_result = FieldResult::new(field.name.clone());
            for kind in field.checks.kinds(field.field_type) {
                let count = match table.column(&field.name) {
                    Some(column) => evaluate(field, kind, column),
                    None => evaluate(field, kind, std::iter::empty::<&Value>()),
                };
                if let Some(value) = count {
                    self.reporter.report(&ReportEvent::Metric {
                        field: field.name.clone(),
                        kind,
                        value,
                    });
                    field_result.insert(kind, value);
                }
            }
            results.push(field_result);
        }

        (results, warnings)
    }
}

/// Check `table` against `schema` with the default reporter.
pub fn check(schema: &Schema, table: &Table) -> CheckResult {
    QualityEngine::default().check(schema, table)
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}
