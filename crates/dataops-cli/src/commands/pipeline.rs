use std::path::{Path, PathBuf};

use clap::ValueEnum;
use tracing::info;

use dataops_core::Schema;
use dataops_generate::{
    GenerateOptions, GenerationReport, PersistReport, SyntheticGenerator, persist_table,
};
use dataops_quality::{QualityEngine, QualityReport, load_table_csv, load_table_store};
use dataops_store::Store;

use super::Context;
use crate::CliError;
use crate::alert::{Alert, notifier_for};

/// Subject of the alert sent at the end of a pipeline run.
const REPORT_SUBJECT: &str = "Data Quality Report";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// The row-store table.
    Db,
    /// A CSV file with a header row.
    Csv,
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub rows: usize,
    pub seed: Option<u64>,
    pub table_name: String,
    /// Defaults to `<data_dir>/sample.csv`.
    pub csv_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub generation: GenerationReport,
    pub persisted: PersistReport,
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub generated: GenerateOutcome,
    pub report: QualityReport,
    pub alert: Option<Alert>,
}

/// Checks document at `path`, or the built-in schema.
pub fn load_schema(path: Option<&Path>) -> Result<Schema, CliError> {
    let schema = Schema::load(path)?;
    info!(
        event = "schema_loaded",
        fields = schema.len(),
        source = %path.map(|p| p.display().to_string()).unwrap_or_else(|| "default".to_string())
    );
    Ok(schema)
}

/// Generate rows and write them to the CSV file sink and the row store.
pub async fn generate<S>(
    ctx: &Context,
    store: &S,
    schema: &Schema,
    request: &GenerateRequest,
) -> Result<GenerateOutcome, CliError>
where
    S: Store + ?Sized,
{
    let options = GenerateOptions {
        seed: request.seed,
        ..GenerateOptions::default()
    };
    let result = SyntheticGenerator::new(options).generate(schema, request.rows)?;
    let csv_path = request
        .csv_path
        .clone()
        .unwrap_or_else(|| ctx.config.csv_path());
    let persisted = persist_table(schema, &result.table, &csv_path, store, &request.table_name).await?;
    Ok(GenerateOutcome {
        generation: result.report,
        persisted,
    })
}

/// Check a table from the store or a CSV file and append the metrics.
pub async fn check_quality<S>(
    store: &S,
    schema: &Schema,
    source: SourceKind,
    csv_path: Option<&Path>,
    table_name: &str,
) -> Result<QualityReport, CliError>
where
    S: Store + ?Sized,
{
    let (table, warnings) = match source {
        SourceKind::Db => (load_table_store(store, table_name).await?, Vec::new()),
        SourceKind::Csv => {
            let path = csv_path.ok_or_else(|| {
                CliError::InvalidArgs("CSV path required for csv source".to_string())
            })?;
            let loaded = load_table_csv(path, schema)?;
            (loaded.table, loaded.warnings)
        }
    };

    let report = QualityEngine::default()
        .run_and_store(schema, &table, warnings, store)
        .await?;
    info!(
        event = "metrics_stored",
        run_id = %report.run_id,
        records = report.records.len(),
        violations = report.results.total_violations()
    );
    Ok(report)
}

/// The scheduled workflow: generate, check the stored rows, alert.
pub async fn run_pipeline<S>(
    ctx: &Context,
    store: &S,
    schema: &Schema,
    request: &GenerateRequest,
) -> Result<PipelineOutcome, CliError>
where
    S: Store + ?Sized,
{
    info!(event = "pipeline_started", rows = request.rows, table = %request.table_name);
    let generated = generate(ctx, store, schema, request).await?;
    let report = check_quality(store, schema, SourceKind::Db, None, &request.table_name).await?;

    let violations = report.results.total_violations();
    let alert = if ctx.config.alert.only_on_violations && violations == 0 {
        info!(event = "alert_skipped", reason = "no violations");
        None
    } else {
        let body = format!(
            "Quality checks completed for {} row(s) with {violations} violation(s).\n{}",
            report.rows, report.results
        );
        Some(send_alert(ctx, REPORT_SUBJECT, &body)?)
    };

    info!(event = "pipeline_finished", run_id = %report.run_id, violations);
    Ok(PipelineOutcome {
        generated,
        report,
        alert,
    })
}

pub fn send_alert(ctx: &Context, subject: &str, body: &str) -> Result<Alert, CliError> {
    let alert = Alert::new(subject, body, &ctx.config.alert.recipient);
    notifier_for(&ctx.config.alert, &ctx.config.log_dir).notify(&alert)?;
    Ok(alert)
}

#[cfg(test)]
mod tests {
    use dataops_core::DEFAULT_TABLE_NAME;
    use dataops_store::SqliteStore;

    use super::*;
    use crate::workspace::{AppConfig, WorkspacePaths};

    fn context(root: &Path) -> Context {
        let paths = WorkspacePaths::new(root.to_path_buf());
        let config = AppConfig::default_for(&paths);
        Context { paths, config }
    }

    fn request(rows: usize) -> GenerateRequest {
        GenerateRequest {
            rows,
            seed: Some(17),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            csv_path: None,
        }
    }

    #[tokio::test]
    async fn pipeline_generates_checks_and_alerts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(dir.path());
        let store = SqliteStore::in_memory().await.expect("store");
        let schema = Schema::default_customer();

        let outcome = run_pipeline(&ctx, &store, &schema, &request(30))
            .await
            .expect("pipeline");

        assert_eq!(outcome.generated.persisted.rows_stored, 30);
        assert!(ctx.config.csv_path().exists());
        assert_eq!(outcome.report.rows, 30);
        assert_eq!(outcome.report.results.len(), schema.len());

        let stored = store.read_metrics(100).await.expect("metrics");
        assert_eq!(stored.len(), outcome.report.records.len());

        let alert = outcome.alert.expect("alert sent");
        assert_eq!(alert.subject, REPORT_SUBJECT);
        let outbox = std::fs::read_to_string(ctx.config.log_dir.join("alerts.ndjson")).expect("outbox");
        assert_eq!(outbox.lines().count(), 1);
    }

    #[tokio::test]
    async fn csv_source_requires_a_path() {
        let store = SqliteStore::in_memory().await.expect("store");
        let err = check_quality(
            &store,
            &Schema::default_customer(),
            SourceKind::Csv,
            None,
            DEFAULT_TABLE_NAME,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::InvalidArgs(_)));
    }

    #[tokio::test]
    async fn csv_source_is_checked_and_recorded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(dir.path());
        let store = SqliteStore::in_memory().await.expect("store");
        let schema = Schema::default_customer();
        let generated = generate(&ctx, &store, &schema, &request(12)).await.expect("generate");

        let report = check_quality(
            &store,
            &schema,
            SourceKind::Csv,
            Some(&generated.persisted.csv_path),
            DEFAULT_TABLE_NAME,
        )
        .await
        .expect("check");
        assert_eq!(report.rows, 12);
        assert!(report.warnings.is_empty());
    }
}
