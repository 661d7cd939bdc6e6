mod alert;
mod commands;
mod logging;
mod services;
mod workspace;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use dataops_core::{DEFAULT_TABLE_NAME, Error as CoreError, schema_document_json_schema};
use dataops_generate::GenerationError;
use dataops_quality::QualityError;
use dataops_store::{Store, StoreError};
use thiserror::Error;

use alert::AlertError;
use commands::{Context, GenerateRequest, LogFile, SourceKind};
use logging::{LoggingError, init_logging};
use services::{Service, ServiceError, ServiceManager, StartOutcome, StopOutcome};
use workspace::{WorkspaceError, WorkspacePaths, load_or_create_config};

#[derive(Debug, Error)]
enum CliError {
    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),
    #[error("{0}")]
    Logging(#[from] LoggingError),
    #[error("{0}")]
    Config(#[from] CoreError),
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("quality check failed: {0}")]
    Quality(#[from] QualityError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("service error: {0}")]
    Service(#[from] ServiceError),
    #[error("alert failed: {0}")]
    Alert(#[from] AlertError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    InvalidArgs(String),
}

#[derive(Parser, Debug)]
#[command(name = "dataops", version, about = "DataOps CLI for data quality pipelines")]
struct Cli {
    /// Enable debug logging.
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,
    /// Project root holding the `.dataops` directory.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the `.dataops` directories and default configuration.
    Init,
    /// Generate synthetic data into the CSV file and the row store.
    Generate(GenerateArgs),
    /// Run data quality checks and record the metrics.
    CheckQuality(CheckQualityArgs),
    /// Generate, check and alert in one run.
    Run(GenerateArgs),
    /// Show the most recent quality metrics.
    Report(ReportArgs),
    /// Send an alert through the configured notifier.
    Alert(AlertArgs),
    /// Start the scheduler and dashboard services.
    Start,
    /// Stop the scheduler and dashboard services.
    Stop,
    /// Show whether the services are running.
    Status,
    /// Print the last lines of a log file.
    Logs(LogsArgs),
    /// Print the effective checks document.
    Schema(SchemaArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Number of rows to generate.
    #[arg(short = 'n', long, default_value_t = 100)]
    rows: usize,
    /// Checks document (YAML or JSON); the built-in schema when absent.
    #[arg(long)]
    checks_config: Option<PathBuf>,
    /// Seed for reproducible data.
    #[arg(long)]
    seed: Option<u64>,
    /// Row-store table to append to.
    #[arg(long, default_value = DEFAULT_TABLE_NAME)]
    table_name: String,
    /// CSV output path; `<data_dir>/sample.csv` when absent.
    #[arg(long)]
    csv_path: Option<PathBuf>,
}

impl GenerateArgs {
    fn request(&self) -> GenerateRequest {
        GenerateRequest {
            rows: self.rows,
            seed: self.seed,
            table_name: self.table_name.clone(),
            csv_path: self.csv_path.clone(),
        }
    }
}

#[derive(Args, Debug)]
struct CheckQualityArgs {
    #[arg(long, value_enum, default_value_t = SourceKind::Db)]
    source: SourceKind,
    /// CSV file to check; required with `--source csv`.
    #[arg(long)]
    csv_path: Option<PathBuf>,
    #[arg(long, default_value = DEFAULT_TABLE_NAME)]
    table_name: String,
    #[arg(long)]
    checks_config: Option<PathBuf>,
    /// Print the full report as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// Number of metric records to show.
    #[arg(long, default_value_t = 10)]
    limit: usize,
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct AlertArgs {
    #[arg(long)]
    subject: String,
    #[arg(long)]
    body: String,
}

#[derive(Args, Debug)]
struct LogsArgs {
    #[arg(long, value_enum, default_value_t = LogFile::DataQuality)]
    file: LogFile,
    #[arg(long, default_value_t = 10)]
    lines: usize,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    #[arg(long)]
    checks_config: Option<PathBuf>,
    /// Print the JSON Schema of the checks document instead.
    #[arg(long, default_value_t = false)]
    json_schema: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(event = "command_failed", error = %err);
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    dotenv::dotenv().ok();
    let paths = WorkspacePaths::new(cli.root.clone());
    let mut config = load_or_create_config(&paths)?;
    config.apply_env(|key| std::env::var(key).ok());
    init_logging(&config.quality_log_path(), cli.verbose)?;
    tracing::debug!(event = "config_loaded", path = %paths.config_path().display(), database = %config.database.redacted_url());

    let ctx = Context { paths, config };
    match cli.command {
        Command::Init => run_init(&ctx),
        Command::Generate(args) => run_generate(&ctx, args).await,
        Command::CheckQuality(args) => run_check_quality(&ctx, args).await,
        Command::Run(args) => run_scheduled(&ctx, args).await,
        Command::Report(args) => run_report(&ctx, args).await,
        Command::Alert(args) => {
            commands::send_alert(&ctx, &args.subject, &args.body)?;
            println!("Alert sent: {}", args.subject);
            Ok(())
        }
        Command::Start => run_start(&ctx),
        Command::Stop => run_stop(&ctx),
        Command::Status => {
            let manager = service_manager(&ctx);
            for service in Service::ALL {
                let status = manager.status(service);
                tracing::info!(event = "service_status", service = %service, status = %status);
                println!("{service}: {status}");
            }
            Ok(())
        }
        Command::Logs(args) => {
            let path = args.file.path(&ctx.config);
            if !path.exists() {
                return Err(CliError::InvalidArgs(format!(
                    "log file {} does not exist",
                    path.display()
                )));
            }
            for line in commands::tail_lines(&path, args.lines)? {
                println!("{line}");
            }
            Ok(())
        }
        Command::Schema(args) => {
            if args.json_schema {
                println!("{}", serde_json::to_string_pretty(&schema_document_json_schema())?);
            } else {
                let schema = commands::load_schema(args.checks_config.as_deref())?;
                print!("{}", schema.to_document().to_yaml_string()?);
            }
            Ok(())
        }
    }
}

fn run_init(ctx: &Context) -> Result<(), CliError> {
    tracing::info!(event = "init_started", root = %ctx.paths.root.display());
    for dir in [&ctx.config.data_dir, &ctx.config.log_dir, &ctx.config.state_dir] {
        std::fs::create_dir_all(dir)?;
    }
    tracing::info!(event = "init_finished", config = %ctx.paths.config_path().display());
    println!(
        "Initialization complete. Configuration: {}",
        ctx.paths.config_path().display()
    );
    Ok(())
}

async fn run_generate(ctx: &Context, args: GenerateArgs) -> Result<(), CliError> {
    let schema = commands::load_schema(args.checks_config.as_deref())?;
    let store = ctx.open_store().await?;
    let outcome = commands::generate(ctx, store.as_ref(), &schema, &args.request()).await?;
    println!(
        "Synthetic data generated: {} row(s) -> {} and table '{}'",
        outcome.generation.rows,
        outcome.persisted.csv_path.display(),
        outcome.persisted.table_name
    );
    Ok(())
}

async fn run_check_quality(ctx: &Context, args: CheckQualityArgs) -> Result<(), CliError> {
    if args.source == SourceKind::Csv && args.csv_path.is_none() {
        return Err(CliError::InvalidArgs(
            "CSV path required for csv source".to_string(),
        ));
    }
    let schema = commands::load_schema(args.checks_config.as_deref())?;
    let store = ctx.open_store().await?;
    let report = commands::check_quality(
        store.as_ref(),
        &schema,
        args.source,
        args.csv_path.as_deref(),
        &args.table_name,
    )
    .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for warning in &report.warnings {
            println!("warning: {warning}");
        }
        println!("Quality Check Results:\n{}", report.results);
    }
    Ok(())
}

async fn run_scheduled(ctx: &Context, args: GenerateArgs) -> Result<(), CliError> {
    let schema = commands::load_schema(args.checks_config.as_deref())?;
    let store = ctx.open_store().await?;
    let outcome = commands::run_pipeline(ctx, store.as_ref(), &schema, &args.request()).await?;
    println!(
        "Run {} finished: {} row(s), {} violation(s)",
        outcome.report.run_id,
        outcome.report.rows,
        outcome.report.results.total_violations()
    );
    println!("{}", outcome.report.results);
    if let Some(alert) = outcome.alert {
        println!("Alert sent: {}", alert.subject);
    }
    Ok(())
}

async fn run_report(ctx: &Context, args: ReportArgs) -> Result<(), CliError> {
    let store = ctx.open_store().await?;
    let records = store.read_metrics(args.limit).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No quality metrics recorded yet.");
        return Ok(());
    }
    println!("{:<20} {:<16} {:<16} {:>8}", "date", "field", "metric", "value");
    for record in &records {
        println!(
            "{:<20} {:<16} {:<16} {:>8}",
            record.recorded_at.format("%Y-%m-%d %H:%M:%S"),
            record.field,
            record.metric,
            record.value
        );
    }
    Ok(())
}

fn service_manager(ctx: &Context) -> ServiceManager {
    ServiceManager::new(ctx.config.state_dir.clone(), ctx.config.log_dir.clone())
}

fn run_start(ctx: &Context) -> Result<(), CliError> {
    let manager = service_manager(ctx);
    for service in Service::ALL {
        match manager.start(service, &ctx.config.services)? {
            StartOutcome::Started(pid) => println!("{service}: started (pid {pid})"),
            StartOutcome::AlreadyRunning(pid) => println!("{service}: already running (pid {pid})"),
            StartOutcome::NotConfigured => println!("{service}: not configured, skipped"),
        }
    }
    Ok(())
}

fn run_stop(ctx: &Context) -> Result<(), CliError> {
    let manager = service_manager(ctx);
    for service in Service::ALL {
        match manager.stop(service)? {
            StopOutcome::Stopped(pid) => println!("{service}: stopped (pid {pid})"),
            StopOutcome::NotRunning => println!("{service}: no running process found"),
        }
    }
    Ok(())
}
