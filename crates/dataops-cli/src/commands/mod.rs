mod logs;
mod pipeline;

pub use logs::{LogFile, tail_lines};
pub use pipeline::{
    GenerateRequest, SourceKind, check_quality, generate, load_schema, run_pipeline, send_alert,
};

use dataops_store::{SqliteStore, Store};
use tracing::info;

use crate::CliError;
use crate::workspace::{AppConfig, DatabaseKind, WorkspacePaths};

/// Resolved configuration shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub paths: WorkspacePaths,
    pub config: AppConfig,
}

impl Context {
    /// Open the configured result store.
    pub async fn open_store(&self) -> Result<Box<dyn Store>, CliError> {
        let database = &self.config.database;
        info!(event = "store_opening", url = %database.redacted_url());
        match database.kind {
            DatabaseKind::Sqlite => {
                if let Some(parent) = database
                    .path
                    .parent()
                    .filter(|parent| !parent.as_os_str().is_empty())
                {
                    std::fs::create_dir_all(parent)?;
                }
                Ok(Box::new(SqliteStore::open(&database.path).await?))
            }
            DatabaseKind::Postgres => Ok(dataops_store::connect(&database.url()).await?),
        }
    }
}
