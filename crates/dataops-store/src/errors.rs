use std::fmt;

use thiserror::Error;

/// Write step that failed, reported with `StoreError::Write`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStep {
    CreateTable,
    InsertRows,
    CreateMetricsTable,
    InsertMetrics,
    Commit,
}

impl fmt::Display for WriteStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WriteStep::CreateTable => "create row table",
            WriteStep::InsertRows => "insert rows",
            WriteStep::CreateMetricsTable => "create metrics table",
            WriteStep::InsertMetrics => "insert metrics",
            WriteStep::Commit => "commit",
        };
        f.write_str(label)
    }
}

/// Errors emitted by store adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot be reached or a connection cannot be acquired.
    #[error("store unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),
    /// A write was rejected; nothing from the failing call was committed.
    #[error("failed to {step}: {source}")]
    Write {
        step: WriteStep,
        #[source]
        source: sqlx::Error,
    },
    /// Reading rows or metrics failed.
    #[error("failed to read '{table}': {source}")]
    Read {
        table: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("table '{0}' does not exist")]
    MissingTable(String),
    #[error("invalid table name: '{0}'")]
    InvalidName(String),
    #[error("cannot decode column '{column}' declared as '{declared}'")]
    Decode { column: String, declared: String },
    #[error("unsupported database: {0}")]
    Unsupported(String),
}

impl StoreError {
    /// True when the requested data could not be read (as opposed to written).
    pub fn is_data_source(&self) -> bool {
        matches!(
            self,
            StoreError::MissingTable(_) | StoreError::Read { .. } | StoreError::Decode { .. }
        )
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
