use std::path::PathBuf;

use thiserror::Error;

use dataops_store::StoreError;

/// Errors emitted by the quality engine and its data sources.
#[derive(Debug, Error)]
pub enum QualityError {
    #[error("configuration error: {0}")]
    Config(#[from] dataops_core::Error),
    #[error("data source not found: {}", .0.display())]
    MissingSource(PathBuf),
    #[error("invalid data source: {0}")]
    InvalidSource(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl QualityError {
    pub fn is_config(&self) -> bool {
        matches!(self, QualityError::Config(err) if err.is_config())
    }

    /// True when the table to check could not be obtained.
    pub fn is_data_source(&self) -> bool {
        match self {
            QualityError::MissingSource(_)
            | QualityError::InvalidSource(_)
            | QualityError::Csv(_) => true,
            QualityError::Store(err) => err.is_data_source(),
            QualityError::Config(_) => false,
        }
    }
}
