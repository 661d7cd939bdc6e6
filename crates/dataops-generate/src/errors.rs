use thiserror::Error;

use dataops_store::StoreError;

/// Errors emitted by the generator and its persistence sinks.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl GenerationError {
    /// True when values were produced but could not be persisted.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            GenerationError::Io(_) | GenerationError::Csv(_) | GenerationError::Store(_)
        )
    }
}
