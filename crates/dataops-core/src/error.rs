use thiserror::Error;

/// Core error type shared across dataops crates.
///
/// Every variant except `InvalidTable` is a configuration error: it is raised
/// while a schema document is loaded, before any row is generated or checked.
#[derive(Debug, Error)]
pub enum Error {
    /// The schema document violates structural invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// A `regex` check does not compile.
    #[error("invalid regex for field '{field}': {source}")]
    InvalidRegex {
        field: String,
        #[source]
        source: regex::Error,
    },
    /// A `range` check has `min > max` or non-finite bounds.
    #[error("invalid range for field '{field}': [{min}, {max}]")]
    InvalidRange { field: String, min: f64, max: f64 },
    /// A row does not conform to its table's columns.
    #[error("invalid table: {0}")]
    InvalidTable(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns true for errors raised while loading configuration.
    pub fn is_config(&self) -> bool {
        !matches!(self, Error::InvalidTable(_))
    }
}

/// Convenience alias for results returned by dataops crates.
pub type Result<T> = std::result::Result<T, Error>;
