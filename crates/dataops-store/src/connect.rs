use crate::adapter::Store;
use crate::errors::{StoreError, StoreResult};
use crate::postgres::PostgresStore;
use crate::sqlite::SqliteStore;

/// Engine identifier for a connection string.
pub fn detect_engine(url: &str) -> StoreResult<&'static str> {
    if url.starts_with("sqlite:") {
        Ok("sqlite")
    } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        Ok("postgres")
    } else {
        Err(StoreError::Unsupported(url.to_string()))
    }
}

/// Open the store matching the connection string's scheme.
pub async fn connect(url: &str) -> StoreResult<Box<dyn Store>> {
    match detect_engine(url)? {
        "sqlite" => Ok(Box::new(SqliteStore::connect(url).await?)),
        _ => Ok(Box::new(PostgresStore::connect(url).await?)),
    }
}
