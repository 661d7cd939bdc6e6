//! Result store adapters.
//!
//! Persists generated rows into a row table and check outcomes into the
//! append-only metrics table, addressed by logical table name.

pub mod adapter;
pub mod connect;
pub mod errors;
pub mod postgres;
pub mod sql;
pub mod sqlite;

pub use adapter::Store;
pub use connect::{connect, detect_engine};
pub use errors::{StoreError, StoreResult, WriteStep};
pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;
