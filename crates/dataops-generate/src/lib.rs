//! Synthetic data generation for dataops.
//!
//! Produces tables whose values follow each field's declared type and checks,
//! injecting nulls at a fixed rate so the quality checks have something to
//! find. Persistence to the CSV file sink and the row store is a separate step.

pub mod engine;
pub mod errors;
pub mod generators;
pub mod model;
pub mod output;
pub mod persist;

pub use engine::{SyntheticGenerator, generate};
pub use errors::GenerationError;
pub use model::{GenerateOptions, GenerationReport, GenerationResult};
pub use persist::{PersistReport, persist_table};
