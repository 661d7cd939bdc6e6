//! Core contracts for dataops.
//!
//! Defines the declarative field schema shared by the generator and the
//! quality engine, the typed value/table model both operate on, and the
//! metric records persisted after a check run.

pub mod document;
pub mod error;
pub mod metrics;
pub mod schema;
pub mod table;
pub mod validation;
pub mod value;

pub use document::{ChecksDocument, FieldDocument, SchemaDocument, schema_document_json_schema};
pub use error::{Error, Result};
pub use metrics::{CheckKind, MetricRecord};
pub use schema::{Checks, FieldSpec, FieldType, Pattern, Range, Schema};
pub use table::{Row, Table};
pub use validation::validate_document;
pub use value::Value;

/// Default logical name of the row-store table.
pub const DEFAULT_TABLE_NAME: &str = "data_table";

/// Name of the append-only metrics table.
pub const METRICS_TABLE_NAME: &str = "results";
