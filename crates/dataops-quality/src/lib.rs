//! Data quality checks for dataops.
//!
//! Evaluates the checks configured on each schema field against a table and
//! reports one violation count per check. Tables come from the row store or a
//! CSV file; observability goes through an injected [`Reporter`].

pub mod checks;
pub mod engine;
pub mod errors;
pub mod model;
pub mod reporter;
pub mod source;

pub use engine::{QualityEngine, check};
pub use errors::QualityError;
pub use model::{CheckResult, CheckWarning, FieldResult, QualityReport};
pub use reporter::{MemoryReporter, ReportEvent, Reporter, TracingReporter};
pub use source::{CsvSource, load_table_csv, load_table_store};
