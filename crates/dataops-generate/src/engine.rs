use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use dataops_core::{Schema, Table};

use crate::errors::GenerationError;
use crate::generators::{GeneratorContext, generate_value};
use crate::model::{GenerateOptions, GenerationReport, GenerationResult};

/// Entry point for producing synthetic tables from a schema.
#[derive(Debug, Clone, Default)]
pub struct SyntheticGenerator {
    options: GenerateOptions,
}

impl SyntheticGenerator {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Generate `rows` rows whose columns are the schema's fields in order.
    pub fn generate(&self, schema: &Schema, rows: usize) -> Result<GenerationResult, GenerationError> {
        self.options.validate()?;
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let mut rng = match self.options.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };
        let ctx = GeneratorContext {
            null_rate: self.options.null_rate,
            today: self
                .options
                .today
                .unwrap_or_else(|| chrono::Local::now().date_naive()),
            date_window_years: self.options.date_window_years,
        };

        info!(
            run_id = %run_id,
            fields = schema.len(),
            rows,
            seed = self.options.seed,
            "generation started"
        );

        let mut report = GenerationReport::new(run_id.clone(), self.options.seed);
        let mut table = Table::with_capacity(schema.field_names(), rows);
        for _ in 0..rows {
            let mut values = Vec::with_capacity(schema.len());
            for field in schema.fields() {
                let value = generate_value(field, &ctx, &mut rng);
                if value.is_null() {
                    report.record_null(&field.name);
                }
                values.push(value);
            }
            table.push_values(values);
        }

        report.rows = table.len() as u64;
        report.duration_ms = start.elapsed().as_millis() as u64;
        debug!(run_id = %run_id, nulls = ?report.nulls_injected, "null injection summary");
        info!(
            run_id = %run_id,
            rows = report.rows,
            duration_ms = report.duration_ms,
            "generation finished"
        );

        Ok(GenerationResult { table, report })
    }
}

/// Generate `rows` rows with default options.
pub fn generate(schema: &Schema, rows: usize) -> Result<Table, GenerationError> {
    SyntheticGenerator::default()
        .generate(schema, rows)
        .map(|result| result.table)
}
