use std::sync::Arc;

use dataops_core::{CheckKind, FieldSpec, FieldType, Row, Schema, Table, Value};
use dataops_generate::{GenerateOptions, SyntheticGenerator};
use dataops_quality::{
    CheckWarning, MemoryReporter, QualityEngine, ReportEvent, check,
};

fn single_column(name: &str, values: Vec<Value>) -> Table {
    let mut table = Table::new(vec![name.to_string()]);
    for value in values {
        let mut row = Row::new();
        row.insert(name.to_string(), value);
        table.push_row(row).expect("row");
    }
    table
}

#[test]
fn age_range_counts_out_of_bounds_values_only() {
    let schema = Schema::new(vec![
        FieldSpec::new("age", FieldType::Integer)
            .range(18.0, 80.0)
            .expect("age"),
    ])
    .expect("schema");
    let table = single_column(
        "age",
        vec![
            Value::Int(10),
            Value::Int(25),
            Value::Int(90),
            Value::Null,
            Value::Int(40),
        ],
    );

    let result = check(&schema, &table);
    assert_eq!(result.get("age", CheckKind::Range), Some(2));
    assert_eq!(result.get("age", CheckKind::NotNull), None);
    assert_eq!(result.field("age").expect("age").metrics().len(), 1);
}

#[test]
fn email_regex_excludes_nulls() {
    let schema = Schema::new(vec![
        FieldSpec::new("email", FieldType::String)
            .regex(r"^[^@]+@[^@]+\.[^@]+$")
            .expect("email"),
    ])
    .expect("schema");
    let table = single_column(
        "email",
        vec![Value::from("a@b.com"), Value::from("bad"), Value::Null],
    );

    let result = check(&schema, &table);
    assert_eq!(result.get("email", CheckKind::Regex), Some(1));
}

#[test]
fn unique_counts_occurrences_beyond_first() {
    let schema = Schema::new(vec![FieldSpec::new("id", FieldType::String).unique()])
        .expect("schema");
    let table = single_column(
        "id",
        ["x", "y", "x", "z", "x"].into_iter().map(Value::from).collect(),
    );

    let result = check(&schema, &table);
    assert_eq!(result.get("id", CheckKind::Unique), Some(2));
}

#[test]
fn not_null_counts_every_absent_value() {
    let schema = Schema::new(vec![FieldSpec::new("name", FieldType::String).not_null()])
        .expect("schema");
    let mut values: Vec<Value> = (0..20).map(|idx| Value::from(format!("n{idx}"))).collect();
    for idx in [1, 4, 9, 19] {
        values[idx] = Value::Null;
    }
    let table = single_column("name", values);

    assert_eq!(check(&schema, &table).get("name", CheckKind::NotNull), Some(4));
}

#[test]
fn checks_within_a_field_are_independent() {
    let schema = Schema::new(vec![
        FieldSpec::new("amount", FieldType::Float)
            .not_null()
            .positive()
            .unique()
            .range(0.0, 100.0)
            .expect("amount"),
    ])
    .expect("schema");
    let table = single_column(
        "amount",
        vec![
            Value::Float(-5.0),
            Value::Float(-5.0),
            Value::Null,
            Value::Float(150.0),
            Value::Float(0.0),
        ],
    );

    let result = check(&schema, &table);
    assert_eq!(result.get("amount", CheckKind::NotNull), Some(1));
    assert_eq!(result.get("amount", CheckKind::Positive), Some(3));
    assert_eq!(result.get("amount", CheckKind::Range), Some(3));
    assert_eq!(result.get("amount", CheckKind::Unique), Some(1));
    assert_eq!(result.total_violations(), 8);
}

#[test]
fn missing_fields_are_skipped_with_a_warning() {
    let schema = Schema::new(vec![
        FieldSpec::new("id", FieldType::String).not_null(),
        FieldSpec::new("ghost", FieldType::Integer).positive(),
    ])
    .expect("schema");
    let table = single_column("id", vec![Value::from("a"), Value::Null]);

    let reporter = Arc::new(MemoryReporter::new());
    let engine = QualityEngine::new(reporter.clone());
    let report = engine.run(&schema, &table, Vec::new());

    assert!(report.results.field("ghost").is_none());
    assert_eq!(report.results.get("id", CheckKind::NotNull), Some(1));
    assert_eq!(
        report.warnings,
        vec![CheckWarning::MissingField {
            field: "ghost".to_string()
        }]
    );
    assert_eq!(reporter.warnings(), report.warnings);
}

#[test]
fn empty_table_reports_zero_for_every_configured_check() {
    let schema = Schema::default_customer();
    let table = Table::for_schema(&schema);

    let result = check(&schema, &table);
    assert_eq!(result.len(), schema.len());
    for field in schema.fields() {
        let field_result = result.field(&field.name).expect("field present");
        assert_eq!(
            field_result.metrics().len(),
            field.checks.kinds(field.field_type).len()
        );
        assert!(field_result.metrics().iter().all(|(_, value)| *value == 0));
    }
}

#[test]
fn table_without_columns_reports_zero_without_warnings() {
    let schema = Schema::default_customer();
    let reporter = Arc::new(MemoryReporter::new());
    let engine = QualityEngine::new(reporter.clone());

    let report = engine.run(&schema, &Table::default(), Vec::new());
    assert!(report.warnings.is_empty());
    assert!(reporter.warnings().is_empty());
    assert_eq!(report.results.len(), schema.len());
    for field in schema.fields() {
        let field_result = report.results.field(&field.name).expect("field present");
        assert_eq!(
            field_result.metrics().len(),
            field.checks.kinds(field.field_type).len()
        );
        assert_eq!(field_result.total(), 0);
    }
}

#[test]
fn repeated_checks_agree() {
    let schema = Schema::default_customer();
    let table = SyntheticGenerator::new(GenerateOptions::seeded(21))
        .generate(&schema, 200)
        .expect("generate")
        .table;

    let engine = QualityEngine::new(Arc::new(MemoryReporter::new()));
    let first = engine.check(&schema, &table);
    let second = engine.check(&schema, &table);
    assert_eq!(first, second);
    assert_eq!(first.fields().len(), schema.len());
}

#[test]
fn report_records_flatten_results_with_one_timestamp() {
    let schema = Schema::default_customer();
    let table = SyntheticGenerator::new(GenerateOptions::seeded(3))
        .generate(&schema, 50)
        .expect("generate")
        .table;

    let reporter = Arc::new(MemoryReporter::new());
    let report = QualityEngine::new(reporter.clone()).run(&schema, &table, Vec::new());

    let metric_count: usize = report.results.fields().iter().map(|f| f.metrics().len()).sum();
    assert_eq!(report.records.len(), metric_count);
    assert!(report.records.iter().all(|r| r.recorded_at == report.checked_at));

    let events = reporter.events();
    assert!(matches!(events.first(), Some(ReportEvent::RunStarted { rows: 50, .. })));
    assert!(matches!(events.last(), Some(ReportEvent::RunFinished { .. })));
    let metric_events = events
        .iter()
        .filter(|event| matches!(event, ReportEvent::Metric { .. }))
        .count();
    assert_eq!(metric_events, metric_count);
}

#[test]
fn large_distinct_integers_are_not_duplicates() {
    let schema = Schema::new(vec![FieldSpec::new("account", FieldType::Integer).unique()])
        .expect("schema");
    let big = 1_i64 << 53;
    let table = single_column(
        "account",
        vec![Value::Int(big), Value::Int(big + 1), Value::Float(big as f64)],
    );
    assert_eq!(check(&schema, &table).get("account", CheckKind::Unique), Some(1));
}
