use std::collections::HashSet;

use dataops_core::{CheckKind, FieldSpec, Pattern, Range, Value};

/// Count the violations of one check over a column.
///
/// Returns `None` when the check is not configured on the field or does not
/// apply to its declared type.
pub fn evaluate<'a, I>(field: &FieldSpec, kind: CheckKind, values: I) -> Option<u64>
where
    I: IntoIterator<Item = &'a Value>,
{
    let checks = &field.checks;
    let count = match kind {
        CheckKind::NotNull if checks.not_null => count_nulls(values),
        CheckKind::Regex => count_invalid_format(values, checks.regex.as_ref()?),
        CheckKind::Range if field.field_type.is_numeric() => {
            count_out_of_range(values, checks.range.as_ref()?)
        }
        CheckKind::Positive if checks.positive => count_non_positive(values),
        CheckKind::Unique if checks.unique => count_duplicates(values),
        _ => return None,
    };
    Some(count)
}

pub fn count_nulls<'a>(values: impl IntoIterator<Item = &'a Value>) -> u64 {
    values.into_iter().filter(|value| value.is_null()).count() as u64
}

/// Present values whose text form is not a full match. Nulls are not counted.
pub fn count_invalid_format<'a>(
    values: impl IntoIterator<Item = &'a Value>,
    pattern: &Pattern,
) -> u64 {
    values
        .into_iter()
        .filter(|value| !value.is_null())
        .filter(|value| match value.as_str() {
            Some(text) => !pattern.full_match(text),
            None => !pattern.full_match(&value.to_string()),
        })
        .count() as u64
}

/// Present numeric values outside `[min, max]`.
pub fn count_out_of_range<'a>(values: impl IntoIterator<Item = &'a Value>, range: &Range) -> u64 {
    values
        .into_iter()
        .filter_map(Value::as_f64)
        .filter(|value| !range.contains(*value))
        .count() as u64
}

/// Present numeric values `<= 0`.
pub fn count_non_positive<'a>(values: impl IntoIterator<Item = &'a Value>) -> u64 {
    values
        .into_iter()
        .filter_map(Value::as_f64)
        .filter(|value| *value <= 0.0)
        .count() as u64
}

/// Occurrences beyond the first of each distinct present value.
pub fn count_duplicates<'a>(values: impl IntoIterator<Item = &'a Value>) -> u64 {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter_map(Value::dedup_key)
        .filter(|key| !seen.insert(key.clone()))
        .count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataops_core::FieldType;

    fn ints(values: &[Option<i64>]) -> Vec<Value> {
        values.iter().map(|value| Value::from(*value)).collect()
    }

    #[test]
    fn range_skips_nulls() {
        let range = Range {
            min: 18.0,
            max: 80.0,
        };
        let values = ints(&[Some(10), Some(25), Some(90), None, Some(40)]);
        assert_eq!(count_out_of_range(&values, &range), 2);
        assert_eq!(count_nulls(&values), 1);
    }

    #[test]
    fn regex_excludes_nulls() {
        let field = FieldSpec::new("email", FieldType::String)
            .regex(r"^[^@]+@[^@]+\.[^@]+$")
            .expect("field");
        let values = vec![Value::from("a@b.com"), Value::from("bad"), Value::Null];
        assert_eq!(evaluate(&field, CheckKind::Regex, &values), Some(1));
    }

    #[test]
    fn duplicates_count_beyond_first_occurrence() {
        let values: Vec<Value> = ["x", "y", "x", "z", "x"].into_iter().map(Value::from).collect();
        assert_eq!(count_duplicates(&values), 2);
        assert_eq!(count_duplicates(&[Value::Null, Value::Null]), 0);
        assert_eq!(count_duplicates(&[Value::Int(1), Value::Float(1.0)]), 1);
    }

    #[test]
    fn positive_treats_zero_as_violation() {
        let values = vec![Value::Int(0), Value::Float(-1.5), Value::Int(3), Value::Null];
        assert_eq!(count_non_positive(&values), 2);
    }

    #[test]
    fn range_is_ignored_on_non_numeric_fields() {
        let field = FieldSpec {
            name: "name".to_string(),
            field_type: FieldType::String,
            checks: dataops_core::Checks {
                range: Some(Range { min: 0.0, max: 1.0 }),
                ..Default::default()
            },
        };
        assert_eq!(evaluate(&field, CheckKind::Range, &[Value::from("zz")]), None);
    }

    #[test]
    fn unconfigured_flags_are_skipped() {
        let field = FieldSpec::new("id", FieldType::String);
        assert_eq!(evaluate(&field, CheckKind::NotNull, &[Value::Null]), None);
        assert_eq!(evaluate(&field, CheckKind::Unique, &[Value::Null]), None);
    }
}
