use chrono::{Duration, Months, NaiveDate};
use fake::Fake;
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::Word;
use rand::Rng;

use dataops_core::{FieldSpec, FieldType, Range, Value};

/// Bounds for integers when no range check is configured.
pub const DEFAULT_INTEGER_BOUNDS: (i64, i64) = (1, 1000);

/// Bounds for float values before rounding.
pub const FLOAT_BOUNDS: (f64, f64) = (0.0, 1000.0);

/// Per-run inputs shared by every field policy.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorContext {
    pub null_rate: f64,
    pub today: NaiveDate,
    pub date_window_years: u32,
}

impl GeneratorContext {
    fn first_day(&self) -> NaiveDate {
        self.today
            .checked_sub_months(Months::new(self.date_window_years.saturating_mul(12)))
            .unwrap_or(NaiveDate::MIN)
    }
}

/// Produce one value for `field`, honoring its declared type and checks.
pub fn generate_value<R: Rng + ?Sized>(
    field: &FieldSpec,
    ctx: &GeneratorContext,
    rng: &mut R,
) -> Value {
    match field.field_type {
        FieldType::String => {
            if inject_null(ctx.null_rate, rng) {
                return Value::Null;
            }
            if field.checks.regex.is_some() && is_email_field(&field.name) {
                Value::Text(SafeEmail().fake_with_rng::<String, _>(rng))
            } else {
                Value::Text(Word().fake_with_rng::<String, _>(rng))
            }
        }
        FieldType::Integer => match field.checks.range.as_ref() {
            Some(range) => {
                if inject_null(ctx.null_rate, rng) {
                    return Value::Null;
                }
                match range.integer_bounds() {
                    Some((min, max)) => Value::Int(rng.random_range(min..=max)),
                    None => Value::Null,
                }
            }
            None => {
                let (min, max) = DEFAULT_INTEGER_BOUNDS;
                Value::Int(rng.random_range(min..=max))
            }
        },
        FieldType::Float => {
            if inject_null(ctx.null_rate, rng) {
                return Value::Null;
            }
            let range = field.checks.range.as_ref();
            let (low, high) = float_bounds(range);
            let drawn = round_cents(low + rng.random_range(0.0..=1.0) * (high - low));
            Value::Float(match range {
                Some(range) => drawn.clamp(range.min, range.max),
                None => drawn,
            })
        }
        FieldType::Date => {
            if inject_null(ctx.null_rate, rng) {
                return Value::Null;
            }
            let first = ctx.first_day();
            let span = (ctx.today - first).num_days().max(0);
            let offset = rng.random_range(0..=span);
            Value::Date(first + Duration::days(offset))
        }
        FieldType::Other => Value::Uuid(random_uuid(rng)),
    }
}

/// Draw bounds for a float field: the default bounds narrowed to the range,
/// or the range itself when the two do not overlap.
fn float_bounds(range: Option<&Range>) -> (f64, f64) {
    let (min, max) = FLOAT_BOUNDS;
    match range {
        None => (min, max),
        Some(range) => {
            let low = range.min.max(min);
            let high = range.max.min(max);
            if low <= high {
                (low, high)
            } else {
                (range.min, range.max)
            }
        }
    }
}

fn is_email_field(name: &str) -> bool {
    name.to_lowercase().contains("email")
}

fn inject_null<R: Rng + ?Sized>(null_rate: f64, rng: &mut R) -> bool {
    null_rate > 0.0 && rng.random_bool(null_rate.min(1.0))
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Version 4 identifier drawn from the run's RNG so seeded runs repeat.
fn random_uuid<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut bytes = [0_u8; 16];
    rng.fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ctx(null_rate: f64) -> GeneratorContext {
        GeneratorContext {
            null_rate,
            today: NaiveDate::from_ymd_opt(2024, 6, 30).expect("date"),
            date_window_years: 10,
        }
    }

    #[test]
    fn email_fields_with_pattern_get_addresses() {
        let field = FieldSpec::new("Contact_Email", FieldType::String)
            .regex(r"[^@]+@[^@]+\.[^@]+")
            .expect("field");
        let pattern = field.checks.regex.clone().expect("pattern");
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let value = generate_value(&field, &ctx(0.0), &mut rng);
            let text = value.as_str().expect("text");
            assert!(pattern.full_match(text), "{text} is not an address");
        }
    }

    #[test]
    fn email_name_without_pattern_gets_words() {
        let field = FieldSpec::new("email", FieldType::String);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let value = generate_value(&field, &ctx(0.0), &mut rng);
        assert!(!value.as_str().expect("text").contains('@'));
    }

    #[test]
    fn floats_are_rounded_to_cents() {
        let field = FieldSpec::new("salary", FieldType::Float);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..100 {
            let value = generate_value(&field, &ctx(0.0), &mut rng)
                .as_f64()
                .expect("float");
            assert!((0.0..=1000.0).contains(&value));
            assert!(((value * 100.0).round() - value * 100.0).abs() < 1e-6);
        }
    }

    #[test]
    fn dates_fall_in_window() {
        let field = FieldSpec::new("joined", FieldType::Date);
        let context = ctx(0.0);
        let first = NaiveDate::from_ymd_opt(2014, 6, 30).expect("date");
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..200 {
            let date = generate_value(&field, &context, &mut rng)
                .as_date()
                .expect("date");
            assert!(date >= first && date <= context.today);
        }
    }

    #[test]
    fn other_types_get_v4_uuids() {
        let field = FieldSpec::new("id", FieldType::Other);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let value = generate_value(&field, &ctx(1.0), &mut rng);
        let parsed = uuid::Uuid::parse_str(value.as_str().expect("uuid")).expect("parse");
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn full_null_rate_nulls_nullable_branches() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let word = FieldSpec::new("name", FieldType::String);
        let bounded = FieldSpec::new("age", FieldType::Integer)
            .range(18.0, 80.0)
            .expect("field");
        let open = FieldSpec::new("count", FieldType::Integer);
        assert!(generate_value(&word, &ctx(1.0), &mut rng).is_null());
        assert!(generate_value(&bounded, &ctx(1.0), &mut rng).is_null());
        assert!(!generate_value(&open, &ctx(1.0), &mut rng).is_null());
    }

    #[test]
    fn float_bounds_follow_the_range() {
        let inside = Range { min: 0.0, max: 10.0 };
        assert_eq!(float_bounds(Some(&inside)), (0.0, 10.0));
        let straddling = Range { min: -50.0, max: 20.5 };
        assert_eq!(float_bounds(Some(&straddling)), (0.0, 20.5));
        let above = Range { min: 5000.0, max: 6000.0 };
        assert_eq!(float_bounds(Some(&above)), (5000.0, 6000.0));
        assert_eq!(float_bounds(None), FLOAT_BOUNDS);
    }

    #[test]
    fn narrow_float_ranges_stay_inside_after_rounding() {
        let field = FieldSpec::new("rate", FieldType::Float)
            .range(0.001, 0.004)
            .expect("field");
        let mut rng = ChaCha8Rng::seed_from_u64(19);
        for _ in 0..100 {
            let value = generate_value(&field, &ctx(0.0), &mut rng)
                .as_f64()
                .expect("float");
            assert!((0.001..=0.004).contains(&value), "{value}");
        }
    }
}
