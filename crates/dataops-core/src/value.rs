use std::fmt;

use chrono::NaiveDate;

/// A single cell value. `Null` represents an absent value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    /// Opaque identifier produced for `other` fields.
    Uuid(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(value) | Value::Uuid(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(value) => Some(*value),
            _ => None,
        }
    }

    /// Text form used by the CSV sink; nulls become empty cells.
    pub fn to_csv(&self) -> String {
        match self {
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Equality key for duplicate detection within a column.
    ///
    /// Numeric values compare by magnitude so `1` and `1.0` collide. Integers
    /// keep their exact value.
    pub fn dedup_key(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Int(value) => Some(format!("n:{value}")),
            Value::Float(value) => match integral_f64(*value) {
                Some(integer) => Some(format!("n:{integer}")),
                None => Some(format!("n:{value}")),
            },
            Value::Text(value) | Value::Uuid(value) => Some(format!("s:{value}")),
            Value::Date(value) => Some(format!("d:{value}")),
        }
    }
}

/// The exact `i64` of an integral float inside the `i64` range.
fn integral_f64(value: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is out of range
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.fract() == 0.0 && in_range).then_some(value as i64)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Text(value) | Value::Uuid(value) => f.write_str(value),
            Value::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_dedup_keys_ignore_representation() {
        assert_eq!(Value::Int(3).dedup_key(), Value::Float(3.0).dedup_key());
        assert_eq!(Value::Float(-0.0).dedup_key(), Value::Float(0.0).dedup_key());
        let big = 1_i64 << 53;
        assert_ne!(Value::Int(big).dedup_key(), Value::Int(big + 1).dedup_key());
        assert_eq!(Value::Int(big).dedup_key(), Value::Float(big as f64).dedup_key());
        assert_ne!(Value::Float(1.5).dedup_key(), Value::Int(1).dedup_key());
        assert_eq!(Value::Float(1e30).dedup_key(), Value::Float(1e30).dedup_key());
        assert_ne!(Value::Int(3).dedup_key(), Value::from("3").dedup_key());
        assert_eq!(Value::Null.dedup_key(), None);
    }

    #[test]
    fn csv_form_of_null_is_empty() {
        assert_eq!(Value::Null.to_csv(), "");
        assert_eq!(Value::Float(12.5).to_csv(), "12.5");
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).expect("date");
        assert_eq!(Value::Date(date).to_csv(), "2024-02-29");
    }

    #[test]
    fn option_converts_to_null() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(4_i64)), Value::Int(4));
    }
}
