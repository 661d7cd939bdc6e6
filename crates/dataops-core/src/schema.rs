use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::document::{ChecksDocument, FieldDocument, SchemaDocument};
use crate::error::{Error, Result};
use crate::metrics::CheckKind;
use crate::validation::is_identifier;

const DEFAULT_EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

/// Declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Integer,
    Float,
    Date,
    Other,
}

impl FieldType {
    /// Map a document type name; unknown names become `Other`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "string" => FieldType::String,
            "integer" => FieldType::Integer,
            "float" => FieldType::Float,
            "date" => FieldType::Date,
            _ => FieldType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Date => "date",
            FieldType::Other => "other",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled `regex` check, anchored for full-match evaluation.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    anchored: Regex,
}

impl Pattern {
    fn compile(field: &str, source: &str) -> Result<Self> {
        let anchored = Regex::new(&format!("^(?:{source})$")).map_err(|source| {
            Error::InvalidRegex {
                field: field.to_string(),
                source,
            }
        })?;
        Ok(Self {
            source: source.to_string(),
            anchored,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True when the whole of `value` matches the pattern.
    pub fn full_match(&self, value: &str) -> bool {
        self.anchored.is_match(value)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Inclusive numeric bounds of a `range` check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Integer bounds inside the range, if any integer fits.
    pub fn integer_bounds(&self) -> Option<(i64, i64)> {
        let min = self.min.ceil();
        let max = self.max.floor();
        if min > max || min < i64::MIN as f64 || max > i64::MAX as f64 {
            return None;
        }
        Some((min as i64, max as i64))
    }
}

/// Checks configured on a field. Flags set to `false` are not configured.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Checks {
    pub not_null: bool,
    pub regex: Option<Pattern>,
    pub range: Option<Range>,
    pub positive: bool,
    pub unique: bool,
}

impl Checks {
    /// Configured check-kinds in evaluation order.
    ///
    /// `range` is listed only when it applies to the declared type.
    pub fn kinds(&self, field_type: FieldType) -> Vec<CheckKind> {
        let mut kinds = Vec::new();
        if self.not_null {
            kinds.push(CheckKind::NotNull);
        }
        if self.regex.is_some() {
            kinds.push(CheckKind::Regex);
        }
        if self.range.is_some() && field_type.is_numeric() {
            kinds.push(CheckKind::Range);
        }
        if self.positive {
            kinds.push(CheckKind::Positive);
        }
        if self.unique {
            kinds.push(CheckKind::Unique);
        }
        kinds
    }

    pub fn is_empty(&self) -> bool {
        *self == Checks::default()
    }
}

/// Specification of one field: name, declared type and checks.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    pub checks: Checks,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            checks: Checks::default(),
        }
    }

    pub fn not_null(mut self) -> Self {
        self.checks.not_null = true;
        self
    }

    pub fn positive(mut self) -> Self {
        self.checks.positive = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.checks.unique = true;
        self
    }

    pub fn regex(mut self, pattern: &str) -> Result<Self> {
        self.checks.regex = Some(Pattern::compile(&self.name, pattern)?);
        Ok(self)
    }

    pub fn range(mut self, min: f64, max: f64) -> Result<Self> {
        self.checks.range = Some(validate_range(&self.name, self.field_type, min, max)?);
        Ok(self)
    }

    fn from_document(doc: &FieldDocument) -> Result<Self> {
        let name = doc.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidSchema("field name must not be empty".to_string()));
        }

        let field_type = FieldType::parse(&doc.field_type);
        let checks = &doc.checks;
        let mut spec = FieldSpec::new(name, field_type);
        spec.checks.not_null = checks.not_null.unwrap_or(false);
        spec.checks.positive = checks.positive.unwrap_or(false);
        spec.checks.unique = checks.unique.unwrap_or(false);
        if let Some(pattern) = &checks.regex {
            spec = spec.regex(pattern)?;
        }
        if let Some([min, max]) = checks.range {
            spec = spec.range(min, max)?;
        }
        Ok(spec)
    }

    fn to_document(&self) -> FieldDocument {
        let checks = &self.checks;
        FieldDocument {
            name: self.name.clone(),
            field_type: self.field_type.as_str().to_string(),
            checks: ChecksDocument {
                not_null: checks.not_null.then_some(true),
                regex: checks.regex.as_ref().map(|p| p.as_str().to_string()),
                range: checks.range.map(|r| [r.min, r.max]),
                positive: checks.positive.then_some(true),
                unique: checks.unique.then_some(true),
            },
        }
    }
}

fn validate_range(field: &str, field_type: FieldType, min: f64, max: f64) -> Result<Range> {
    let invalid = || Error::InvalidRange {
        field: field.to_string(),
        min,
        max,
    };
    if !min.is_finite() || !max.is_finite() || min > max {
        return Err(invalid());
    }
    let range = Range { min, max };
    // generation draws integers from the range, so at least one must fit
    if field_type == FieldType::Integer && range.integer_bounds().is_none() {
        return Err(invalid());
    }
    Ok(range)
}

/// Ordered, validated list of field specifications.
///
/// Built once per run and shared read-only by generation and checking.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for field in &fields {
            if !is_identifier(&field.name) {
                return Err(Error::InvalidSchema(format!(
                    "invalid field name: '{}'",
                    field.name
                )));
            }
            if !seen.insert(field.name.to_lowercase()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate field name: {}",
                    field.name
                )));
            }
        }
        Ok(Self { fields })
    }

    pub fn from_document(doc: &SchemaDocument) -> Result<Self> {
        crate::validation::validate_document(doc)?;
        let fields = doc
            .fields
            .iter()
            .map(FieldSpec::from_document)
            .collect::<Result<Vec<_>>>()?;
        Self::new(fields)
    }

    pub fn to_document(&self) -> SchemaDocument {
        SchemaDocument {
            fields: self.fields.iter().map(FieldSpec::to_document).collect(),
        }
    }

    /// Load from a checks configuration file, or the built-in default.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_document(&SchemaDocument::from_path(path)?),
            None => Ok(Self::default_customer()),
        }
    }

    /// The built-in five-field customer schema.
    pub fn default_customer() -> Self {
        let fields = vec![
            FieldSpec::new("id", FieldType::String).not_null(),
            FieldSpec::new("name", FieldType::String).not_null(),
            FieldSpec {
                name: "email".to_string(),
                field_type: FieldType::String,
                checks: Checks {
                    regex: Pattern::compile("email", DEFAULT_EMAIL_PATTERN).ok(),
                    ..Checks::default()
                },
            },
            FieldSpec {
                name: "age".to_string(),
                field_type: FieldType::Integer,
                checks: Checks {
                    range: Some(Range { min: 18.0, max: 80.0 }),
                    ..Checks::default()
                },
            },
            FieldSpec {
                name: "salary".to_string(),
                field_type: FieldType::Integer,
                checks: Checks {
                    range: Some(Range {
                        min: 30000.0,
                        max: 120000.0,
                    }),
                    ..Checks::default()
                },
            },
        ];
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|field| field.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
