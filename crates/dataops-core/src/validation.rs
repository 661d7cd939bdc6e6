use std::collections::BTreeSet;

use crate::document::SchemaDocument;
use crate::error::{Error, Result};

/// Validate structural consistency of a checks document.
///
/// This checks:
/// - field names are non-empty
/// - field names are unique
/// - field names are plain identifiers (they become store column names)
///
/// Check parameters (regex, range) are validated when the field is built.
pub fn validate_document(doc: &SchemaDocument) -> Result<()> {
    let mut names = BTreeSet::new();

    for (idx, field) in doc.fields.iter().enumerate() {
        let name = field.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidSchema(format!(
                "field #{} has an empty name",
                idx + 1
            )));
        }
        if !is_identifier(name) {
            return Err(Error::InvalidSchema(format!(
                "field name '{name}' must start with a letter or underscore and contain only letters, digits or underscores"
            )));
        }
        if !names.insert(name.to_lowercase()) {
            return Err(Error::InvalidSchema(format!("duplicate field name: {name}")));
        }
    }

    Ok(())
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
