use std::path::Path;

use schemars::JsonSchema;
use schemars::schema_for;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Serialized form of a checks configuration (`fields:` list).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    /// Ordered field specifications.
    #[serde(default)]
    pub fields: Vec<FieldDocument>,
}

/// A single field as written in the configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FieldDocument {
    pub name: String,
    /// One of `string`, `integer`, `float`, `date`; anything else is treated as `other`.
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub checks: ChecksDocument,
}

/// Check parameters for a field. Absent keys are not configured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ChecksDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_null: Option<bool>,
    /// Pattern the whole value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    /// Inclusive `[min, max]` bounds for integer/float fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
}

impl SchemaDocument {
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(input)?)
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Read a document, choosing the format from the file extension.
    ///
    /// `.json` files are parsed as JSON, everything else as YAML.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_yaml_str(&contents)
        }
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// JSON Schema describing the checks configuration document.
pub fn schema_document_json_schema() -> serde_json::Value {
    let schema = schema_for!(SchemaDocument);
    serde_json::to_value(&schema).unwrap_or(serde_json::Value::Null)
}
