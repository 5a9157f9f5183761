//! COA record model
//!
//! A record is one extracted row of lab data. The backend sends it as a flat
//! JSON object; the identity-bearing fields are lifted into typed slots and
//! every other column lands in `extra`, keeping its original key order.
//!
//! Identity fields are normalized on the way in: a numeric `id` becomes its
//! string form and a null identity key is treated as absent. Serializing a
//! record therefore yields the normalized shape (string IDs, null identity
//! keys omitted), not the exact payload the backend sent. Extra columns keep
//! their JSON type.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{CoaError, Result, Scalar};

/// Source filename field
pub const FIELD_FILE: &str = "file";
/// Persisted database identifier field
pub const FIELD_ID: &str = "id";
/// Sample identifier field
pub const FIELD_SAMPLE_ID: &str = "sample_id";
/// Batch identifier field
pub const FIELD_BATCH_ID: &str = "batch_id";

/// A sparse COA row
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    /// Source filename the row was extracted from
    pub file: String,
    /// Database identifier, absent until the row is persisted
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub sample_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub batch_id: Option<String>,
    /// All remaining columns, in the order the backend sent them
    #[serde(flatten)]
    pub extra: IndexMap<String, Scalar>,
}

impl Record {
    /// Create a record for a source file with no other fields
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_sample_id(mut self, sample_id: impl Into<String>) -> Self {
        self.sample_id = Some(sample_id.into());
        self
    }

    pub fn with_batch_id(mut self, batch_id: impl Into<String>) -> Self {
        self.batch_id = Some(batch_id.into());
        self
    }

    /// Set an extra column value
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// Decode a record from an arbitrary JSON value
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        if !value.is_object() {
            return Err(CoaError::InvalidRecord(format!(
                "expected a JSON object, got {}",
                json_kind(&value)
            )));
        }
        if value.get(FIELD_FILE).is_none() {
            return Err(CoaError::InvalidRecord("missing `file` field".into()));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Look up a field by column name.
    ///
    /// Reserved names resolve to the typed identity fields; `None` means the
    /// key is absent from the record.
    pub fn get(&self, name: &str) -> Option<Scalar> {
        match name {
            FIELD_FILE => Some(Scalar::Text(self.file.clone())),
            FIELD_ID => self.id.clone().map(Scalar::Text),
            FIELD_SAMPLE_ID => self.sample_id.clone().map(Scalar::Text),
            FIELD_BATCH_ID => self.batch_id.clone().map(Scalar::Text),
            _ => self.extra.get(name).cloned(),
        }
    }

    /// Stringified field value; absent and null fields become `""`.
    pub fn display_value(&self, name: &str) -> String {
        match name {
            FIELD_FILE => self.file.clone(),
            FIELD_ID => self.id.clone().unwrap_or_default(),
            FIELD_SAMPLE_ID => self.sample_id.clone().unwrap_or_default(),
            FIELD_BATCH_ID => self.batch_id.clone().unwrap_or_default(),
            _ => self
                .extra
                .get(name)
                .map(Scalar::display)
                .unwrap_or_default(),
        }
    }

    /// All present keys, identity fields first, then extras in source order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        let fixed = [
            Some(FIELD_FILE),
            self.id.as_ref().map(|_| FIELD_ID),
            self.sample_id.as_ref().map(|_| FIELD_SAMPLE_ID),
            self.batch_id.as_ref().map(|_| FIELD_BATCH_ID),
        ];
        fixed
            .into_iter()
            .flatten()
            .chain(self.extra.keys().map(String::as_str))
    }

    /// Number of non-null fields, not counting `file`
    pub fn populated_field_count(&self) -> usize {
        let fixed = [&self.id, &self.sample_id, &self.batch_id]
            .into_iter()
            .filter(|v| v.is_some())
            .count();
        fixed + self.extra.values().filter(|v| !v.is_null()).count()
    }

    /// Every string value in the record, identity fields included
    pub fn string_values(&self) -> impl Iterator<Item = &str> {
        [
            Some(self.file.as_str()),
            self.id.as_deref(),
            self.sample_id.as_deref(),
            self.batch_id.as_deref(),
        ]
        .into_iter()
        .flatten()
        .chain(self.extra.values().filter_map(Scalar::as_str))
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Accept strings, numbers and null for identity fields; the backend is not
/// consistent about numeric IDs.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Scalar>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Scalar::Null) => None,
        Some(other) => Some(other.display()),
    })
}
