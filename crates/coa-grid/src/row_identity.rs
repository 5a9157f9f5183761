//! Row identity derivation
//!
//! Records may not carry a database id yet (fresh uploads) and may be exact
//! duplicates of each other, so the grid derives its own row key from the
//! identifying fields plus the row's position.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use coa_core::Record;
use serde::{Deserialize, Serialize};

/// Fields that make up the base key and are skipped by the fallback suffix
pub const RESERVED_IDENTITY_FIELDS: [&str; 3] = ["file", "sample_id", "batch_id"];

const FALLBACK_PROPERTY_COUNT: usize = 3;
const FALLBACK_VALUE_CHARS: usize = 10;

/// Derived identity of one row within a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Derive the identity of `record`.
///
/// With an index the result is `<file>-<sample_id>-<batch_id>-idx-<index>`,
/// unique within any list rendered with positional indices. Without one, up
/// to three other fields (sorted by key, values cut to 10 chars) are appended;
/// a record with no other fields gets a content hash suffix instead.
pub fn resolve_row_id(record: &Record, index: Option<usize>) -> RowId {
    let base = base_key(record);

    if let Some(index) = index {
        return RowId(format!("{base}-idx-{index}"));
    }

    let props = additional_properties(record);
    if props.is_empty() {
        RowId(format!("{base}-h{:016x}", content_hash(record)))
    } else {
        RowId(format!("{base}-{props}"))
    }
}

fn base_key(record: &Record) -> String {
    format!(
        "{}-{}-{}",
        record.file,
        record.sample_id.as_deref().unwrap_or(""),
        record.batch_id.as_deref().unwrap_or("")
    )
}

fn additional_properties(record: &Record) -> String {
    let mut keys: Vec<&str> = record
        .field_names()
        .filter(|key| !RESERVED_IDENTITY_FIELDS.contains(key))
        .collect();
    keys.sort_unstable();

    keys.into_iter()
        .take(FALLBACK_PROPERTY_COUNT)
        .map(|key| {
            let value = record
                .get(key)
                .filter(|v| v.is_truthy())
                .map(|v| v.display())
                .unwrap_or_default();
            let truncated: String = value.chars().take(FALLBACK_VALUE_CHARS).collect();
            format!("{key}:{truncated}")
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn content_hash(record: &Record) -> u64 {
    let mut hasher = DefaultHasher::new();
    for key in record.field_names() {
        key.hash(&mut hasher);
        record.display_value(key).hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use coa_core::Scalar;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn test_indexed_identity_format() {
        let record = Record::new("a.pdf").with_sample_id("S1");
        assert_eq!(
            resolve_row_id(&record, Some(0)).as_str(),
            "a.pdf-S1--idx-0"
        );
        assert_eq!(
            resolve_row_id(&record, Some(1)).as_str(),
            "a.pdf-S1--idx-1"
        );
    }

    #[test]
    fn test_indexed_identities_are_unique_for_identical_records() {
        let record = Record::new("dup.pdf").with_sample_id("S").with_batch_id("B");
        let ids: HashSet<RowId> = (0..50)
            .map(|i| resolve_row_id(&record, Some(i)))
            .collect();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn test_fallback_uses_first_three_sorted_properties() {
        let record = Record::new("a.pdf")
            .with_batch_id("B7")
            .with_field("zinc", "1")
            .with_field("Ash", "0.123456789012")
            .with_field("Moisture", 0.0)
            .with_field("Fat", "9");
        assert_eq!(
            resolve_row_id(&record, None).as_str(),
            "a.pdf--B7-Ash:0.12345678-Fat:9-Moisture:"
        );
    }

    #[test]
    fn test_fallback_includes_database_id() {
        let record = Record::new("a.pdf").with_id("42");
        assert_eq!(resolve_row_id(&record, None).as_str(), "a.pdf---id:42");
    }

    #[test]
    fn test_hash_fallback_is_deterministic() {
        let record = Record::new("bare.pdf").with_sample_id("S9");
        let first = resolve_row_id(&record, None);
        let second = resolve_row_id(&record.clone(), None);
        assert_eq!(first, second);
        assert!(first.as_str().starts_with("bare.pdf-S9--h"));

        let other = Record::new("bare.pdf").with_sample_id("S8");
        assert_ne!(first, resolve_row_id(&other, None));
    }

    #[test]
    fn test_null_extra_value_renders_empty() {
        let record = Record::new("n.pdf").with_field("A", Scalar::Null);
        assert_eq!(resolve_row_id(&record, None).as_str(), "n.pdf---A:");
    }
}
