//! Free-text row search
//!
//! A row matches when its sample id, batch id or any *displayed* column
//! contains the query, case-insensitively. Hidden columns are not searched.

use std::borrow::Cow;

use coa_core::Record;

use crate::DisplayColumn;

/// Filter `view` (slot indices into `records`) by `query`.
///
/// An empty query hands back the input view untouched.
pub fn filter_rows<'a>(
    records: &[Record],
    view: Cow<'a, [usize]>,
    query: &str,
    display_columns: &[DisplayColumn],
) -> Cow<'a, [usize]> {
    if query.is_empty() {
        return view;
    }

    let needle = query.to_lowercase();
    let matched: Vec<usize> = view
        .iter()
        .copied()
        .filter(|slot| {
            records
                .get(*slot)
                .is_some_and(|record| record_matches(record, &needle, display_columns))
        })
        .collect();

    tracing::debug!(
        query,
        matched = matched.len(),
        total = view.len(),
        "Applied search filter"
    );
    Cow::Owned(matched)
}

/// Whether `record` matches an already lower-cased needle
pub fn record_matches(record: &Record, needle: &str, display_columns: &[DisplayColumn]) -> bool {
    let identity = [
        record.sample_id.as_deref().unwrap_or(""),
        record.batch_id.as_deref().unwrap_or(""),
    ];
    if identity
        .iter()
        .any(|value| value.to_lowercase().contains(needle))
    {
        return true;
    }

    display_columns.iter().any(|column| {
        record
            .display_value(&column.name)
            .to_lowercase()
            .contains(needle)
    })
}
