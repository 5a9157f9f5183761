//! Single-column sorting with a tri-state header cycle

use std::borrow::Cow;
use std::cmp::Ordering;

use coa_core::Record;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }

    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// The active sort: one column, one direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Sort arrow shown in a column header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortIndicator {
    Unsorted,
    Ascending,
    Descending,
}

/// Next sort after a click on `column`'s header.
///
/// Another column (or no sort) starts ascending, ascending becomes
/// descending, and descending clears the sort.
pub fn cycle(current: Option<&SortKey>, column: &str) -> Option<SortKey> {
    match current {
        Some(key) if key.column == column => match key.direction {
            SortDirection::Ascending => Some(SortKey::descending(column)),
            SortDirection::Descending => None,
        },
        _ => Some(SortKey::ascending(column)),
    }
}

pub fn indicator(current: Option<&SortKey>, column: &str) -> SortIndicator {
    match current {
        Some(key) if key.column == column => match key.direction {
            SortDirection::Ascending => SortIndicator::Ascending,
            SortDirection::Descending => SortIndicator::Descending,
        },
        _ => SortIndicator::Unsorted,
    }
}

/// Plain string comparison of the stringified values; not numeric-aware.
pub fn compare_records(a: &Record, b: &Record, key: &SortKey) -> Ordering {
    let a_value = a.display_value(&key.column);
    let b_value = b.display_value(&key.column);
    key.direction.apply(a_value.cmp(&b_value))
}

/// Order `view` by `key`. Without a key the view comes back untouched.
///
/// The sort is stable, so equal values keep their filtered order.
pub fn sort_rows<'a>(
    records: &[Record],
    view: Cow<'a, [usize]>,
    key: Option<&SortKey>,
) -> Cow<'a, [usize]> {
    let Some(key) = key else {
        return view;
    };

    let mut sorted = view.into_owned();
    sorted.sort_by(|a, b| match (records.get(*a), records.get(*b)) {
        (Some(ra), Some(rb)) => compare_records(ra, rb, key),
        _ => Ordering::Equal,
    });
    tracing::debug!(
        column = %key.column,
        direction = key.direction.label(),
        rows = sorted.len(),
        "Sorted rows"
    );
    Cow::Owned(sorted)
}
