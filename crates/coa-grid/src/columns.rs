//! Column visibility policy
//!
//! Columns are addressed by their index in the source column list, since
//! names are not unique (several unlabeled columns are common). Blank
//! headers start hidden; the user can toggle any column afterwards.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};

/// Column that always stays visible and pinned to the frozen pane
pub const BATCH_COLUMN: &str = "Batch";

/// Visibility key of a column, rendered as `col-<originalIndex>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnKey(pub usize);

impl ColumnKey {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "col-{}", self.0)
    }
}

/// Which of the two synchronized tables a column renders in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    /// Left pane, identity columns that do not scroll horizontally
    Frozen,
    Scrollable,
}

/// A column that survived the visibility filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayColumn {
    /// Index into the original column list
    pub index: usize,
    pub name: String,
    pub pane: Pane,
}

pub fn is_blank_header(name: &str) -> bool {
    name.trim().is_empty()
}

fn is_batch(name: &str) -> bool {
    name.trim() == BATCH_COLUMN
}

/// Pane for the column at `index`: the first column and `Batch` are frozen.
pub fn pane_for(index: usize, name: &str) -> Pane {
    if index == 0 || is_batch(name) {
        Pane::Frozen
    } else {
        Pane::Scrollable
    }
}

/// Header text, with unlabeled columns shown as `Column N` (1-based)
pub fn column_label(index: usize, name: &str) -> String {
    if name.is_empty() {
        format!("Column {}", index + 1)
    } else {
        name.to_string()
    }
}

/// Default hidden set: every blank header except the first column and `Batch`
pub fn compute_default_hidden(columns: &[String]) -> BTreeSet<ColumnKey> {
    columns
        .iter()
        .enumerate()
        .filter(|(index, name)| *index != 0 && !is_batch(name) && is_blank_header(name))
        .map(|(index, _)| ColumnKey(index))
        .collect()
}

/// Signature of an ordered column list
pub fn column_signature(columns: &[String]) -> u64 {
    let mut hasher = DefaultHasher::new();
    columns.len().hash(&mut hasher);
    for column in columns {
        column.hash(&mut hasher);
    }
    hasher.finish()
}

/// Hidden-column state with per-column-set memory.
///
/// Defaults are applied once per distinct column list. Re-delivering the same
/// list keeps the user's toggles, and switching back to a list seen earlier
/// restores the toggles made for it.
#[derive(Debug, Clone, Default)]
pub struct ColumnVisibility {
    signature: Option<u64>,
    hidden: BTreeSet<ColumnKey>,
    remembered: HashMap<u64, BTreeSet<ColumnKey>>,
}

impl ColumnVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt a (possibly new) column list.
    ///
    /// Returns `true` when the default policy was applied.
    pub fn set_columns(&mut self, columns: &[String]) -> bool {
        let signature = column_signature(columns);
        if self.signature == Some(signature) {
            tracing::debug!("Column list unchanged, keeping {} hidden columns", self.hidden.len());
            return false;
        }

        if let Some(previous) = self.signature {
            self.remembered
                .insert(previous, std::mem::take(&mut self.hidden));
        }
        self.signature = Some(signature);

        match self.remembered.remove(&signature) {
            Some(saved) => {
                tracing::debug!("Restoring visibility for a previously seen column list");
                self.hidden = saved;
                false
            }
            None => {
                self.hidden = compute_default_hidden(columns);
                tracing::debug!(
                    hidden = self.hidden.len(),
                    total = columns.len(),
                    "Applied default column visibility"
                );
                true
            }
        }
    }

    /// Flip one column's visibility by its original index
    pub fn toggle(&mut self, index: usize) {
        let key = ColumnKey(index);
        if !self.hidden.remove(&key) {
            self.hidden.insert(key);
        }
    }

    /// Show every column
    pub fn show_all(&mut self) {
        self.hidden.clear();
    }

    pub fn is_hidden(&self, index: usize) -> bool {
        self.hidden.contains(&ColumnKey(index))
    }

    pub fn hidden(&self) -> &BTreeSet<ColumnKey> {
        &self.hidden
    }

    pub fn hidden_count(&self) -> usize {
        self.hidden.len()
    }

    /// Visible columns in original order, tagged with their pane
    pub fn display_columns(&self, columns: &[String]) -> Vec<DisplayColumn> {
        columns
            .iter()
            .enumerate()
            .filter(|(index, _)| !self.is_hidden(*index))
            .map(|(index, name)| DisplayColumn {
                index,
                name: name.clone(),
                pane: pane_for(index, name),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_hidden_blank_headers() {
        let hidden = compute_default_hidden(&cols(&["Sample #", "", "Batch", "pH"]));
        assert_eq!(hidden, BTreeSet::from([ColumnKey(1)]));
        assert_eq!(ColumnKey(1).to_string(), "col-1");
    }

    #[test]
    fn test_first_column_never_hidden_even_if_blank() {
        let hidden = compute_default_hidden(&cols(&["", "   ", " Batch "]));
        assert_eq!(hidden, BTreeSet::from([ColumnKey(1)]));
    }

    #[test]
    fn test_manual_toggles_survive_same_column_list() {
        let columns = cols(&["Sample #", "", "Batch", "pH"]);
        let mut visibility = ColumnVisibility::new();
        assert!(visibility.set_columns(&columns));

        visibility.toggle(1);
        visibility.toggle(3);
        assert!(!visibility.set_columns(&columns.clone()));
        assert!(!visibility.is_hidden(1));
        assert!(visibility.is_hidden(3));
    }

    #[test]
    fn test_new_column_list_applies_defaults_and_old_one_is_restored() {
        let phase1 = cols(&["Sample #", "", "pH"]);
        let phase2 = cols(&["Sample #", "AV", "", ""]);
        let mut visibility = ColumnVisibility::new();

        visibility.set_columns(&phase1);
        visibility.toggle(2);

        assert!(visibility.set_columns(&phase2));
        assert_eq!(
            visibility.hidden().iter().copied().collect::<Vec<_>>(),
            vec![ColumnKey(2), ColumnKey(3)]
        );

        assert!(!visibility.set_columns(&phase1));
        assert!(visibility.is_hidden(1));
        assert!(visibility.is_hidden(2));
    }

    #[test]
    fn test_display_columns_preserve_order_and_panes() {
        let columns = cols(&["Sample #", "", "Batch", "pH", ""]);
        let mut visibility = ColumnVisibility::new();
        visibility.set_columns(&columns);
        visibility.toggle(4);

        let display = visibility.display_columns(&columns);
        let summary: Vec<(usize, Pane)> = display.iter().map(|c| (c.index, c.pane)).collect();
        assert_eq!(
            summary,
            vec![
                (0, Pane::Frozen),
                (2, Pane::Frozen),
                (3, Pane::Scrollable),
                (4, Pane::Scrollable),
            ]
        );

        visibility.show_all();
        assert_eq!(visibility.display_columns(&columns).len(), 5);
        assert_eq!(visibility.hidden_count(), 0);
    }

    #[test]
    fn test_column_label_for_unlabeled_column() {
        assert_eq!(column_label(4, ""), "Column 5");
        assert_eq!(column_label(0, "Sample #"), "Sample #");
    }
}
