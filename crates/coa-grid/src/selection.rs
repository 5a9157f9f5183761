//! Bulk row selection

use std::collections::HashSet;

use crate::{RowId, SnapshotEpoch};

/// State of the select-all checkbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Empty,
    /// Some visible rows selected (indeterminate checkbox)
    Partial,
    All,
}

/// Selected row identities, scoped to one snapshot epoch
#[derive(Debug, Clone, Default)]
pub struct RowSelection {
    epoch: SnapshotEpoch,
    selected: HashSet<RowId>,
}

impl RowSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget identities from an older snapshot
    pub fn reset(&mut self, epoch: SnapshotEpoch) {
        if self.epoch != epoch {
            self.epoch = epoch;
            self.selected.clear();
        }
    }

    /// Select every visible row, or clear the whole selection
    pub fn select_all<'a>(&mut self, visible: impl IntoIterator<Item = &'a RowId>, checked: bool) {
        if checked {
            self.selected = visible.into_iter().cloned().collect();
        } else {
            self.selected.clear();
        }
    }

    pub fn select_row(&mut self, row_id: RowId, checked: bool) {
        if checked {
            self.selected.insert(row_id);
        } else {
            self.selected.remove(&row_id);
        }
    }

    pub fn is_selected(&self, row_id: &RowId) -> bool {
        self.selected.contains(row_id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Checkbox state measured against the rows currently visible
    pub fn state<'a>(&self, visible: impl IntoIterator<Item = &'a RowId>) -> SelectionState {
        let mut total = 0;
        let mut selected = 0;
        for row_id in visible {
            total += 1;
            if self.selected.contains(row_id) {
                selected += 1;
            }
        }

        match selected {
            0 => SelectionState::Empty,
            n if n == total => SelectionState::All,
            _ => SelectionState::Partial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(names: &[&str]) -> Vec<RowId> {
        names.iter().map(|n| RowId::from(*n)).collect()
    }

    #[test]
    fn test_state_over_visible_rows() {
        let visible = ids(&["a", "b", "c"]);
        let mut selection = RowSelection::new();
        assert_eq!(selection.state(&visible), SelectionState::Empty);

        selection.select_row(RowId::from("b"), true);
        assert_eq!(selection.state(&visible), SelectionState::Partial);

        selection.select_all(&visible, true);
        assert_eq!(selection.state(&visible), SelectionState::All);
        assert_eq!(selection.len(), 3);

        selection.select_all(&visible, false);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_hidden_selected_rows_do_not_count() {
        let mut selection = RowSelection::new();
        selection.select_row(RowId::from("x"), true);
        assert_eq!(selection.state(&ids(&["a", "b"])), SelectionState::Empty);
        assert_eq!(selection.state(&ids(&[])), SelectionState::Empty);
    }

    #[test]
    fn test_reset_purges_stale_identities() {
        let mut selection = RowSelection::new();
        selection.select_row(RowId::from("a"), true);
        selection.reset(SnapshotEpoch(0));
        assert!(selection.is_selected(&RowId::from("a")));
        selection.reset(SnapshotEpoch(3));
        assert!(selection.is_empty());
    }
}
