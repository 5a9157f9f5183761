//! Cell selection and the per-cell formatting overlay

use std::collections::{HashMap, HashSet};

use crate::{CellFormat, FormatFlag, NumberFormat, RowId, SnapshotEpoch, format_value};

/// A cell, addressed by row identity and column name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellId {
    pub row: RowId,
    pub column: String,
}

impl CellId {
    pub fn new(row: RowId, column: impl Into<String>) -> Self {
        Self {
            row,
            column: column.into(),
        }
    }
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.row, self.column)
    }
}

/// Selected cells plus their formats, scoped to one snapshot epoch
#[derive(Debug, Clone, Default)]
pub struct CellOverlay {
    epoch: SnapshotEpoch,
    selected: HashSet<CellId>,
    formats: HashMap<CellId, CellFormat>,
}

impl CellOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> SnapshotEpoch {
        self.epoch
    }

    /// Drop all selections and formats when the snapshot changes
    pub fn reset(&mut self, epoch: SnapshotEpoch) {
        if self.epoch == epoch {
            return;
        }
        if !self.selected.is_empty() || !self.formats.is_empty() {
            tracing::debug!(
                selected = self.selected.len(),
                formatted = self.formats.len(),
                "Discarding cell overlay from previous snapshot"
            );
        }
        self.epoch = epoch;
        self.selected.clear();
        self.formats.clear();
    }

    pub fn toggle_cell(&mut self, cell: CellId) {
        if !self.selected.remove(&cell) {
            self.selected.insert(cell);
        }
    }

    pub fn is_selected(&self, cell: &CellId) -> bool {
        self.selected.contains(cell)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Flip `flag` on every selected cell. Returns the number of cells touched.
    pub fn apply_format(&mut self, flag: FormatFlag) -> usize {
        for cell in &self.selected {
            self.formats.entry(cell.clone()).or_default().toggle(flag);
        }
        self.selected.len()
    }

    /// Set the number display mode on every selected cell
    pub fn apply_number_format(&mut self, number_format: NumberFormat) -> usize {
        for cell in &self.selected {
            self.formats.entry(cell.clone()).or_default().number_format = number_format;
        }
        self.selected.len()
    }

    pub fn format(&self, cell: &CellId) -> Option<&CellFormat> {
        self.formats.get(cell)
    }

    /// Display text of a raw value under this cell's number format
    pub fn render_value(&self, raw: &str, cell: &CellId) -> String {
        match self.formats.get(cell) {
            Some(format) => format_value(raw, format.number_format),
            None => raw.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cell(row: &str, column: &str) -> CellId {
        CellId::new(RowId::from(row), column)
    }

    #[test]
    fn test_cell_id_display() {
        assert_eq!(cell("a.pdf-S1--idx-0", "pH").to_string(), "a.pdf-S1--idx-0-pH");
    }

    #[test]
    fn test_apply_format_without_selection_is_noop() {
        let mut overlay = CellOverlay::new();
        assert_eq!(overlay.apply_format(FormatFlag::Bold), 0);
        assert_eq!(overlay.format(&cell("r", "c")), None);
    }

    #[test]
    fn test_apply_format_toggles_selected_cells() {
        let mut overlay = CellOverlay::new();
        overlay.toggle_cell(cell("r0", "pH"));
        overlay.toggle_cell(cell("r1", "pH"));
        overlay.toggle_cell(cell("r1", "pH"));

        assert_eq!(overlay.apply_format(FormatFlag::Italic), 1);
        assert!(overlay.format(&cell("r0", "pH")).unwrap().italic);
        assert_eq!(overlay.format(&cell("r1", "pH")), None);

        overlay.apply_format(FormatFlag::Italic);
        assert!(!overlay.format(&cell("r0", "pH")).unwrap().italic);
    }

    #[test]
    fn test_render_value_uses_number_format() {
        let mut overlay = CellOverlay::new();
        let target = cell("r0", "Fat");
        overlay.toggle_cell(target.clone());
        overlay.apply_number_format(NumberFormat::Percentage);

        assert_eq!(overlay.render_value("0.5", &target), "50.00%");
        assert_eq!(overlay.render_value("N/A", &target), "N/A");
        assert_eq!(overlay.render_value("0.5", &cell("r1", "Fat")), "0.5");
    }

    #[test]
    fn test_reset_on_new_epoch_clears_everything() {
        let mut overlay = CellOverlay::new();
        let target = cell("r0", "Fat");
        overlay.toggle_cell(target.clone());
        overlay.apply_format(FormatFlag::Bold);

        overlay.reset(SnapshotEpoch(0));
        assert!(overlay.is_selected(&target));

        overlay.reset(SnapshotEpoch(1));
        assert!(!overlay.is_selected(&target));
        assert_eq!(overlay.format(&target), None);
        assert_eq!(overlay.epoch(), SnapshotEpoch(1));
    }
}
