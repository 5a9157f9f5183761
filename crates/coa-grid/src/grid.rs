//! The grid engine: state, pipeline and view model

use std::borrow::Cow;
use std::collections::HashSet;

use coa_core::{ColumnConfig, Record};

use crate::{
    CellFormat, CellId, CellOverlay, ColumnAccent, ColumnVisibility, DisplayColumn, FormatFlag,
    HeaderCell, NumberFormat, Pane, RowId, RowSelection, SelectionState, Snapshot, SortKey,
    column_accent, column_label, column_tooltip, search, sort,
};

/// Host hook receiving the materialized records of a bulk action
pub type RowsCallback = Box<dyn Fn(&[Record])>;

/// Placeholder text for empty cells
const EMPTY_CELL: &str = "-";

/// Interactive data grid over one record snapshot.
///
/// All derived state (display columns, filtered and sorted rows) is
/// recomputed on demand from the stored inputs; nothing is cached.
pub struct CoaGrid {
    columns: Vec<String>,
    columns_config: Vec<ColumnConfig>,
    visibility: ColumnVisibility,
    snapshot: Snapshot,
    search: String,
    sort: Option<SortKey>,
    selection: RowSelection,
    cells: CellOverlay,
    new_rows: HashSet<RowId>,
    on_export: Option<RowsCallback>,
    on_delete: Option<RowsCallback>,
}

impl Default for CoaGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CoaGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoaGrid")
            .field("columns", &self.columns.len())
            .field("records", &self.snapshot.len())
            .field("epoch", &self.snapshot.epoch())
            .field("search", &self.search)
            .field("sort", &self.sort)
            .field("selected", &self.selection.len())
            .finish_non_exhaustive()
    }
}

impl CoaGrid {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            columns_config: Vec::new(),
            visibility: ColumnVisibility::new(),
            snapshot: Snapshot::default(),
            search: String::new(),
            sort: None,
            selection: RowSelection::new(),
            cells: CellOverlay::new(),
            new_rows: HashSet::new(),
            on_export: None,
            on_delete: None,
        }
    }

    pub fn with_on_export(mut self, callback: impl Fn(&[Record]) + 'static) -> Self {
        self.on_export = Some(Box::new(callback));
        self
    }

    pub fn with_on_delete(mut self, callback: impl Fn(&[Record]) + 'static) -> Self {
        self.on_delete = Some(Box::new(callback));
        self
    }

    // Inputs

    /// Replace the ordered column list; visibility defaults apply per new list
    pub fn set_columns(&mut self, columns: Vec<String>) {
        self.visibility.set_columns(&columns);
        self.columns = columns;
    }

    pub fn set_columns_config(&mut self, config: Vec<ColumnConfig>) {
        self.columns_config = config;
    }

    /// Install a new record snapshot. Row and cell selections from the
    /// previous snapshot are dropped.
    pub fn load_records(&mut self, records: Vec<Record>) {
        let epoch = self.snapshot.epoch().next();
        self.snapshot = Snapshot::new(epoch, records);
        self.selection.reset(epoch);
        self.cells.reset(epoch);
        tracing::debug!(
            epoch = epoch.0,
            records = self.snapshot.len(),
            "Loaded record snapshot"
        );
    }

    /// Row identities to highlight as freshly uploaded
    pub fn set_new_row_ids(&mut self, row_ids: impl IntoIterator<Item = RowId>) {
        self.new_rows = row_ids.into_iter().collect();
    }

    pub fn clear_new_row_ids(&mut self) {
        self.new_rows.clear();
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    // Sorting

    /// Advance the tri-state sort cycle for `column`
    pub fn click_header(&mut self, column: &str) {
        self.sort = sort::cycle(self.sort.as_ref(), column);
    }

    pub fn sort_key(&self) -> Option<&SortKey> {
        self.sort.as_ref()
    }

    // Column visibility

    pub fn toggle_column(&mut self, index: usize) {
        self.visibility.toggle(index);
    }

    pub fn show_all_columns(&mut self) {
        self.visibility.show_all();
    }

    pub fn visibility(&self) -> &ColumnVisibility {
        &self.visibility
    }

    pub fn display_columns(&self) -> Vec<DisplayColumn> {
        self.visibility.display_columns(&self.columns)
    }

    // Pipeline

    /// Snapshot slots of the visible rows, filtered then sorted
    pub fn visible_slots(&self) -> Vec<usize> {
        let display_columns = self.display_columns();
        let records = self.snapshot.records();
        let all = self.snapshot.all_slots();

        let filtered = search::filter_rows(
            records,
            Cow::Borrowed(all.as_slice()),
            &self.search,
            &display_columns,
        );
        sort::sort_rows(records, filtered, self.sort.as_ref()).into_owned()
    }

    /// Identities of the visible rows, in view order
    pub fn visible_rows(&self) -> Vec<RowId> {
        self.visible_slots()
            .into_iter()
            .filter_map(|slot| self.snapshot.row_id(slot).cloned())
            .collect()
    }

    // Cell overlay

    pub fn toggle_cell(&mut self, row_id: RowId, column: impl Into<String>) {
        self.cells.toggle_cell(CellId::new(row_id, column));
    }

    pub fn clear_cell_selection(&mut self) {
        self.cells.clear_selection();
    }

    pub fn selected_cell_count(&self) -> usize {
        self.cells.selected_count()
    }

    /// Flip a text style on the selected cells; no-op without a selection
    pub fn apply_format(&mut self, flag: FormatFlag) -> usize {
        self.cells.apply_format(flag)
    }

    pub fn apply_number_format(&mut self, number_format: NumberFormat) -> usize {
        self.cells.apply_number_format(number_format)
    }

    pub fn cell_format(&self, row_id: &RowId, column: &str) -> Option<&CellFormat> {
        self.cells.format(&CellId::new(row_id.clone(), column))
    }

    // Bulk selection

    /// Select every visible row, or clear the selection
    pub fn select_all(&mut self, checked: bool) {
        let visible = self.visible_rows();
        self.selection.select_all(&visible, checked);
    }

    pub fn select_row(&mut self, row_id: RowId, checked: bool) {
        self.selection.select_row(row_id, checked);
    }

    pub fn is_row_selected(&self, row_id: &RowId) -> bool {
        self.selection.is_selected(row_id)
    }

    pub fn selection_state(&self) -> SelectionState {
        self.selection.state(&self.visible_rows())
    }

    /// Selected rows that are currently visible, in view order.
    ///
    /// Selections hidden by the search filter are left out.
    pub fn selected_records(&self) -> Vec<Record> {
        self.visible_slots()
            .into_iter()
            .filter(|slot| {
                self.snapshot
                    .row_id(*slot)
                    .is_some_and(|id| self.selection.is_selected(id))
            })
            .filter_map(|slot| self.snapshot.record(slot).cloned())
            .collect()
    }

    /// Hand the selected visible records to the export hook.
    ///
    /// Returns how many records were dispatched.
    pub fn export_selected(&self) -> usize {
        self.dispatch("export", self.on_export.as_ref())
    }

    /// Hand the selected visible records to the delete hook
    pub fn delete_selected(&self) -> usize {
        self.dispatch("delete", self.on_delete.as_ref())
    }

    fn dispatch(&self, action: &str, callback: Option<&RowsCallback>) -> usize {
        let records = self.selected_records();
        if records.is_empty() {
            return 0;
        }
        match callback {
            Some(callback) => {
                tracing::debug!(action, rows = records.len(), "Dispatching selected rows");
                callback(&records);
                records.len()
            }
            None => {
                tracing::debug!(action, "No handler registered, ignoring");
                0
            }
        }
    }

    // View model

    pub fn view(&self) -> GridView {
        let display_columns = self.display_columns();
        let (frozen_columns, scrollable_columns): (Vec<_>, Vec<_>) = display_columns
            .iter()
            .partition(|column| column.pane == Pane::Frozen);

        let slots = self.visible_slots();
        let rows: Vec<RowView> = slots
            .iter()
            .enumerate()
            .filter_map(|(position, slot)| {
                let record = self.snapshot.record(*slot)?;
                let row_id = self.snapshot.row_id(*slot)?;
                Some(RowView {
                    row_number: position + 1,
                    row_id: row_id.clone(),
                    is_new: self.new_rows.contains(row_id),
                    is_selected: self.selection.is_selected(row_id),
                    is_even: position % 2 == 0,
                    frozen: self.cells_for(record, row_id, &frozen_columns),
                    scrollable: self.cells_for(record, row_id, &scrollable_columns),
                })
            })
            .collect();

        let visible_ids: Vec<&RowId> = rows.iter().map(|row| &row.row_id).collect();
        let selection = self.selection.state(visible_ids.iter().copied());
        let selected_count = rows.iter().filter(|row| row.is_selected).count();

        let footer = (!rows.is_empty()).then(|| FooterSummary {
            shown: rows.len(),
            total: self.snapshot.len(),
            search: (!self.search.is_empty()).then(|| self.search.clone()),
            hidden_columns: self.visibility.hidden_count(),
            displayed_columns: display_columns.len(),
            total_columns: self.columns.len(),
        });

        GridView {
            frozen_headers: self.headers_for(&frozen_columns),
            scrollable_headers: self.headers_for(&scrollable_columns),
            rows,
            selection,
            selected_count,
            footer,
        }
    }

    fn headers_for(&self, columns: &[&DisplayColumn]) -> Vec<HeaderCell> {
        columns
            .iter()
            .map(|column| HeaderCell {
                index: column.index,
                name: column.name.clone(),
                label: column_label(column.index, &column.name),
                tooltip: column_tooltip(&self.columns_config, &column.name),
                accent: column_accent(&self.columns_config, &column.name),
                sort: sort::indicator(self.sort.as_ref(), &column.name),
                hideable: column.pane == Pane::Scrollable,
                pane: column.pane,
            })
            .collect()
    }

    fn cells_for(&self, record: &Record, row_id: &RowId, columns: &[&DisplayColumn]) -> Vec<CellView> {
        columns
            .iter()
            .map(|column| {
                let cell_id = CellId::new(row_id.clone(), column.name.as_str());
                let rendered = self
                    .cells
                    .render_value(&record.display_value(&column.name), &cell_id);
                let text = if rendered.is_empty() {
                    EMPTY_CELL.to_string()
                } else {
                    rendered
                };
                CellView {
                    format: self.cells.format(&cell_id).copied().unwrap_or_default(),
                    selected: self.cells.is_selected(&cell_id),
                    text,
                    cell_id,
                }
            })
            .collect()
    }
}

/// Renderable snapshot of the grid
#[derive(Debug, Clone, PartialEq)]
pub struct GridView {
    pub frozen_headers: Vec<HeaderCell>,
    pub scrollable_headers: Vec<HeaderCell>,
    pub rows: Vec<RowView>,
    pub selection: SelectionState,
    /// Selected rows among the visible ones
    pub selected_count: usize,
    /// Present only when at least one row is visible
    pub footer: Option<FooterSummary>,
}

impl GridView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> impl Iterator<Item = &HeaderCell> {
        self.frozen_headers.iter().chain(self.scrollable_headers.iter())
    }

    pub fn accent_of(&self, name: &str) -> ColumnAccent {
        self.headers()
            .find(|header| header.name == name)
            .map_or(ColumnAccent::None, |header| header.accent)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    /// 1-based position in the current view
    pub row_number: usize,
    pub row_id: RowId,
    pub is_new: bool,
    pub is_selected: bool,
    pub is_even: bool,
    pub frozen: Vec<CellView>,
    pub scrollable: Vec<CellView>,
}

impl RowView {
    pub fn cells(&self) -> impl Iterator<Item = &CellView> {
        self.frozen.iter().chain(self.scrollable.iter())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellView {
    pub cell_id: CellId,
    /// Display text, `-` for empty values
    pub text: String,
    pub format: CellFormat,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterSummary {
    pub shown: usize,
    pub total: usize,
    pub search: Option<String>,
    pub hidden_columns: usize,
    pub displayed_columns: usize,
    pub total_columns: usize,
}

impl FooterSummary {
    /// `Showing X of Y records`, with the active filter appended
    pub fn records_line(&self) -> String {
        let mut line = format!("Showing {} of {} records", self.shown, self.total);
        if let Some(search) = &self.search {
            line.push_str(&format!(" (filtered by \"{search}\")"));
        }
        line
    }

    pub fn columns_line(&self) -> String {
        let displayed = format!(
            "{} of {} columns displayed",
            self.displayed_columns, self.total_columns
        );
        if self.hidden_columns > 0 {
            format!("{} columns hidden, {displayed}", self.hidden_columns)
        } else {
            displayed
        }
    }
}
