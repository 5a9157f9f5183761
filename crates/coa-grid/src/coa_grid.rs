//! COA Grid - the interactive data-grid engine behind the COA database table
//!
//! The engine turns a list of heterogeneous [`coa_core::Record`]s into a
//! two-pane table model. It owns no I/O; the host supplies records and
//! columns and receives export/delete intents through callbacks.
//!
//! Pipeline, recomputed synchronously on every state change:
//!
//! ```text
//! records -> Snapshot (epoch + row identities)
//!         -> ColumnVisibility (display columns)
//!         -> search::filter_rows
//!         -> sort::sort_rows
//!         -> GridView (frozen pane + scrollable pane)
//! ```

mod columns;
mod format;
mod grid;
mod header;
mod overlay;
mod row_identity;
pub mod search;
mod selection;
mod snapshot;
pub mod sort;

pub use columns::{
    BATCH_COLUMN, ColumnKey, ColumnVisibility, DisplayColumn, Pane, column_label,
    column_signature, compute_default_hidden, is_blank_header,
};
pub use format::{CellFormat, FormatFlag, NumberFormat, format_value, parse_numeric};
pub use grid::{CellView, CoaGrid, FooterSummary, GridView, RowView, RowsCallback};
pub use header::{ColumnAccent, HeaderCell, column_accent, column_tooltip, find_column_config};
pub use overlay::{CellId, CellOverlay};
pub use row_identity::{RESERVED_IDENTITY_FIELDS, RowId, resolve_row_id};
pub use selection::{RowSelection, SelectionState};
pub use snapshot::{Snapshot, SnapshotEpoch};
pub use sort::{SortDirection, SortIndicator, SortKey};
