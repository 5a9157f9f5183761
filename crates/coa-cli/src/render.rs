//! Terminal rendering of a [`GridView`]

use coa_grid::{GridView, HeaderCell, RowView, SelectionState, SortIndicator};
use coa_services::{CoaStats, ProcessingSummary, UploadStats};
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};

const EMPTY_TITLE: &str = "No data yet";
const EMPTY_HINT: &str = "Upload PDF files to extract and display COA data";

fn header_text(header: &HeaderCell) -> String {
    match header.sort {
        SortIndicator::Ascending => format!("{} ↑", header.label),
        SortIndicator::Descending => format!("{} ↓", header.label),
        SortIndicator::Unsorted => header.label.clone(),
    }
}

fn accent_color(accent: coa_grid::ColumnAccent) -> Option<Color> {
    use coa_grid::ColumnAccent;
    match accent {
        ColumnAccent::None => None,
        ColumnAccent::Blue => Some(Color::Blue),
        ColumnAccent::Green => Some(Color::Green),
        ColumnAccent::Red => Some(Color::Red),
        ColumnAccent::Purple => Some(Color::Magenta),
        ColumnAccent::Orange => Some(Color::Yellow),
    }
}

fn selection_marker(state: SelectionState) -> &'static str {
    match state {
        SelectionState::Empty => "[ ]",
        SelectionState::Partial => "[-]",
        SelectionState::All => "[x]",
    }
}

/// `*` marks selected rows, `+` rows from the last upload
fn row_number(row: &RowView) -> String {
    let mut text = row.row_number.to_string();
    if row.is_selected {
        text.push('*');
    }
    if row.is_new {
        text.push('+');
    }
    text
}

pub fn grid_table(view: &GridView) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![Cell::new(format!("{} #", selection_marker(view.selection)))];
    header.extend(view.headers().map(|h| {
        let cell = Cell::new(header_text(h)).add_attribute(Attribute::Bold);
        match accent_color(h.accent) {
            Some(color) => cell.fg(color),
            None => cell,
        }
    }));
    table.set_header(header);

    for row in &view.rows {
        let mut cells = vec![Cell::new(row_number(row))];
        cells.extend(row.cells().map(|cell| {
            let mut rendered = Cell::new(&cell.text);
            if cell.format.bold {
                rendered = rendered.add_attribute(Attribute::Bold);
            }
            if cell.format.italic {
                rendered = rendered.add_attribute(Attribute::Italic);
            }
            if cell.format.underline {
                rendered = rendered.add_attribute(Attribute::Underlined);
            }
            if cell.format.strikethrough {
                rendered = rendered.add_attribute(Attribute::CrossedOut);
            }
            if cell.selected {
                rendered = rendered.add_attribute(Attribute::Reverse);
            }
            rendered
        }));
        table.add_row(cells);
    }

    table
}

/// Full grid output: the table followed by the footer lines, or the empty
/// placeholder when no row is visible
pub fn render_grid(view: &GridView) -> String {
    let Some(footer) = &view.footer else {
        return format!("{EMPTY_TITLE}\n{EMPTY_HINT}");
    };

    let mut out = grid_table(view).to_string();
    out.push('\n');
    out.push_str(&footer.records_line());
    out.push('\n');
    out.push_str(&footer.columns_line());
    if view.selected_count > 0 {
        out.push_str(&format!("\n{} selected", view.selected_count));
    }
    out
}

pub fn render_upload_stats(stats: &UploadStats) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Uploaded", "Successful", "Failed", "Needs attention"]);
    table.add_row(vec![
        stats.total_files_uploaded.to_string(),
        stats.successful_files.to_string(),
        stats.failed_files.to_string(),
        stats.files_needing_attention.to_string(),
    ]);
    table.to_string()
}

pub fn render_backend_stats(stats: &CoaStats) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Total files".to_string(), stats.total_files.to_string()]);
    table.add_row(vec![
        "Samples this month".to_string(),
        stats.total_samples_this_month.to_string(),
    ]);
    table.add_row(vec![
        "Avg processing time".to_string(),
        stats.avg_processing_time.clone(),
    ]);
    table.add_row(vec![
        "Last upload".to_string(),
        stats.last_upload_date.clone().unwrap_or_else(|| "-".to_string()),
    ]);
    for month in &stats.monthly_uploads {
        table.add_row(vec![month.month.clone(), month.uploads.to_string()]);
    }
    table.to_string()
}

pub fn render_summary(summary: &ProcessingSummary) -> String {
    format!(
        "Processed {} files in {:.1}s: {} succeeded, {} failed, {} fields extracted",
        summary.total_files,
        summary.processing_time.as_secs_f64(),
        summary.success_count,
        summary.failed_count,
        summary.total_fields_extracted
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use coa_core::{ColumnConfig, ColumnType, Record};
    use coa_grid::CoaGrid;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn grid() -> CoaGrid {
        let mut grid = CoaGrid::new();
        grid.set_columns(vec![
            "Sample #".to_string(),
            "Batch".to_string(),
            "pH".to_string(),
        ]);
        grid.set_columns_config(vec![ColumnConfig::new("pH", ColumnType::PL)]);
        grid.load_records(vec![
            Record::new("a.pdf")
                .with_field("Sample #", "S1")
                .with_field("pH", "7"),
            Record::new("b.pdf").with_field("Sample #", "S2"),
        ]);
        grid
    }

    #[test]
    fn test_empty_view_shows_placeholder() {
        let view = CoaGrid::new().view();
        assert_eq!(
            render_grid(&view),
            "No data yet\nUpload PDF files to extract and display COA data"
        );
    }

    #[test]
    fn test_grid_output_contains_cells_and_footer() {
        let mut grid = grid();
        grid.click_header("pH");
        let out = render_grid(&grid.view());

        assert!(out.contains("Sample #"));
        assert!(out.contains("pH ↑"));
        assert!(out.contains("S2"));
        assert!(out.contains("Showing 2 of 2 records"));
        assert!(out.ends_with("3 of 3 columns displayed"));
    }

    #[test]
    fn test_selected_rows_are_marked() {
        let mut grid = grid();
        grid.select_all(true);
        let view = grid.view();

        assert_eq!(row_number(&view.rows[0]), "1*");
        assert_eq!(selection_marker(view.selection), "[x]");
        assert!(render_grid(&view).ends_with("2 selected"));
    }

    #[test]
    fn test_summary_line() {
        let summary = ProcessingSummary {
            total_files: 3,
            success_count: 2,
            failed_count: 1,
            processing_time: Duration::from_millis(1500),
            total_fields_extracted: 12,
        };
        assert_eq!(
            render_summary(&summary),
            "Processed 3 files in 1.5s: 2 succeeded, 1 failed, 12 fields extracted"
        );
    }
}
