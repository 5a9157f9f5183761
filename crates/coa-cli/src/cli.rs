//! `coa` - the COA lab-data grid in the terminal
//!
//! Renders COA records either from local JSON files (`coa view`) or from the
//! backend (`coa fetch`), and drives uploads, deletes and exports through
//! [`CoaDatabaseService`].

mod logging;
mod render;

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use coa_core::{ColumnConfig, Record};
use coa_grid::{CoaGrid, NumberFormat};
use coa_services::{
    CoaDatabaseService, DeleteKind, HttpCoaApi, RecordCache, RecordsSource, ServiceOptions,
    UploadFile, generate_csv,
};
use coa_settings::{CoaSettings, ENV_API_BASE_URL, ENV_API_TOKEN};
use serde::de::DeserializeOwned;

use crate::logging::LoggingConfig;

#[derive(Parser)]
#[command(name = "coa", version)]
#[command(about = "COA lab-data grid: view, upload, delete and export COA records", long_about = None)]
struct Cli {
    /// Debug logging with spans on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render records from local JSON files
    View {
        /// Records file: an array, or an object with a `records` array
        #[arg(long)]
        records: PathBuf,

        /// Column list file; defaults to the record fields in order
        #[arg(long)]
        columns: Option<PathBuf>,

        /// Column metadata file: an array, or an object with `columnsConfig`
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        grid: GridArgs,

        /// Write the selected rows to this CSV file
        #[arg(long, value_name = "FILE")]
        export_selected: Option<PathBuf>,
    },

    /// Load columns and records from the backend and render them
    Fetch {
        /// Column phase to request
        #[arg(long)]
        phase: Option<String>,

        #[command(flatten)]
        grid: GridArgs,

        /// Export the selected rows through the backend
        #[arg(long)]
        export_selected: bool,

        /// Export destination; defaults to the filename the backend suggests
        #[arg(long, value_name = "FILE", requires = "export_selected")]
        out: Option<PathBuf>,

        /// Delete the selected rows
        #[arg(long)]
        delete_selected: bool,
    },

    /// Write a CSV of local records
    Export {
        #[arg(long)]
        records: PathBuf,

        /// Output file; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Upload COA PDFs for extraction
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show local upload statistics and backend dashboard statistics
    Stats,

    /// Delete every saved record on the server, then wipe the local stats and
    /// offline cache. Only lists what would be deleted unless `--yes` is given.
    Clear {
        /// Confirm the server-side delete
        #[arg(long)]
        yes: bool,
    },

    /// Show the effective settings
    Settings {
        /// Create the config and data directories and write a settings file
        /// if none exists
        #[arg(long)]
        init: bool,
    },
}

/// Interactions replayed against the grid before rendering
#[derive(Args, Debug, Default, Clone)]
struct GridArgs {
    /// Case-insensitive substring filter over the displayed columns
    #[arg(short, long)]
    search: Option<String>,

    /// Click a column header; repeat to cycle ascending, descending, unsorted
    #[arg(long = "sort", value_name = "COLUMN")]
    sort: Vec<String>,

    /// Toggle a column's visibility by its index in the column list
    #[arg(long = "toggle", value_name = "INDEX")]
    toggle: Vec<usize>,

    /// Show every column, including the ones hidden by default
    #[arg(long)]
    show_all: bool,

    /// Format a whole column, e.g. `pH=number` or `Yield=percentage`
    #[arg(long = "format", value_name = "COLUMN=FORMAT", value_parser = parse_column_format)]
    format: Vec<(String, NumberFormat)>,

    /// Select every visible row
    #[arg(long)]
    select_all: bool,

    /// Select visible rows by their 1-based row number
    #[arg(long = "select", value_name = "ROW")]
    select: Vec<usize>,
}

fn parse_column_format(value: &str) -> Result<(String, NumberFormat), String> {
    let (column, format) = value
        .split_once('=')
        .ok_or_else(|| format!("expected COLUMN=FORMAT, got `{value}`"))?;
    let format = match format.trim().to_ascii_lowercase().as_str() {
        "default" => NumberFormat::Default,
        "number" => NumberFormat::Number,
        "percentage" | "percent" => NumberFormat::Percentage,
        "currency" => NumberFormat::Currency,
        other => return Err(format!("unknown number format `{other}`")),
    };
    Ok((column.to_string(), format))
}

/// Rows handed to the grid's export/delete callbacks
type Captured = Rc<RefCell<Vec<Record>>>;

fn capture() -> (Captured, impl Fn(&[Record]) + 'static) {
    let captured: Captured = Rc::default();
    let sink = captured.clone();
    (captured, move |rows: &[Record]| {
        *sink.borrow_mut() = rows.to_vec();
    })
}

fn apply_grid_args(grid: &mut CoaGrid, args: &GridArgs) {
    if args.show_all {
        grid.show_all_columns();
    }
    for index in &args.toggle {
        grid.toggle_column(*index);
    }
    if let Some(search) = &args.search {
        grid.set_search(search.as_str());
    }
    for column in &args.sort {
        grid.click_header(column);
    }

    for (column, format) in &args.format {
        for row_id in grid.visible_rows() {
            grid.toggle_cell(row_id, column.as_str());
        }
        let formatted = grid.apply_number_format(*format);
        tracing::debug!(column = %column, formatted, "Applied number format");
        grid.clear_cell_selection();
    }

    if args.select_all {
        grid.select_all(true);
    }
    let visible = grid.visible_rows();
    for row_number in &args.select {
        match row_number.checked_sub(1).and_then(|i| visible.get(i)) {
            Some(row_id) => grid.select_row(row_id.clone(), true),
            None => tracing::warn!("No visible row {}", row_number),
        }
    }
}

/// Read a JSON array, either bare or under `key` in an object
fn read_json_list<T: DeserializeOwned>(path: &Path, key: &str) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {:?}", path))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON in {:?}", path))?;

    let items = match value {
        items @ serde_json::Value::Array(_) => items,
        serde_json::Value::Object(mut map) => map
            .remove(key)
            .with_context(|| format!("{:?} has no `{}` array", path, key))?,
        _ => bail!("{:?} must contain an array or an object with `{}`", path, key),
    };
    serde_json::from_value(items).with_context(|| format!("Invalid `{}` in {:?}", key, path))
}

/// Extra field names across all records, in first-seen order
fn columns_from_records(records: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for name in records.iter().flat_map(|r| r.extra.keys()) {
        if !columns.contains(name) {
            columns.push(name.clone());
        }
    }
    columns
}

fn write_output(out: Option<&Path>, content: &[u8]) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;
            eprintln!("Wrote {} bytes to {}", content.len(), path.display());
        }
        None => {
            use std::io::Write;
            std::io::stdout().write_all(content)?;
        }
    }
    Ok(())
}

fn view_local(
    records: &Path,
    columns: Option<&Path>,
    config: Option<&Path>,
    args: &GridArgs,
    export_selected: Option<&Path>,
) -> Result<()> {
    let records: Vec<Record> = read_json_list(records, "records")?;
    let columns = match columns {
        Some(path) => read_json_list(path, "columns")?,
        None => columns_from_records(&records),
    };
    let columns_config: Vec<ColumnConfig> = match config {
        Some(path) => read_json_list(path, "columnsConfig")?,
        None => Vec::new(),
    };

    let (exported, on_export) = capture();
    let mut grid = CoaGrid::new().with_on_export(on_export);
    grid.set_columns(columns);
    grid.set_columns_config(columns_config);
    grid.load_records(records);
    apply_grid_args(&mut grid, args);

    println!("{}", render::render_grid(&grid.view()));

    if let Some(out) = export_selected {
        if grid.export_selected() == 0 {
            eprintln!("No rows selected, nothing exported");
        } else {
            write_output(Some(out), generate_csv(&exported.borrow()).as_bytes())?;
        }
    }
    Ok(())
}

fn connect(settings: &CoaSettings, phase: Option<String>) -> Result<CoaDatabaseService> {
    let api = HttpCoaApi::new(settings.api.base_url.as_str(), settings.api.timeout())
        .context("Failed to build the HTTP client")?;
    let options = ServiceOptions {
        default_phase: phase.unwrap_or_else(|| settings.grid.default_phase.clone()),
        config_phase: settings.grid.config_phase.clone(),
        highlight: settings.grid.highlight(),
    };

    let mut service =
        CoaDatabaseService::new(Arc::new(api), settings.api.token.clone()).with_options(options);
    if let Some(dir) = settings.cache_dir()? {
        service = service.with_cache(RecordCache::new(dir));
    }
    Ok(service)
}

async fn load(service: &mut CoaDatabaseService) -> Result<()> {
    if let Err(e) = service.load_columns().await {
        tracing::warn!("Column list unavailable: {}", e);
    }
    match service.load_records().await? {
        RecordsSource::Backend => {}
        RecordsSource::Cache => eprintln!("Backend unreachable, showing cached records"),
        RecordsSource::Unavailable => {
            eprintln!("{}", service.error().unwrap_or("Failed to load COA records"))
        }
    }
    Ok(())
}

fn grid_for(service: &CoaDatabaseService) -> CoaGrid {
    let mut grid = CoaGrid::new();
    grid.set_columns(service.columns().to_vec());
    grid.set_columns_config(service.columns_config().to_vec());
    grid.load_records(service.records().to_vec());
    if let Some(ids) = service.new_row_ids() {
        grid.set_new_row_ids(ids.iter().cloned());
    }
    grid
}

async fn fetch(
    settings: &CoaSettings,
    phase: Option<String>,
    args: &GridArgs,
    export_selected: bool,
    out: Option<&Path>,
    delete_selected: bool,
) -> Result<()> {
    let mut service = connect(settings, phase)?;
    load(&mut service).await?;

    let (exported, on_export) = capture();
    let (deleted, on_delete) = capture();
    let mut grid = grid_for(&service)
        .with_on_export(on_export)
        .with_on_delete(on_delete);
    apply_grid_args(&mut grid, args);

    println!("{}", render::render_grid(&grid.view()));

    if export_selected {
        grid.export_selected();
        let rows = exported.borrow().clone();
        match service.export(&rows).await? {
            Some(export) => {
                let path = out.map_or_else(|| PathBuf::from(&export.filename), Path::to_path_buf);
                write_output(Some(&path), &export.bytes)?;
            }
            None => eprintln!("No rows selected, nothing exported"),
        }
    }

    if delete_selected {
        if grid.delete_selected() == 0 {
            eprintln!("No rows selected, nothing deleted");
            return Ok(());
        }
        let rows = deleted.borrow().clone();
        service.request_delete(DeleteKind::Bulk, rows);
        let dialog = service.delete_dialog();
        eprintln!(
            "Deleting {} records: {}",
            dialog.item_count,
            dialog.selected_items().join(", ")
        );
        let removed = service.confirm_delete().await?;
        eprintln!("Removed {} records", removed);
    }
    Ok(())
}

async fn upload(settings: &CoaSettings, paths: &[PathBuf]) -> Result<()> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(UploadFile::from_path(path).await?);
    }

    let mut service = connect(settings, None)?;
    if let Err(e) = service.load_columns().await {
        tracing::warn!("Column list unavailable: {}", e);
    }
    let summary = service.upload(files).await?;

    println!("{}", render::render_grid(&grid_for(&service).view()));
    println!("{}", render::render_summary(&summary));
    Ok(())
}

async fn stats(settings: &CoaSettings) -> Result<()> {
    let mut service = connect(settings, None)?;
    load(&mut service).await?;
    println!("{}", render::render_upload_stats(&service.stats()));

    let backend = service.fetch_stats().await?;
    println!("{}", render::render_backend_stats(&backend));
    Ok(())
}

async fn clear(settings: &CoaSettings, yes: bool) -> Result<()> {
    let mut service = connect(settings, None)?;
    load(&mut service).await?;
    if let Some(removed) = clear_records(&mut service, yes).await? {
        eprintln!("Cleared {} records", removed);
    }
    Ok(())
}

/// Open the clear dialog and confirm it only when `yes` is set.
///
/// Returns `None` when the dialog was cancelled.
async fn clear_records(service: &mut CoaDatabaseService, yes: bool) -> Result<Option<usize>> {
    service.request_clear();
    let dialog = service.delete_dialog();
    if !yes {
        eprintln!(
            "This deletes {} records on the server: {}",
            dialog.item_count,
            dialog.selected_items().join(", ")
        );
        eprintln!("Run again with --yes to confirm");
        service.cancel_delete();
        return Ok(None);
    }
    Ok(Some(service.confirm_delete().await?))
}

/// Tokens shorter than this are hidden completely
const MIN_PARTIAL_MASK_LEN: usize = 12;

fn masked(token: &str) -> String {
    if token.chars().count() < MIN_PARTIAL_MASK_LEN {
        return "********".to_string();
    }
    let visible: String = token.chars().take(4).collect();
    format!("{visible}****")
}

fn show_settings(mut settings: CoaSettings, init: bool) -> Result<()> {
    let path = CoaSettings::settings_path()?;
    if init {
        for dir in coa_settings::ensure_directories()? {
            eprintln!("Ensured {}", dir.display());
        }
        if !path.exists() {
            CoaSettings::default().save_to(&path)?;
            eprintln!("Wrote default settings");
        }
    }

    settings.api.token = settings.api.token.as_deref().map(masked);
    println!("Settings file: {}", path.display());
    println!("Overrides: {}, {}", ENV_API_BASE_URL, ENV_API_TOKEN);
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let logging = if cli.verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::default()
    };
    let _guard = logging::init(logging)?;

    match cli.command {
        Commands::View {
            records,
            columns,
            config,
            grid,
            export_selected,
        } => view_local(
            &records,
            columns.as_deref(),
            config.as_deref(),
            &grid,
            export_selected.as_deref(),
        ),
        Commands::Fetch {
            phase,
            grid,
            export_selected,
            out,
            delete_selected,
        } => {
            let settings = CoaSettings::load()?;
            fetch(
                &settings,
                phase,
                &grid,
                export_selected,
                out.as_deref(),
                delete_selected,
            )
            .await
        }
        Commands::Export { records, out } => {
            let records: Vec<Record> = read_json_list(&records, "records")?;
            write_output(out.as_deref(), generate_csv(&records).as_bytes())
        }
        Commands::Upload { files } => upload(&CoaSettings::load()?, &files).await,
        Commands::Stats => stats(&CoaSettings::load()?).await,
        Commands::Clear { yes } => clear(&CoaSettings::load()?, yes).await,
        Commands::Settings { init } => show_settings(CoaSettings::load()?, init),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use clap::CommandFactory;
    use coa_core::ColumnType;
    use coa_services::{
        CoaApi, CoaStats, ColumnsConfigResponse, ColumnsResponse, CsvExport, DeleteResponse,
        RecordsResponse, ServiceError, ServiceResult, UploadResponse,
    };
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    /// Backend serving a fixed record list and logging delete requests
    #[derive(Default)]
    struct RecordingApi {
        records: Vec<Record>,
        deletes: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl CoaApi for RecordingApi {
        async fn fetch_coa_records(&self, _token: &str) -> ServiceResult<RecordsResponse> {
            Ok(RecordsResponse {
                records: self.records.clone(),
            })
        }

        async fn upload_coa_files(
            &self,
            _files: Vec<UploadFile>,
            _token: &str,
        ) -> ServiceResult<UploadResponse> {
            Ok(UploadResponse::default())
        }

        async fn delete_coa_records(
            &self,
            record_ids: &[String],
            _token: &str,
        ) -> ServiceResult<DeleteResponse> {
            self.deletes.lock().push(record_ids.to_vec());
            Ok(DeleteResponse {
                deleted_count: record_ids.len() as u64,
            })
        }

        async fn export_coa_csv(&self, _rows: &[Record]) -> ServiceResult<CsvExport> {
            Err(ServiceError::api("export_coa_csv", "not supported"))
        }

        async fn fetch_coa_columns(&self, _phase: Option<&str>) -> ServiceResult<ColumnsResponse> {
            Ok(ColumnsResponse::default())
        }

        async fn fetch_coa_columns_config(
            &self,
            _phase: Option<&str>,
        ) -> ServiceResult<ColumnsConfigResponse> {
            Ok(ColumnsConfigResponse::default())
        }

        async fn fetch_coa_stats(&self, _token: &str) -> ServiceResult<CoaStats> {
            Ok(CoaStats::default())
        }
    }

    fn grid(records: Vec<Record>) -> CoaGrid {
        let mut grid = CoaGrid::new();
        grid.set_columns(columns_from_records(&records));
        grid.load_records(records);
        grid
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_column_format() {
        assert_eq!(
            parse_column_format("Yield=Percent").unwrap(),
            ("Yield".to_string(), NumberFormat::Percentage)
        );
        assert!(parse_column_format("Yield").is_err());
        assert!(parse_column_format("Yield=roman").is_err());
    }

    #[test]
    fn test_read_json_list_accepts_array_and_wrapper() {
        let dir = tempfile::tempdir().unwrap();
        let bare = dir.path().join("bare.json");
        let wrapped = dir.path().join("wrapped.json");
        std::fs::write(&bare, r#"[{"file":"a.pdf","pH":7}]"#).unwrap();
        std::fs::write(&wrapped, r#"{"records":[{"file":"b.pdf"}]}"#).unwrap();

        let records: Vec<Record> = read_json_list(&bare, "records").unwrap();
        assert_eq!(records[0].display_value("pH"), "7");
        let records: Vec<Record> = read_json_list(&wrapped, "records").unwrap();
        assert_eq!(records[0].file, "b.pdf");
    }

    #[test]
    fn test_read_json_list_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"columns":[]}"#).unwrap();
        assert!(read_json_list::<ColumnConfig>(&path, "columnsConfig").is_err());

        std::fs::write(&path, r#"{"columnsConfig":[{"name":"pH","type":"PL"}]}"#).unwrap();
        let config: Vec<ColumnConfig> = read_json_list(&path, "columnsConfig").unwrap();
        assert_eq!(config[0].column_type, ColumnType::PL);
    }

    #[test]
    fn test_columns_from_records_keeps_first_seen_order() {
        let records = vec![
            Record::new("a.pdf").with_field("B", "1").with_field("A", "2"),
            Record::new("b.pdf").with_field("C", "3").with_field("B", "4"),
        ];
        assert_eq!(columns_from_records(&records), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_grid_args_format_and_select() {
        let mut grid = grid(vec![
            Record::new("a.pdf").with_field("Yield", "0.5"),
            Record::new("b.pdf").with_field("Yield", "0.25"),
        ]);
        let args = GridArgs {
            sort: vec!["Yield".to_string()],
            format: vec![("Yield".to_string(), NumberFormat::Percentage)],
            select: vec![1, 5],
            ..Default::default()
        };
        apply_grid_args(&mut grid, &args);

        let view = grid.view();
        let texts: Vec<&str> = view.rows.iter().map(|r| r.frozen[0].text.as_str()).collect();
        assert_eq!(texts, vec!["25.00%", "50.00%"]);
        assert!(view.rows[0].is_selected);
        assert!(!view.rows[1].is_selected);
        assert_eq!(grid.selected_cell_count(), 0);
    }

    #[test]
    fn test_export_callback_captures_selection() {
        let (exported, on_export) = capture();
        let mut grid = grid(vec![Record::new("a.pdf"), Record::new("b.pdf")])
            .with_on_export(on_export);
        grid.select_all(true);

        assert_eq!(grid.export_selected(), 2);
        assert_eq!(exported.borrow().len(), 2);
    }

    #[test]
    fn test_clear_requires_yes_flag() {
        let cli = Cli::try_parse_from(["coa", "clear"]).unwrap();
        assert!(matches!(cli.command, Commands::Clear { yes: false }));
        let cli = Cli::try_parse_from(["coa", "clear", "--yes"]).unwrap();
        assert!(matches!(cli.command, Commands::Clear { yes: true }));
    }

    #[tokio::test]
    async fn test_clear_without_yes_sends_no_delete() {
        let api = Arc::new(RecordingApi {
            records: vec![
                Record::new("a.pdf").with_id("1"),
                Record::new("b.pdf").with_id("2"),
            ],
            ..Default::default()
        });
        let mut service =
            CoaDatabaseService::new(api.clone() as Arc<dyn CoaApi>, Some("token".to_string()));
        service.load_records().await.unwrap();

        assert_eq!(clear_records(&mut service, false).await.unwrap(), None);
        assert!(api.deletes.lock().is_empty());
        assert!(!service.delete_dialog().is_open);
        assert_eq!(service.records().len(), 2);

        assert_eq!(clear_records(&mut service, true).await.unwrap(), Some(2));
        assert_eq!(
            *api.deletes.lock(),
            vec![vec!["1".to_string(), "2".to_string()]]
        );
    }

    #[test]
    fn test_masked_token() {
        assert_eq!(masked("abcdef123456789"), "abcd****");
        assert_eq!(masked("abcd"), "********");
        assert_eq!(masked("abcdef12345"), "********");
    }
}
