//! COA database page service
//!
//! Owns the page-level state around the grid: column list and metadata,
//! the record set, upload statistics, the fresh-upload highlight and the
//! delete confirmation flow. All network traffic goes through [`CoaApi`].

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use coa_core::{ColumnConfig, Record};
use coa_grid::{RowId, resolve_row_id};
use tokio::time::Instant;

use crate::api::{CoaApi, CoaStats, CsvExport, DEFAULT_CONFIG_PHASE, UploadFile, UploadResponse};
use crate::cache::RecordCache;
use crate::csv::generate_csv;
use crate::error::{DELETE_FAILED_MESSAGE, ServiceError, ServiceResult};
use crate::view_models::{
    DeleteDialog, DeleteKind, ProcessingSummary, RecordsSource, UploadStats,
};

/// Records with fewer populated fields than this need attention
const MIN_POPULATED_FIELDS: usize = 3;

/// Whether a record should be flagged for manual review.
///
/// True when it has fewer than three non-null fields besides `file`, or when
/// any string value is `review` (case-insensitive).
pub fn needs_attention(record: &Record) -> bool {
    if record.populated_field_count() < MIN_POPULATED_FIELDS {
        return true;
    }
    record
        .string_values()
        .any(|value| value.eq_ignore_ascii_case("review"))
}

/// Tunables for [`CoaDatabaseService`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceOptions {
    /// Phase requested for the column list
    pub default_phase: String,
    /// Phase requested for the column metadata
    pub config_phase: String,
    /// How long freshly uploaded rows stay highlighted
    pub highlight: Duration,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            default_phase: "1".to_string(),
            config_phase: DEFAULT_CONFIG_PHASE.to_string(),
            highlight: Duration::from_secs(3),
        }
    }
}

/// Service behind the COA database page
pub struct CoaDatabaseService {
    api: Arc<dyn CoaApi>,
    cache: Option<RecordCache>,
    token: Option<String>,
    options: ServiceOptions,

    columns: Vec<String>,
    columns_config: Vec<ColumnConfig>,
    current_phase: u32,
    records: Vec<Record>,
    stats: UploadStats,
    new_row_ids: HashSet<RowId>,
    highlight_until: Option<Instant>,
    error: Option<String>,
    delete_dialog: DeleteDialog,
}

impl CoaDatabaseService {
    /// Create a new page service
    ///
    /// # Arguments
    ///
    /// * `api` - Backend client
    /// * `token` - Bearer token; authenticated operations fail without one
    pub fn new(api: Arc<dyn CoaApi>, token: Option<String>) -> Self {
        Self {
            api,
            cache: None,
            token: token.filter(|t| !t.is_empty()),
            options: ServiceOptions::default(),
            columns: Vec::new(),
            columns_config: Vec::new(),
            current_phase: 1,
            records: Vec::new(),
            stats: UploadStats::default(),
            new_row_ids: HashSet::new(),
            highlight_until: None,
            error: None,
            delete_dialog: DeleteDialog::default(),
        }
    }

    pub fn with_cache(mut self, cache: RecordCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_options(mut self, options: ServiceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn columns_config(&self) -> &[ColumnConfig] {
        &self.columns_config
    }

    pub fn current_phase(&self) -> u32 {
        self.current_phase
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn stats(&self) -> UploadStats {
        self.stats
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn delete_dialog(&self) -> &DeleteDialog {
        &self.delete_dialog
    }

    /// Row identities of the last upload, until the highlight expires
    pub fn new_row_ids(&self) -> Option<&HashSet<RowId>> {
        match self.highlight_until {
            Some(until) if Instant::now() < until && !self.new_row_ids.is_empty() => {
                Some(&self.new_row_ids)
            }
            _ => None,
        }
    }

    fn require_token(&mut self) -> ServiceResult<String> {
        match &self.token {
            Some(token) => Ok(token.clone()),
            None => {
                self.error = Some(ServiceError::AuthenticationRequired.to_string());
                Err(ServiceError::AuthenticationRequired)
            }
        }
    }

    fn recompute_stats(&mut self) {
        self.stats = UploadStats {
            total_files_uploaded: self.records.len(),
            successful_files: self.records.len(),
            failed_files: 0,
            files_needing_attention: self.records.iter().filter(|r| needs_attention(r)).count(),
        };
    }

    /// Fetch the column list and its metadata concurrently
    #[tracing::instrument(skip(self))]
    pub async fn load_columns(&mut self) -> ServiceResult<()> {
        let (columns, config) = tokio::join!(
            self.api.fetch_coa_columns(Some(self.options.default_phase.as_str())),
            self.api.fetch_coa_columns_config(Some(self.options.config_phase.as_str())),
        );

        let (columns, config) = match (columns, config) {
            (Ok(columns), Ok(config)) => (columns, config),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!("Failed to load columns: {}", e);
                self.error = Some(e.to_string());
                return Err(e);
            }
        };

        self.current_phase = columns.phase.unwrap_or(1);
        tracing::info!(
            columns = columns.columns.len(),
            config = config.columns_config.len(),
            phase = self.current_phase,
            "Loaded COA columns"
        );
        self.columns = columns.columns;
        self.columns_config = config.columns_config;
        Ok(())
    }

    /// Load records from the backend, falling back to the local cache
    #[tracing::instrument(skip(self))]
    pub async fn load_records(&mut self) -> ServiceResult<RecordsSource> {
        let token = self.require_token()?;

        match self.api.fetch_coa_records(&token).await {
            Ok(response) => {
                self.records = response.records;
                self.recompute_stats();
                tracing::info!(records = self.records.len(), "Loaded COA records");
                self.write_cache().await;
                Ok(RecordsSource::Backend)
            }
            Err(e) => {
                tracing::warn!("Failed to load COA data from database: {}", e);
                Ok(self.restore_from_cache().await)
            }
        }
    }

    async fn restore_from_cache(&mut self) -> RecordsSource {
        let Some(cache) = &self.cache else {
            return RecordsSource::Unavailable;
        };

        let mut restored = false;
        match cache.load_records().await {
            Ok(Some(records)) => {
                tracing::info!(records = records.len(), "Restored COA records from cache");
                self.records = records;
                restored = true;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to load stored COA data: {}", e),
        }
        match cache.load_stats().await {
            Ok(Some(stats)) => self.stats = stats,
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to load stored COA stats: {}", e),
        }

        if restored {
            RecordsSource::Cache
        } else {
            RecordsSource::Unavailable
        }
    }

    async fn write_cache(&self) {
        let Some(cache) = &self.cache else {
            return;
        };
        if let Err(e) = cache.save_records(&self.records).await {
            tracing::warn!("Failed to cache COA records: {}", e);
        }
        if let Err(e) = cache.save_stats(&self.stats).await {
            tracing::warn!("Failed to cache COA stats: {}", e);
        }
    }

    /// Upload files, reload the records and highlight the new rows
    #[tracing::instrument(skip(self, files), fields(files = files.len()))]
    pub async fn upload(&mut self, files: Vec<UploadFile>) -> ServiceResult<ProcessingSummary> {
        let token = self.require_token()?;
        let file_count = files.len();
        let started = Instant::now();

        let (response, records) = match self.upload_and_reload(files, &token).await {
            Ok(result) => result,
            Err(e) => {
                self.stats.total_files_uploaded += file_count;
                self.stats.failed_files += file_count;
                tracing::error!("Upload of {} files failed: {}", file_count, e);
                return Err(e);
            }
        };

        let new_ids: HashSet<RowId> = response
            .results
            .iter()
            .enumerate()
            .map(|(index, result)| resolve_row_id(result, Some(index)))
            .collect();
        let total_fields_extracted: usize = response
            .results
            .iter()
            .map(Record::populated_field_count)
            .sum();
        let success_count = response.results.len();
        let failed_count = file_count.saturating_sub(success_count);

        self.records = records;
        self.new_row_ids = new_ids;
        self.highlight_until = Some(Instant::now() + self.options.highlight);

        self.stats.total_files_uploaded += file_count;
        self.stats.successful_files += success_count;
        self.stats.failed_files += failed_count;
        self.stats.files_needing_attention += response
            .results
            .iter()
            .filter(|r| needs_attention(r))
            .count();

        tracing::info!(
            "Uploaded {} files, {} saved to database",
            file_count,
            response.saved_to_database.unwrap_or(0)
        );

        Ok(ProcessingSummary {
            total_files: file_count,
            success_count,
            failed_count,
            processing_time: started.elapsed(),
            total_fields_extracted,
        })
    }

    async fn upload_and_reload(
        &self,
        files: Vec<UploadFile>,
        token: &str,
    ) -> ServiceResult<(UploadResponse, Vec<Record>)> {
        let response = self.api.upload_coa_files(files, token).await?;
        let reloaded = self.api.fetch_coa_records(token).await?;
        Ok((response, reloaded.records))
    }

    /// Open the delete confirmation dialog for `rows`
    pub fn request_delete(&mut self, kind: DeleteKind, rows: Vec<Record>) {
        let item_name = match kind {
            DeleteKind::Single => rows.first().map(|r| r.file.clone()).unwrap_or_default(),
            DeleteKind::Bulk | DeleteKind::Clear => String::new(),
        };
        self.delete_dialog = DeleteDialog {
            is_open: true,
            kind,
            item_name,
            item_count: rows.len(),
            selected_rows: rows,
            loading: false,
        };
    }

    /// Open the dialog for wiping every record
    pub fn request_clear(&mut self) {
        self.request_delete(DeleteKind::Clear, self.records.clone());
    }

    pub fn cancel_delete(&mut self) {
        self.delete_dialog.is_open = false;
    }

    /// Carry out the pending delete. Returns how many local rows were removed.
    #[tracing::instrument(skip(self), fields(kind = ?self.delete_dialog.kind))]
    pub async fn confirm_delete(&mut self) -> ServiceResult<usize> {
        self.delete_dialog.loading = true;
        let token = match self.require_token() {
            Ok(token) => token,
            Err(e) => {
                self.delete_dialog.loading = false;
                return Err(e);
            }
        };

        let record_ids = self.delete_dialog.record_ids();
        if record_ids.is_empty() {
            tracing::warn!("No record IDs found for deletion, records may not be saved yet");
        } else {
            match self.api.delete_coa_records(&record_ids, &token).await {
                Ok(result) => tracing::info!(
                    "Deleted {} records from database",
                    result.deleted_count
                ),
                Err(e) => {
                    tracing::error!("Failed to delete records: {}", e);
                    self.error = Some(DELETE_FAILED_MESSAGE.to_string());
                    self.delete_dialog.loading = false;
                    return Err(e);
                }
            }
        }

        let before = self.records.len();
        if self.delete_dialog.kind == DeleteKind::Clear {
            self.records.clear();
            self.stats = UploadStats::default();
            self.clear_cache().await;
        } else {
            self.remove_selected_rows();
            self.stats.total_files_uploaded = self.records.len();
            self.stats.successful_files = self.records.len();
            self.stats.files_needing_attention =
                self.records.iter().filter(|r| needs_attention(r)).count();

            if self.records.is_empty() {
                self.clear_cache().await;
            } else if let Some(cache) = &self.cache {
                if let Err(e) = cache.save_records(&self.records).await {
                    tracing::warn!("Failed to cache COA records: {}", e);
                }
            }
        }
        let removed = before - self.records.len();
        tracing::info!("Removed {} records from local state", removed);

        if !record_ids.is_empty() {
            match self.api.fetch_coa_records(&token).await {
                Ok(response) => {
                    tracing::info!("Reloaded {} records from database", response.records.len());
                    self.records = response.records;
                }
                Err(e) => tracing::error!("Failed to reload data after deletion: {}", e),
            }
        }

        self.delete_dialog = DeleteDialog::default();
        Ok(removed)
    }

    /// Drop rows whose id was selected, or whose file matches a selected row
    fn remove_selected_rows(&mut self) {
        let selected = &self.delete_dialog.selected_rows;
        let ids: HashSet<&str> = selected
            .iter()
            .filter_map(|row| row.id.as_deref())
            .filter(|id| !id.is_empty())
            .collect();
        let files: HashSet<&str> = selected.iter().map(|row| row.file.as_str()).collect();

        self.records.retain(|row| {
            let id_selected = row.id.as_deref().is_some_and(|id| ids.contains(id));
            !id_selected && !files.contains(row.file.as_str())
        });
    }

    async fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.clear().await {
                tracing::warn!("Failed to clear COA cache: {}", e);
            }
        }
    }

    /// Export rows through the backend. Nothing is sent for an empty selection.
    #[tracing::instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn export(&self, rows: &[Record]) -> ServiceResult<Option<CsvExport>> {
        if rows.is_empty() {
            return Ok(None);
        }
        self.api.export_coa_csv(rows).await.map(Some)
    }

    /// CSV of every loaded record, rendered locally
    pub fn generate_csv(&self) -> String {
        generate_csv(&self.records)
    }

    /// Dashboard statistics for the COA module
    pub async fn fetch_stats(&mut self) -> ServiceResult<CoaStats> {
        let token = self.require_token()?;
        self.api.fetch_coa_stats(&token).await
    }
}
