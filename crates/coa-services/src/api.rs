//! Backend API contract
//!
//! [`CoaApi`] is the seam between the page service and the network. The
//! production implementation is [`crate::HttpCoaApi`]; tests substitute a mock.

use std::path::Path;
use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::NaiveDate;
use coa_core::{ColumnConfig, Record};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ServiceResult;

/// Config phase requested when the caller does not name one
pub const DEFAULT_CONFIG_PHASE: &str = "phase1-config";

static CONTENT_DISPOSITION_FILENAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)filename="?([^";]+)"?"#).expect("valid regex"));

/// COA backend operations
#[async_trait]
pub trait CoaApi: Send + Sync {
    async fn fetch_coa_records(&self, token: &str) -> ServiceResult<RecordsResponse>;

    async fn upload_coa_files(
        &self,
        files: Vec<UploadFile>,
        token: &str,
    ) -> ServiceResult<UploadResponse>;

    async fn delete_coa_records(
        &self,
        record_ids: &[String],
        token: &str,
    ) -> ServiceResult<DeleteResponse>;

    async fn export_coa_csv(&self, rows: &[Record]) -> ServiceResult<CsvExport>;

    /// Column list, optionally for a specific phase
    async fn fetch_coa_columns(&self, phase: Option<&str>) -> ServiceResult<ColumnsResponse>;

    /// Column metadata; defaults to [`DEFAULT_CONFIG_PHASE`]
    async fn fetch_coa_columns_config(
        &self,
        phase: Option<&str>,
    ) -> ServiceResult<ColumnsConfigResponse>;

    async fn fetch_coa_stats(&self, token: &str) -> ServiceResult<CoaStats>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordsResponse {
    #[serde(default)]
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[serde(default)]
    pub results: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_to_database: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub deleted_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnsResponse {
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnsConfigResponse {
    #[serde(default)]
    pub columns_config: Vec<ColumnConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<u32>,
}

/// Dashboard statistics for the COA module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoaStats {
    pub total_samples_this_month: u64,
    pub total_files: u64,
    pub avg_processing_time: String,
    pub last_upload_date: Option<String>,
    #[serde(default)]
    pub monthly_uploads: Vec<MonthlyUploads>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyUploads {
    pub month: String,
    pub uploads: u64,
}

/// A CSV document produced by the backend export endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// A file queued for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, named after its final path component
    pub async fn from_path(path: impl AsRef<Path>) -> ServiceResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }
}

/// Pull the filename out of a `Content-Disposition` header value
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    CONTENT_DISPOSITION_FILENAME
        .captures(header)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

/// `coa-export-YYYY-MM-DD.csv`
pub fn default_export_filename(date: NaiveDate) -> String {
    format!("coa-export-{}.csv", date.format("%Y-%m-%d"))
}
