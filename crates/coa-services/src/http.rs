//! reqwest-backed implementation of [`CoaApi`]

use std::time::Duration;

use async_trait::async_trait;
use coa_core::Record;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::api::{
    CoaApi, CoaStats, ColumnsConfigResponse, ColumnsResponse, CsvExport, DEFAULT_CONFIG_PHASE,
    DeleteResponse, RecordsResponse, UploadFile, UploadResponse, default_export_filename,
    filename_from_content_disposition,
};
use crate::error::{ServiceError, ServiceResult};

/// Base URL used when nothing is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:4000";

/// HTTP client for the COA backend
#[derive(Debug, Clone)]
pub struct HttpCoaApi {
    base_url: String,
    client: Client,
}

impl HttpCoaApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ServiceResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-success response into [`ServiceError::Api`], preferring the
    /// server's JSON `message` over `fallback`.
    async fn ensure_success(
        response: Response,
        operation: &'static str,
        fallback: &str,
    ) -> ServiceResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| {
                value
                    .get("message")
                    .and_then(|m| m.as_str())
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| fallback.to_string());

        tracing::warn!(operation, %status, "COA API request failed: {}", message);
        Err(ServiceError::api(operation, message))
    }

    async fn read_json<T: DeserializeOwned>(
        response: Response,
        operation: &'static str,
        fallback: &str,
    ) -> ServiceResult<T> {
        let response = Self::ensure_success(response, operation, fallback).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl CoaApi for HttpCoaApi {
    #[tracing::instrument(skip(self, token))]
    async fn fetch_coa_records(&self, token: &str) -> ServiceResult<RecordsResponse> {
        let response = self
            .client
            .get(self.url("/api/coa-database/records"))
            .bearer_auth(token)
            .send()
            .await?;
        Self::read_json(
            response,
            "fetch_coa_records",
            "Failed to fetch COA records from database",
        )
        .await
    }

    #[tracing::instrument(skip(self, files, token), fields(files = files.len()))]
    async fn upload_coa_files(
        &self,
        files: Vec<UploadFile>,
        token: &str,
    ) -> ServiceResult<UploadResponse> {
        let form = files.into_iter().fold(Form::new(), |form, file| {
            form.part("files", Part::bytes(file.bytes).file_name(file.name))
        });

        let response = self
            .client
            .post(self.url("/api/coa-database/upload"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;
        Self::read_json(response, "upload_coa_files", "Upload failed").await
    }

    #[tracing::instrument(skip(self, record_ids, token), fields(records = record_ids.len()))]
    async fn delete_coa_records(
        &self,
        record_ids: &[String],
        token: &str,
    ) -> ServiceResult<DeleteResponse> {
        let response = self
            .client
            .delete(self.url("/api/coa-database/records"))
            .bearer_auth(token)
            .json(&json!({ "recordIds": record_ids }))
            .send()
            .await?;
        Self::read_json(response, "delete_coa_records", "Failed to delete COA records").await
    }

    #[tracing::instrument(skip(self, rows), fields(rows = rows.len()))]
    async fn export_coa_csv(&self, rows: &[Record]) -> ServiceResult<CsvExport> {
        let response = self
            .client
            .post(self.url("/api/coa/export"))
            .json(&json!({ "rows": rows }))
            .send()
            .await?;
        let response = Self::ensure_success(response, "export_coa_csv", "Export failed").await?;

        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(filename_from_content_disposition)
            .unwrap_or_else(|| default_export_filename(chrono::Utc::now().date_naive()));
        let bytes = response.bytes().await?.to_vec();

        tracing::info!(%filename, bytes = bytes.len(), "Exported COA rows");
        Ok(CsvExport { bytes, filename })
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_coa_columns(&self, phase: Option<&str>) -> ServiceResult<ColumnsResponse> {
        let mut request = self.client.get(self.url("/api/coa/columns"));
        if let Some(phase) = phase.filter(|p| !p.is_empty()) {
            request = request.query(&[("phase", phase)]);
        }
        let response = request.send().await?;
        Self::read_json(response, "fetch_coa_columns", "Failed to fetch COA columns").await
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_coa_columns_config(
        &self,
        phase: Option<&str>,
    ) -> ServiceResult<ColumnsConfigResponse> {
        let phase = phase
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_CONFIG_PHASE);
        let response = self
            .client
            .get(self.url("/api/coa/columns"))
            .query(&[("phase", phase)])
            .send()
            .await?;
        Self::read_json(
            response,
            "fetch_coa_columns_config",
            "Failed to fetch COA columns config",
        )
        .await
    }

    #[tracing::instrument(skip(self, token))]
    async fn fetch_coa_stats(&self, token: &str) -> ServiceResult<CoaStats> {
        let response = self
            .client
            .get(self.url("/api/coa-database/stats"))
            .bearer_auth(token)
            .send()
            .await?;
        Self::read_json(response, "fetch_coa_stats", "Failed to fetch COA statistics").await
    }
}
