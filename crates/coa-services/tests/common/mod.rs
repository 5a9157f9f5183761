//! Common test utilities and mocks

use async_trait::async_trait;
use coa_core::{ColumnConfig, ColumnType, Record};
use coa_services::{
    CoaApi, CoaStats, ColumnsConfigResponse, ColumnsResponse, CsvExport, DeleteResponse,
    RecordsResponse, ServiceError, ServiceResult, UploadFile, UploadResponse, generate_csv,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// In-memory stand-in for the COA backend.
///
/// Keeps a record store that uploads append to and deletes remove from, logs
/// every call, and can be told to fail individual operations at any time.
pub struct MockCoaApi {
    pub store: Mutex<Vec<Record>>,
    /// Results returned (and persisted) by the next upload
    pub upload_results: Mutex<Vec<Record>>,
    pub columns: ColumnsResponse,
    pub columns_config: ColumnsConfigResponse,
    failing: Mutex<HashSet<&'static str>>,
    /// Log of all calls, `operation` or `operation:argument`
    pub call_log: Arc<Mutex<Vec<String>>>,
}

impl MockCoaApi {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Vec::new()),
            upload_results: Mutex::new(Vec::new()),
            columns: ColumnsResponse {
                columns: vec![
                    "Sample #".to_string(),
                    String::new(),
                    "Batch".to_string(),
                    "pH".to_string(),
                ],
                phase: Some(1),
                default: Some(true),
            },
            columns_config: ColumnsConfigResponse {
                columns_config: vec![ColumnConfig::new("pH", ColumnType::PL)],
                phase: Some(1),
            },
            failing: Mutex::new(HashSet::new()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_records(self, records: Vec<Record>) -> Self {
        *self.store.lock() = records;
        self
    }

    pub fn with_upload_results(self, results: Vec<Record>) -> Self {
        *self.upload_results.lock() = results;
        self
    }

    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().insert(operation);
    }

    pub fn recover(&self, operation: &'static str) {
        self.failing.lock().remove(operation);
    }

    pub fn call_log(&self) -> Vec<String> {
        self.call_log.lock().clone()
    }

    pub fn calls_to(&self, operation: &str) -> usize {
        self.call_log
            .lock()
            .iter()
            .filter(|entry| entry.split(':').next() == Some(operation))
            .count()
    }

    fn record_call(&self, operation: &'static str, argument: Option<String>) -> ServiceResult<()> {
        let entry = match argument {
            Some(argument) => format!("{operation}:{argument}"),
            None => operation.to_string(),
        };
        self.call_log.lock().push(entry);

        if self.failing.lock().contains(operation) {
            return Err(ServiceError::api(operation, format!("{operation} unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl CoaApi for MockCoaApi {
    async fn fetch_coa_records(&self, _token: &str) -> ServiceResult<RecordsResponse> {
        self.record_call("fetch_coa_records", None)?;
        Ok(RecordsResponse {
            records: self.store.lock().clone(),
        })
    }

    async fn upload_coa_files(
        &self,
        files: Vec<UploadFile>,
        _token: &str,
    ) -> ServiceResult<UploadResponse> {
        let names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
        self.record_call("upload_coa_files", Some(names.join(",")))?;

        let results = self.upload_results.lock().clone();
        self.store.lock().extend(results.iter().cloned());
        Ok(UploadResponse {
            saved_to_database: Some(results.len() as u64),
            results,
        })
    }

    async fn delete_coa_records(
        &self,
        record_ids: &[String],
        _token: &str,
    ) -> ServiceResult<DeleteResponse> {
        self.record_call("delete_coa_records", Some(record_ids.join(",")))?;

        let mut store = self.store.lock();
        let before = store.len();
        store.retain(|r| r.id.as_ref().is_none_or(|id| !record_ids.contains(id)));
        Ok(DeleteResponse {
            deleted_count: (before - store.len()) as u64,
        })
    }

    async fn export_coa_csv(&self, rows: &[Record]) -> ServiceResult<CsvExport> {
        self.record_call("export_coa_csv", Some(rows.len().to_string()))?;
        Ok(CsvExport {
            bytes: generate_csv(rows).into_bytes(),
            filename: "coa-export-mock.csv".to_string(),
        })
    }

    async fn fetch_coa_columns(&self, phase: Option<&str>) -> ServiceResult<ColumnsResponse> {
        self.record_call("fetch_coa_columns", phase.map(str::to_string))?;
        Ok(self.columns.clone())
    }

    async fn fetch_coa_columns_config(
        &self,
        phase: Option<&str>,
    ) -> ServiceResult<ColumnsConfigResponse> {
        self.record_call("fetch_coa_columns_config", phase.map(str::to_string))?;
        Ok(self.columns_config.clone())
    }

    async fn fetch_coa_stats(&self, _token: &str) -> ServiceResult<CoaStats> {
        self.record_call("fetch_coa_stats", None)?;
        Ok(CoaStats {
            total_files: self.store.lock().len() as u64,
            avg_processing_time: "1.0s".to_string(),
            ..Default::default()
        })
    }
}

/// A record with enough populated fields to not need attention
pub fn complete_record(file: &str, id: &str, sample: &str) -> Record {
    Record::new(file)
        .with_id(id)
        .with_sample_id(sample)
        .with_batch_id(format!("B-{sample}"))
        .with_field("pH", "7")
}
