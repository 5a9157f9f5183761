//! Local record cache
//!
//! Last-known records and upload statistics are kept as JSON files so the
//! page still has something to show when the backend is unreachable.

use std::path::{Path, PathBuf};

use coa_core::Record;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ServiceError, ServiceResult};
use crate::view_models::UploadStats;

const RECORDS_FILE: &str = "coa-database-data.json";
const STATS_FILE: &str = "coa-database-stats.json";

#[derive(Debug, Clone)]
pub struct RecordCache {
    dir: PathBuf,
}

impl RecordCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn records_path(&self) -> PathBuf {
        self.dir.join(RECORDS_FILE)
    }

    fn stats_path(&self) -> PathBuf {
        self.dir.join(STATS_FILE)
    }

    /// Cached records, `None` when nothing was cached
    pub async fn load_records(&self) -> ServiceResult<Option<Vec<Record>>> {
        read_json(&self.records_path()).await
    }

    pub async fn load_stats(&self) -> ServiceResult<Option<UploadStats>> {
        read_json(&self.stats_path()).await
    }

    pub async fn save_records(&self, records: &[Record]) -> ServiceResult<()> {
        write_json(&self.dir, &self.records_path(), &records).await
    }

    pub async fn save_stats(&self, stats: &UploadStats) -> ServiceResult<()> {
        write_json(&self.dir, &self.stats_path(), stats).await
    }

    /// Remove both cache files; missing files are fine
    pub async fn clear(&self) -> ServiceResult<()> {
        for path in [self.records_path(), self.stats_path()] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => tracing::debug!(path = %path.display(), "Removed cache file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> ServiceResult<Option<T>> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|e| ServiceError::Cache(format!("{}: {}", path.display(), e)))
}

async fn write_json<T: Serialize + ?Sized>(dir: &Path, path: &Path, value: &T) -> ServiceResult<()> {
    tokio::fs::create_dir_all(dir).await?;
    let contents = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, contents).await?;
    tracing::debug!(path = %path.display(), "Wrote cache file");
    Ok(())
}
