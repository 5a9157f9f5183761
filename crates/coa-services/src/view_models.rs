//! View models returned to the UI layer

use std::time::Duration;

use coa_core::Record;
use serde::{Deserialize, Serialize};

/// Upload counters shown on the page header cards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadStats {
    pub total_files_uploaded: usize,
    pub successful_files: usize,
    pub failed_files: usize,
    pub files_needing_attention: usize,
}

/// Outcome of one upload batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingSummary {
    pub total_files: usize,
    pub success_count: usize,
    pub failed_count: usize,
    pub processing_time: Duration,
    /// Non-null fields across all results, `file` excluded
    pub total_fields_extracted: usize,
}

/// Where the current records came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordsSource {
    Backend,
    /// Backend unreachable, records restored from the local cache
    Cache,
    /// Backend unreachable and nothing cached
    Unavailable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeleteKind {
    #[default]
    Single,
    Bulk,
    /// Wipe every record, the stats and the cache
    Clear,
}

/// Confirmation dialog state for deletes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteDialog {
    pub is_open: bool,
    pub kind: DeleteKind,
    pub item_name: String,
    pub item_count: usize,
    pub selected_rows: Vec<Record>,
    /// Request in flight
    pub loading: bool,
}

impl DeleteDialog {
    /// Labels listed in the bulk dialog
    pub fn selected_items(&self) -> Vec<String> {
        self.selected_rows
            .iter()
            .map(|row| {
                if row.file.is_empty() {
                    format!("Record {}", row.sample_id.as_deref().unwrap_or("Unknown"))
                } else {
                    row.file.clone()
                }
            })
            .collect()
    }

    /// Persisted IDs of the rows awaiting deletion
    pub fn record_ids(&self) -> Vec<String> {
        self.selected_rows
            .iter()
            .filter_map(|row| row.id.clone())
            .filter(|id| !id.is_empty())
            .collect()
    }
}
