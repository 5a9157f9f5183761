//! COA Services Layer
//!
//! This crate sits between a front end (the `coa` CLI, or any UI) and the COA
//! backend. It talks HTTP, keeps the page state around the grid and returns
//! plain view models.
//!
//! # Architecture
//!
//! ```text
//! Front end (coa-cli)
//!     ↓
//! Service Layer (coa-services) ← This crate
//!     ↓                    ↓
//! Grid engine (coa-grid)   Backend (CoaApi / HttpCoaApi)
//!     ↓
//! Model (coa-core)
//! ```
//!
//! # Services
//!
//! - [`CoaDatabaseService`] - Records, uploads, deletes and exports for the COA page
//! - [`HttpCoaApi`] - reqwest client for the COA REST endpoints
//! - [`RecordCache`] - Last-known records on disk for offline fallback

mod api;
mod cache;
mod csv;
mod database_service;
mod error;
mod http;
mod view_models;

pub use api::{
    CoaApi, CoaStats, ColumnsConfigResponse, ColumnsResponse, CsvExport, DEFAULT_CONFIG_PHASE,
    DeleteResponse, MonthlyUploads, RecordsResponse, UploadFile, UploadResponse,
    default_export_filename, filename_from_content_disposition,
};
pub use cache::RecordCache;
pub use csv::generate_csv;
pub use database_service::{CoaDatabaseService, ServiceOptions, needs_attention};
pub use error::{DELETE_FAILED_MESSAGE, ServiceError, ServiceResult};
pub use http::{DEFAULT_API_BASE_URL, HttpCoaApi};
pub use view_models::{DeleteDialog, DeleteKind, ProcessingSummary, RecordsSource, UploadStats};
