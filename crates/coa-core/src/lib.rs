//! COA Core - shared model for the COA lab-data grid
//!
//! This crate provides the types every other COA crate depends on:
//!
//! - `Scalar` - A single cell value as delivered by the backend
//! - `Record` - A sparse COA row with typed identity fields
//! - `ColumnConfig` / `ColumnType` - Advisory per-column metadata
//! - `CoaError` - Errors raised while decoding records

mod column;
mod error;
mod record;
mod types;

pub use column::*;
pub use error::*;
pub use record::*;
pub use types::*;
