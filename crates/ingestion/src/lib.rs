//! PrintTrack Ingestion
//!
//! Bulk import and normalization of SKU recipes:
//! - Dimension parsing (`WxH` strings, `,` decimals)
//! - Sequential SKU code allocation
//! - CSV and spreadsheet table input
//! - Per-row validation with a partial-success batch outcome
//! - Error report, sample template and recipe export rendering

pub mod allocator;
pub mod batch;
pub mod create;
pub mod dimension;
pub mod errors;
pub mod export;
pub mod processor;
pub mod report;
pub mod sample;
pub mod table;
pub mod validator;

pub use batch::{BatchImporter, BatchOutcome, BatchStatus, RowFailure};
pub use create::RecipeCreator;
pub use errors::{FieldError, IngestionError, RowError};
pub use processor::{ErrorReport, ImportProcessor, UploadResult};
pub use table::Table;
pub use validator::RecipeInput;
