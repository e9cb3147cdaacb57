//! PrintTrack Common Library
//!
//! Shared code for the PrintTrack services including:
//! - Database models, the recipe store seam and repository
//! - Error types and handling
//! - Configuration management
//! - Logging setup
//! - Metrics and observability

pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod telemetry;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::AppConfig;
pub use db::{InMemoryStore, RecipeStore, Repository};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix shared by every generated SKU code
pub const SKU_CODE_PREFIX: &str = "SKU-";
