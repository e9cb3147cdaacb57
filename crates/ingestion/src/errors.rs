//! Ingestion error types
//!
//! `IngestionError` aborts a whole batch. `FieldError` and `RowError` are
//! row-level values collected into the batch outcome and never propagated.

use printtrack_common::errors::AppError;
use std::borrow::Cow;
use thiserror::Error;

/// Batch-fatal failures
#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Missing required columns: {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("Unsupported file format '{extension}'. Upload CSV or Excel only.")]
    UnsupportedFormat { extension: String },

    #[error("Input has no header row")]
    EmptyInput,

    #[error("Input has {rows} rows, the limit is {limit}")]
    TooManyRows { rows: usize, limit: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Report error: {0}")]
    Report(String),

    #[error("SKU code sequence exhausted after number {last_issued}")]
    CodeSequenceExhausted { last_issued: u64 },

    #[error("Store error: {0}")]
    Store(#[from] AppError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rust_xlsxwriter::XlsxError> for IngestionError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        IngestionError::Report(e.to_string())
    }
}

impl From<IngestionError> for AppError {
    fn from(e: IngestionError) -> Self {
        match e {
            IngestionError::MissingColumns { .. }
            | IngestionError::EmptyInput
            | IngestionError::TooManyRows { .. } => AppError::Validation {
                message: e.to_string(),
                field: Some("file".to_string()),
            },
            IngestionError::UnsupportedFormat { .. }
            | IngestionError::Csv(_)
            | IngestionError::Spreadsheet(_) => AppError::InvalidFormat {
                message: e.to_string(),
            },
            IngestionError::Store(inner) => inner,
            IngestionError::Report(_)
            | IngestionError::CodeSequenceExhausted { .. }
            | IngestionError::Io(_) => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

/// Longest slice of the offending input echoed back in a message
const QUOTED_VALUE_CHARS: usize = 64;

/// `value` cut to `QUOTED_VALUE_CHARS` characters
fn quoted(value: &str) -> Cow<'_, str> {
    match value.char_indices().nth(QUOTED_VALUE_CHARS) {
        Some((end, _)) => Cow::Owned(format!("{}...", &value[..end])),
        None => Cow::Borrowed(value),
    }
}

/// A single field failed to parse or validate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("{field} is required")]
    Missing { field: String },

    #[error("Invalid {field}: '{}' looks like WxH, expected a number only", quoted(.value))]
    AmbiguousDimension { field: String, value: String },

    #[error("Invalid {field}: '{}' must be a decimal number", quoted(.value))]
    InvalidDecimal { field: String, value: String },

    #[error("Invalid {field}: '{}' must be greater than zero", quoted(.value))]
    NotPositive { field: String, value: String },

    #[error("Invalid {field}: '{}' must be a non-negative whole number", quoted(.value))]
    InvalidCount { field: String, value: String },
}

impl FieldError {
    /// Name of the offending field
    pub fn field(&self) -> &str {
        match self {
            FieldError::Missing { field }
            | FieldError::AmbiguousDimension { field, .. }
            | FieldError::InvalidDecimal { field, .. }
            | FieldError::NotPositive { field, .. }
            | FieldError::InvalidCount { field, .. } => field,
        }
    }

    /// Metric label
    pub fn reason(&self) -> &'static str {
        match self {
            FieldError::Missing { .. } => "missing_field",
            FieldError::AmbiguousDimension { .. } => "ambiguous_dimension",
            FieldError::InvalidDecimal { .. } => "invalid_decimal",
            FieldError::NotPositive { .. } => "not_positive",
            FieldError::InvalidCount { .. } => "invalid_count",
        }
    }
}

/// Reason a row was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("SKU name already exists")]
    DuplicateName,

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("Unexpected error: {0}")]
    Persistence(String),
}

impl RowError {
    /// Metric label
    pub fn reason(&self) -> &'static str {
        match self {
            RowError::DuplicateName => "duplicate_name",
            RowError::Field(e) => e.reason(),
            RowError::Persistence(_) => "persistence",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_messages() {
        let err = FieldError::AmbiguousDimension {
            field: "one_up_width".into(),
            value: "10x8".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid one_up_width: '10x8' looks like WxH, expected a number only"
        );

        let err = FieldError::InvalidDecimal {
            field: "one_up_height".into(),
            value: "abc".into(),
        };
        assert_eq!(err.to_string(), "Invalid one_up_height: 'abc' must be a decimal number");
        assert_eq!(err.field(), "one_up_height");
    }

    #[test]
    fn test_long_values_are_shortened_in_messages() {
        let err = FieldError::InvalidDecimal {
            field: "one_up_width".into(),
            value: "é".repeat(40_000),
        };
        let message = err.to_string();

        assert!(message.starts_with("Invalid one_up_width: 'éé"));
        assert!(message.ends_with("...' must be a decimal number"));
        assert!(message.chars().count() < 150);
    }

    #[test]
    fn test_row_error_messages() {
        assert_eq!(RowError::DuplicateName.to_string(), "SKU name already exists");
        assert_eq!(
            RowError::Persistence("disk full".into()).to_string(),
            "Unexpected error: disk full"
        );
        let field = RowError::from(FieldError::Missing { field: "sku_name".into() });
        assert_eq!(field.to_string(), "sku_name is required");
        assert_eq!(field.reason(), "missing_field");
    }

    #[test]
    fn test_batch_errors_map_to_client_errors() {
        let err = IngestionError::MissingColumns {
            columns: vec!["ups".into(), "purchase_ups".into()],
        };
        assert_eq!(err.to_string(), "Missing required columns: ups, purchase_ups");

        let app: AppError = err.into();
        assert!(app.is_client_error());

        let app: AppError = IngestionError::UnsupportedFormat { extension: "pdf".into() }.into();
        assert_eq!(app.status_code().as_u16(), 400);
    }
}
