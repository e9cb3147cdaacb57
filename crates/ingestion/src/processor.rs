//! Upload processor
//!
//! End-to-end handling of one uploaded file: read the table, import it, and
//! render the error report when any row failed.

use crate::batch::{BatchImporter, BatchOutcome};
use crate::errors::IngestionError;
use crate::report::{render_report, report_file_name};
use crate::table::Table;
use printtrack_common::config::{ImportConfig, ReportFormat};
use printtrack_common::RecipeStore;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Rendered error report ready to hand back to the user
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Result of processing one upload
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub outcome: BatchOutcome,
    /// Present only when at least one row failed
    pub report: Option<ErrorReport>,
}

/// Bulk import processor
pub struct ImportProcessor<S> {
    importer: BatchImporter<S>,
    report_format: ReportFormat,
}

impl<S: RecipeStore> ImportProcessor<S> {
    pub fn new(store: S, config: ImportConfig) -> Self {
        let report_format = config.report_format;
        Self {
            importer: BatchImporter::new(store, config),
            report_format,
        }
    }

    /// Use a different report format than the configured one
    pub fn with_report_format(mut self, format: ReportFormat) -> Self {
        self.report_format = format;
        self
    }

    /// Process an uploaded file's contents
    #[instrument(skip(self, bytes), fields(file_name = %file_name, size = bytes.len()))]
    pub async fn process_upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadResult, IngestionError> {
        let table = Table::from_bytes(file_name, bytes)?;
        let outcome = self.importer.import_batch(&table).await?;

        let report = if outcome.has_errors() {
            Some(self.render(&table, &outcome)?)
        } else {
            None
        };

        Ok(UploadResult { outcome, report })
    }

    /// Render the report in the configured format, falling back to CSV when
    /// the workbook cannot be written. Stored rows always get a report.
    fn render(&self, table: &Table, outcome: &BatchOutcome) -> Result<ErrorReport, IngestionError> {
        let (format, bytes) = match render_report(table, outcome, self.report_format) {
            Ok(bytes) => (self.report_format, bytes),
            Err(e) if self.report_format != ReportFormat::Csv => {
                warn!(batch_id = %outcome.batch_id, error = %e, "Report rendering failed, falling back to CSV");
                (ReportFormat::Csv, render_report(table, outcome, ReportFormat::Csv)?)
            }
            Err(e) => return Err(e),
        };

        info!(
            batch_id = %outcome.batch_id,
            report_bytes = bytes.len(),
            "Error report rendered"
        );

        Ok(ErrorReport {
            file_name: report_file_name(format),
            content_type: format.content_type(),
            bytes,
        })
    }

    /// Process a file on disk
    pub async fn process_file(&self, path: &Path) -> Result<UploadResult, IngestionError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        self.process_upload(&file_name, bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printtrack_common::InMemoryStore;

    const CSV: &str = "sku_name,material_type,application_type,one_up_width,one_up_height,ups,purchase_ups\n\
                       Tag,Art Paper,Lamination,50,70,49,6\n\
                       Label,Art Paper,Lamination,abc,70,49,6\n";

    #[tokio::test]
    async fn test_upload_with_errors_produces_report() {
        let processor = ImportProcessor::new(InMemoryStore::new(), ImportConfig::default())
            .with_report_format(ReportFormat::Csv);

        let result = processor
            .process_upload("recipes.csv", CSV.as_bytes().to_vec())
            .await
            .unwrap();

        assert_eq!(result.outcome.accepted.len(), 1);
        let report = result.report.unwrap();
        assert_eq!(report.file_name, "bulk_upload_results.csv");
        assert_eq!(report.content_type, "text/csv");

        let text = String::from_utf8(report.bytes).unwrap();
        assert!(text.ends_with(
            "Label,Art Paper,Lamination,abc,70,49,6,Row 3: Invalid one_up_width: 'abc' must be a decimal number\n"
        ));
    }

    #[tokio::test]
    async fn test_clean_upload_has_no_report() {
        let store = InMemoryStore::new();
        let processor = ImportProcessor::new(store.clone(), ImportConfig::default());
        let csv = CSV.replace("abc", "50");

        let result = processor.process_upload("recipes.csv", csv.into_bytes()).await.unwrap();

        assert!(result.report.is_none());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_unsupported_upload() {
        let processor = ImportProcessor::new(InMemoryStore::new(), ImportConfig::default());
        let err = processor.process_upload("recipes.txt", vec![]).await.unwrap_err();
        assert!(matches!(err, IngestionError::UnsupportedFormat { .. }));
    }
}
