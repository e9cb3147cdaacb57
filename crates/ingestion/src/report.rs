//! Error report emitter
//!
//! Rebuilds the uploaded table with a trailing `Error` column so users can fix
//! the failed rows and upload the same file again.

use crate::batch::BatchOutcome;
use crate::errors::IngestionError;
use crate::table::Table;
use printtrack_common::config::ReportFormat;
use rust_xlsxwriter::{Format, Workbook};
use std::borrow::Cow;

pub const ERROR_COLUMN: &str = "Error";
pub const REPORT_SHEET_NAME: &str = "Results";
pub const REPORT_FILE_STEM: &str = "bulk_upload_results";

/// Most characters Excel accepts in one cell
pub const XLSX_CELL_LIMIT: usize = 32_767;
const TRUNCATION_MARKER: &str = "...[truncated]";

/// Download name for a report in the given format
pub fn report_file_name(format: ReportFormat) -> String {
    format!("{}.{}", REPORT_FILE_STEM, format.extension())
}

/// Serialize `headers` and `rows` as CSV
pub(crate) fn csv_bytes<I>(headers: &[String], rows: I) -> Result<Vec<u8>, IngestionError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(&row)?;
    }

    writer
        .into_inner()
        .map_err(|e| IngestionError::Report(e.to_string()))
}

/// `cell` cut to fit in a workbook cell, marked when shortened
fn fit_cell(cell: &str) -> Cow<'_, str> {
    let keep = XLSX_CELL_LIMIT - TRUNCATION_MARKER.len();
    match cell.char_indices().nth(XLSX_CELL_LIMIT) {
        Some(_) => {
            let end = cell.char_indices().nth(keep).map_or(cell.len(), |(i, _)| i);
            Cow::Owned(format!("{}{}", &cell[..end], TRUNCATION_MARKER))
        }
        None => Cow::Borrowed(cell),
    }
}

/// Serialize `headers` and `rows` as a single-sheet workbook, every cell as
/// text. Over-long cells are truncated.
pub(crate) fn xlsx_bytes<I>(
    sheet_name: &str,
    headers: &[String],
    rows: I,
) -> Result<Vec<u8>, IngestionError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, fit_cell(header).as_ref(), &bold)?;
    }

    for (r, row) in rows.into_iter().enumerate() {
        for (col, cell) in row.iter().enumerate() {
            if !cell.is_empty() {
                worksheet.write_string((r + 1) as u32, col as u16, fit_cell(cell).as_ref())?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Input rows with their error message appended
fn report_rows<'a>(table: &'a Table, outcome: &BatchOutcome) -> impl Iterator<Item = Vec<String>> + 'a {
    let errors = outcome.error_column();
    table.rows().zip(errors).map(|(row, error)| {
        let mut cells = row.cells();
        cells.push(error);
        cells
    })
}

/// Render the error report for a finished batch
pub fn render_report(
    table: &Table,
    outcome: &BatchOutcome,
    format: ReportFormat,
) -> Result<Vec<u8>, IngestionError> {
    let mut headers = table.headers.clone();
    headers.push(ERROR_COLUMN.to_string());

    match format {
        ReportFormat::Csv => csv_bytes(&headers, report_rows(table, outcome)),
        ReportFormat::Xlsx => xlsx_bytes(REPORT_SHEET_NAME, &headers, report_rows(table, outcome)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::RowFailure;
    use crate::errors::RowError;
    use uuid::Uuid;

    fn fixture() -> (Table, BatchOutcome) {
        let table = Table::new(
            vec!["sku_name".into(), "ups".into()],
            vec![
                vec!["Tag".into(), "49".into()],
                vec!["Label".into()],
            ],
        );
        let outcome = BatchOutcome {
            batch_id: Uuid::new_v4(),
            total_rows: 2,
            accepted: vec![],
            failures: vec![RowFailure { row_index: 1, errors: vec![RowError::DuplicateName] }],
        };
        (table, outcome)
    }

    #[test]
    fn test_csv_report_layout() {
        let (table, outcome) = fixture();
        let bytes = render_report(&table, &outcome, ReportFormat::Csv).unwrap();

        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "sku_name,ups,Error\nTag,49,\nLabel,,Row 3: SKU name already exists\n"
        );
    }

    #[test]
    fn test_csv_report_is_reproducible() {
        let (table, outcome) = fixture();
        let first = render_report(&table, &outcome, ReportFormat::Csv).unwrap();
        let second = render_report(&table, &outcome, ReportFormat::Csv).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_fit_cell_caps_length() {
        assert_eq!(fit_cell("Tag"), "Tag");

        let long = "x".repeat(XLSX_CELL_LIMIT + 10);
        let fitted = fit_cell(&long);
        assert_eq!(fitted.chars().count(), XLSX_CELL_LIMIT);
        assert!(fitted.ends_with(TRUNCATION_MARKER));

        let exact = "ü".repeat(XLSX_CELL_LIMIT);
        assert_eq!(fit_cell(&exact).len(), exact.len());
    }

    #[test]
    fn test_xlsx_report_with_oversized_cell() {
        let table = Table::new(
            vec!["sku_name".into(), "ups".into()],
            vec![vec!["Tag".into(), "4".repeat(40_000)]],
        );
        let outcome = BatchOutcome {
            batch_id: Uuid::new_v4(),
            total_rows: 1,
            accepted: vec![],
            failures: vec![RowFailure { row_index: 0, errors: vec![RowError::DuplicateName] }],
        };

        let bytes = render_report(&table, &outcome, ReportFormat::Xlsx).unwrap();
        let read_back = Table::from_bytes("results.xlsx", bytes).unwrap();
        let row = read_back.rows().next().unwrap();
        assert!(row.cells()[1].ends_with(TRUNCATION_MARKER));
        assert_eq!(row.cells()[2], "Row 2: SKU name already exists");
    }

    #[test]
    fn test_xlsx_report_is_a_zip() {
        let (table, outcome) = fixture();
        let bytes = render_report(&table, &outcome, ReportFormat::Xlsx).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_report_file_names() {
        assert_eq!(report_file_name(ReportFormat::Xlsx), "bulk_upload_results.xlsx");
        assert_eq!(report_file_name(ReportFormat::Csv), "bulk_upload_results.csv");
    }
}
