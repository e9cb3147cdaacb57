//! Downloadable upload templates

use crate::errors::IngestionError;
use crate::report::{csv_bytes, xlsx_bytes};
use printtrack_common::config::ReportFormat;

pub const SAMPLE_SHEET_NAME: &str = "Recipes";
pub const SAMPLE_FILE_STEM: &str = "sample_recipes";

/// Canonical upload header row
pub const SAMPLE_HEADERS: [&str; 11] = [
    "sku_name",
    "material_type",
    "application_type",
    "one_up_width",
    "one_up_height",
    "print_sheet_width",
    "print_sheet_height",
    "ups",
    "purchase_sheet_width",
    "purchase_sheet_height",
    "purchase_ups",
];

pub const SAMPLE_ROW: [&str; 11] = [
    "Clothing Tag",
    "Art Paper",
    "Lamination",
    "50.00",
    "70.00",
    "500.00",
    "700.00",
    "49",
    "23.00",
    "35.00",
    "6",
];

pub fn sample_file_name(format: ReportFormat) -> String {
    format!("{}.{}", SAMPLE_FILE_STEM, format.extension())
}

/// Template with the header row and one example recipe
pub fn sample_template(format: ReportFormat) -> Result<Vec<u8>, IngestionError> {
    let headers: Vec<String> = SAMPLE_HEADERS.iter().map(|h| h.to_string()).collect();
    let rows = std::iter::once(SAMPLE_ROW.iter().map(|c| c.to_string()).collect::<Vec<_>>());

    match format {
        ReportFormat::Csv => csv_bytes(&headers, rows),
        ReportFormat::Xlsx => xlsx_bytes(SAMPLE_SHEET_NAME, &headers, rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;
    use crate::validator::check_required_columns;

    #[test]
    fn test_csv_template_round_trips_through_reader() {
        let bytes = sample_template(ReportFormat::Csv).unwrap();
        let table = Table::from_bytes("sample_recipes.csv", bytes).unwrap();

        assert!(check_required_columns(&table).is_ok());
        assert_eq!(table.len(), 1);
        let row = table.rows().next().unwrap();
        assert_eq!(row.get("sku_name"), Some("Clothing Tag"));
        assert_eq!(row.get("purchase_ups"), Some("6"));
    }

    #[test]
    fn test_xlsx_template_is_readable() {
        let bytes = sample_template(ReportFormat::Xlsx).unwrap();
        let table = Table::from_bytes("sample_recipes.xlsx", bytes).unwrap();

        assert_eq!(table.headers, SAMPLE_HEADERS.to_vec());
        assert_eq!(table.rows().next().unwrap().get("one_up_width"), Some("50.00"));
    }

    #[test]
    fn test_file_names() {
        assert_eq!(sample_file_name(ReportFormat::Csv), "sample_recipes.csv");
        assert_eq!(sample_file_name(ReportFormat::Xlsx), "sample_recipes.xlsx");
    }
}
