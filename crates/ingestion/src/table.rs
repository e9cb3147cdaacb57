//! Tabular input
//!
//! Uploads are read into a [`Table`] of raw strings: a header row followed by
//! data rows. CSV goes through the `csv` crate, spreadsheets through
//! `calamine` (first worksheet only).

use crate::errors::IngestionError;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::{Cursor, Read};
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Input file format, detected from the file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Spreadsheet,
}

impl TableFormat {
    pub fn from_file_name(name: &str) -> Result<Self, IngestionError> {
        let extension = Path::new(name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(TableFormat::Csv),
            "xls" | "xlsx" | "xlsm" | "xlsb" | "ods" => Ok(TableFormat::Spreadsheet),
            _ => Err(IngestionError::UnsupportedFormat { extension }),
        }
    }
}

/// Header row plus data rows, every cell as text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let headers = headers.into_iter().map(|h| h.trim().to_string()).collect();
        let rows = rows
            .into_iter()
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .collect();
        Self { headers, rows }
    }

    /// Read an uploaded file, choosing the reader from its name
    pub fn from_bytes(file_name: &str, bytes: Vec<u8>) -> Result<Self, IngestionError> {
        match TableFormat::from_file_name(file_name)? {
            TableFormat::Csv => {
                let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes.as_slice());
                Self::from_csv_reader(body)
            }
            TableFormat::Spreadsheet => Self::from_spreadsheet(bytes),
        }
    }

    /// Read CSV; rows may be shorter or longer than the header
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, IngestionError> {
        let mut csv = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = csv.headers()?.iter().map(str::to_string).collect();
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(IngestionError::EmptyInput);
        }

        let mut rows = Vec::new();
        for record in csv.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }

        Ok(Self::new(headers, rows))
    }

    /// Read the first worksheet of an xls/xlsx/ods workbook
    pub fn from_spreadsheet(bytes: Vec<u8>) -> Result<Self, IngestionError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(IngestionError::EmptyInput)??;

        let mut lines = range.rows().map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
        let headers = lines.next().ok_or(IngestionError::EmptyInput)?;
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(IngestionError::EmptyInput);
        }

        Ok(Self::new(headers, lines.collect()))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Iterate data rows with their 0-based index
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows
            .iter()
            .enumerate()
            .map(move |(index, cells)| Row { table: self, index, cells })
    }
}

/// Borrowed view of one data row
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
    cells: &'a [String],
}

impl<'a> Row<'a> {
    /// 0-based position among data rows
    pub fn index(&self) -> usize {
        self.index
    }

    /// Trimmed cell value; `None` when the column or value is absent
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.table.column_index(column)?;
        self.cells
            .get(idx)
            .map(|cell| cell.trim())
            .filter(|cell| !cell.is_empty())
    }

    /// Cells padded or cut to the header width
    pub fn cells(&self) -> Vec<String> {
        (0..self.table.headers.len())
            .map(|i| self.cells.get(i).cloned().unwrap_or_default())
            .collect()
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // shortest round-trip form, so 50.0 renders as "50"
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(TableFormat::from_file_name("skus.CSV").unwrap(), TableFormat::Csv);
        assert_eq!(TableFormat::from_file_name("skus.xlsx").unwrap(), TableFormat::Spreadsheet);
        assert_eq!(TableFormat::from_file_name("skus.xls").unwrap(), TableFormat::Spreadsheet);

        let err = TableFormat::from_file_name("skus.pdf").unwrap_err();
        assert!(matches!(err, IngestionError::UnsupportedFormat { ref extension } if extension == "pdf"));
        assert!(TableFormat::from_file_name("noext").is_err());
    }

    #[test]
    fn test_csv_with_bom_and_padding() {
        let data = "\u{feff} sku_name ,ups\nTag, 49 \n\n , \nLabel\n".as_bytes().to_vec();
        let table = Table::from_bytes("input.csv", data).unwrap();

        assert_eq!(table.headers, vec!["sku_name", "ups"]);
        assert_eq!(table.len(), 2);

        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows[0].get("sku_name"), Some("Tag"));
        assert_eq!(rows[0].get("ups"), Some("49"));
        assert_eq!(rows[1].get("sku_name"), Some("Label"));
        assert_eq!(rows[1].get("ups"), None);
        assert_eq!(rows[1].get("missing"), None);
        assert_eq!(rows[1].cells(), vec!["Label".to_string(), String::new()]);
    }

    #[test]
    fn test_empty_csv_is_rejected() {
        let err = Table::from_bytes("input.csv", Vec::new()).unwrap_err();
        assert!(matches!(err, IngestionError::EmptyInput));
    }

    #[test]
    fn test_cell_text_numbers() {
        assert_eq!(cell_text(&Data::Float(50.0)), "50");
        assert_eq!(cell_text(&Data::Float(12.5)), "12.5");
        assert_eq!(cell_text(&Data::Int(49)), "49");
        assert_eq!(cell_text(&Data::Empty), "");
    }
}
