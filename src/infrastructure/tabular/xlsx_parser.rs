// ============================================================
// XLSX PARSER
// ============================================================
// Read the first worksheet of a workbook into a DataTable

use std::path::Path;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};

use crate::domain::error::AppError;
use crate::domain::table::{CellValue, DataTable};

pub struct XlsxParser;

impl XlsxParser {
    /// Parse the first worksheet; its first row is the header
    pub fn parse_file(path: &Path) -> Result<DataTable, AppError> {
        let mut workbook: Xlsx<_> = open_workbook(path)
            .map_err(|e| AppError::ParseError(format!("Failed to open Excel file: {}", e)))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| AppError::ParseError("No worksheet found".to_string()))?
            .map_err(|e| AppError::ParseError(format!("Failed to read Excel range: {}", e)))?;

        Ok(Self::range_to_table(&range))
    }

    fn range_to_table(range: &Range<Data>) -> DataTable {
        let mut rows = range.rows();

        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row.iter().map(header_name).collect(),
            None => return DataTable::default(),
        };

        let body = rows
            .map(|row| row.iter().map(to_cell).collect::<Vec<_>>())
            .filter(|row| !row.iter().all(CellValue::is_missing))
            .collect();

        DataTable::new(headers, body)
    }
}

fn header_name(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => format!("{}", other),
    }
}

fn to_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Missing,
        Data::Bool(v) => CellValue::Bool(*v),
        Data::Int(v) => CellValue::Int(*v),
        Data::Float(v) if v.is_nan() => CellValue::Missing,
        Data::Float(v) => CellValue::Float(*v),
        Data::String(s) => CellValue::parse(s),
        // Dates and durations keep their display form
        other => CellValue::Text(format!("{}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn write_workbook(path: &Path) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "city").unwrap();
        sheet.write_string(0, 1, "population").unwrap();
        sheet.write_string(0, 2, "capital").unwrap();
        sheet.write_string(1, 0, "Paris").unwrap();
        sheet.write_number(1, 1, 2100000.0).unwrap();
        sheet.write_boolean(1, 2, true).unwrap();
        sheet.write_string(2, 0, "Lyon").unwrap();
        sheet.write_number(2, 1, 513000.5).unwrap();
        sheet.write_boolean(2, 2, false).unwrap();
        workbook.save(path).unwrap();
    }

    #[test]
    fn test_parse_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cities.xlsx");
        write_workbook(&path);

        let table = XlsxParser::parse_file(&path).unwrap();
        assert_eq!(table.columns, vec!["city", "population", "capital"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0][0], CellValue::Text("Paris".to_string()));
        assert_eq!(table.rows[0][1], CellValue::Float(2100000.0));
        assert_eq!(table.rows[1][2], CellValue::Bool(false));
    }

    #[test]
    fn test_corrupt_workbook_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"this is not a zip archive").unwrap();

        let err = XlsxParser::parse_file(&path).unwrap_err();
        assert!(matches!(err, AppError::ParseError(msg) if msg.contains("Failed to open Excel file")));
    }

    #[test]
    fn test_cell_mapping() {
        assert!(to_cell(&Data::Empty).is_missing());
        assert_eq!(to_cell(&Data::Int(7)), CellValue::Int(7));
        assert_eq!(to_cell(&Data::String("12".into())), CellValue::Int(12));
        assert_eq!(header_name(&Data::Float(2024.0)), "2024");
    }
}
