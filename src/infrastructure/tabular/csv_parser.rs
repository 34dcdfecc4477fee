// ============================================================
// CSV PARSER
// ============================================================
// Parse delimited text into a DataTable with encoding fallback

use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use encoding_rs::WINDOWS_1252;

use crate::domain::error::AppError;
use crate::domain::table::{CellValue, DataTable};

/// Comma-delimited parser; the first record is the header row
#[derive(Debug, Default)]
pub struct CsvParser;

impl CsvParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a CSV file into a table
    pub fn parse_file(&self, path: &Path) -> Result<DataTable, AppError> {
        let bytes = std::fs::read(path).map_err(|e| {
            AppError::ParseError(format!("Failed to read CSV file: {}", e))
        })?;
        self.parse_content(&decode_text(&bytes))
    }

    /// Parse CSV content from string
    pub fn parse_content(&self, content: &str) -> Result<DataTable, AppError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b',')
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .clone();

        if headers.is_empty() {
            return Err(AppError::ParseError(
                "No columns to parse from file".to_string(),
            ));
        }

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| {
                AppError::ParseError(format!("Failed to parse CSV row {}: {}", rows.len() + 1, e))
            })?;
            rows.push(self.parse_row(&headers, &record)?);
        }

        let headers = headers.iter().map(|h| h.to_string()).collect();
        Ok(DataTable::new(headers, rows))
    }

    /// Parse a single record; short records are padded by `DataTable::new`
    fn parse_row(
        &self,
        headers: &StringRecord,
        record: &StringRecord,
    ) -> Result<Vec<CellValue>, AppError> {
        if record.len() > headers.len() {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            return Err(AppError::ParseError(format!(
                "Error tokenizing data. Expected {} fields in line {}, saw {}",
                headers.len(),
                line,
                record.len()
            )));
        }

        Ok(record.iter().map(CellValue::parse).collect())
    }
}

/// Decode file bytes as UTF-8 (BOM removed), falling back to Windows-1252
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(content) => content.to_string(),
        Err(_) => {
            let (content, _, _) = WINDOWS_1252.decode(bytes);
            content.into_owned()
        }
    }
}
