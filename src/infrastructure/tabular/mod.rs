// ============================================================
// TABULAR INFRASTRUCTURE LAYER
// ============================================================
// Load staged uploads into a DataTable

mod csv_parser;
mod xlsx_parser;

use std::path::Path;

use crate::domain::error::Result;
use crate::domain::table::DataTable;
use crate::domain::upload::FileKind;

pub use csv_parser::CsvParser;
pub use xlsx_parser::XlsxParser;

/// Read a staged file with the parser matching its kind
pub fn read_table(path: &Path, kind: FileKind) -> Result<DataTable> {
    match kind {
        FileKind::Csv => CsvParser::new().parse_file(path),
        FileKind::Xlsx => XlsxParser::parse_file(path),
    }
}
