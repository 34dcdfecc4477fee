// ============================================================
// DATA TABLE
// ============================================================
// In-memory tabular data produced by the parsers

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Tokens read as missing values
const NA_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A single typed cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Missing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Infer the type of a raw text value
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if NA_TOKENS.contains(&trimmed) {
            return CellValue::Missing;
        }

        if trimmed.eq_ignore_ascii_case("true") {
            return CellValue::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return CellValue::Bool(false);
        }

        if let Ok(value) = trimmed.parse::<i64>() {
            return CellValue::Int(value);
        }

        // `f64::from_str` also accepts "inf"/"nan" spellings, which stay numeric
        if let Ok(value) = trimmed.parse::<f64>() {
            if value.is_nan() {
                return CellValue::Missing;
            }
            return CellValue::Float(value);
        }

        CellValue::Text(raw.to_string())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Numeric view of the cell; booleans count as 0/1
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(v) => Some(*v as f64),
            CellValue::Float(v) => Some(*v),
            CellValue::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Approximate in-memory footprint of the value
    pub fn memory_size(&self) -> usize {
        match self {
            CellValue::Text(s) => std::mem::size_of::<CellValue>() + s.len(),
            _ => std::mem::size_of::<CellValue>(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Missing => write!(f, "NaN"),
            CellValue::Bool(v) => write!(f, "{}", if *v { "True" } else { "False" }),
            CellValue::Int(v) => write!(f, "{}", v),
            CellValue::Float(v) => {
                if v.fract() == 0.0 && v.is_finite() && v.abs() < 1e16 {
                    write!(f, "{:.1}", v)
                } else {
                    write!(f, "{}", v)
                }
            }
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Rows and named columns loaded from an uploaded file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataTable {
    /// Column names, unique
    pub columns: Vec<String>,

    /// Rows; every row has exactly `columns.len()` cells
    pub rows: Vec<Vec<CellValue>>,
}

impl DataTable {
    /// Build a table, normalizing header names and padding short rows
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let columns = normalize_headers(headers);
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Missing);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows.is_empty()
    }

    /// Iterate the values of one column
    pub fn column(&self, index: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows.iter().map(move |row| &row[index])
    }
}

/// Give blank headers a positional name and make duplicates unique
fn normalize_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(headers.len());

    for (index, header) in headers.into_iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {}", index)
        } else {
            header
        };

        let mut name = base.clone();
        let mut suffix = 1;
        while !seen.insert(name.clone()) {
            name = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        out.push(name);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell_types() {
        assert_eq!(CellValue::parse("42"), CellValue::Int(42));
        assert_eq!(CellValue::parse(" -3 "), CellValue::Int(-3));
        assert_eq!(CellValue::parse("2.5"), CellValue::Float(2.5));
        assert_eq!(CellValue::parse("1e3"), CellValue::Float(1000.0));
        assert_eq!(CellValue::parse("TRUE"), CellValue::Bool(true));
        assert_eq!(CellValue::parse("false"), CellValue::Bool(false));
        assert_eq!(CellValue::parse("Paris"), CellValue::Text("Paris".to_string()));
    }

    #[test]
    fn test_parse_missing_tokens() {
        for token in ["", "  ", "NA", "N/A", "NaN", "nan", "null", "NULL", "None", "#N/A", "<NA>"] {
            assert!(CellValue::parse(token).is_missing(), "{token:?} should be missing");
        }
        assert!(!CellValue::parse("none of these").is_missing());
    }

    #[test]
    fn test_as_f64() {
        assert_eq!(CellValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(CellValue::Bool(true).as_f64(), Some(1.0));
        assert_eq!(CellValue::Text("x".into()).as_f64(), None);
        assert_eq!(CellValue::Missing.as_f64(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Float(3.0).to_string(), "3.0");
        assert_eq!(CellValue::Float(0.25).to_string(), "0.25");
        assert_eq!(CellValue::Bool(true).to_string(), "True");
        assert_eq!(CellValue::Missing.to_string(), "NaN");
    }

    #[test]
    fn test_headers_normalized() {
        let table = DataTable::new(
            vec!["a".into(), "".into(), "a".into(), "a".into()],
            vec![vec![CellValue::Int(1)]],
        );
        assert_eq!(table.columns, vec!["a", "Unnamed: 1", "a.1", "a.2"]);
        assert_eq!(table.rows[0].len(), 4);
        assert!(table.rows[0][3].is_missing());
    }

    #[test]
    fn test_is_empty() {
        assert!(DataTable::new(vec!["a".into()], Vec::new()).is_empty());
        assert!(DataTable::default().is_empty());
        assert!(!DataTable::new(vec!["a".into()], vec![vec![CellValue::Int(1)]]).is_empty());
    }
}
