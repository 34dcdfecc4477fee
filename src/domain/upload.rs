// ============================================================
// UPLOAD TYPES
// ============================================================
// The uploaded file and the extension allow-set

use serde::{Deserialize, Serialize};

use super::error::{AppError, Result};

/// Extensions accepted for upload (compared case-insensitively)
pub const ALLOWED_EXTENSIONS: [&str; 2] = ["csv", "xlsx"];

/// Tabular format of an accepted upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    /// Delimited text
    Csv,

    /// Office Open XML spreadsheet
    Xlsx,
}

impl FileKind {
    /// Pick the parser for an already validated filename.
    /// Anything that is not `.csv` is read as a spreadsheet.
    pub fn for_filename(filename: &str) -> Self {
        if filename.to_ascii_lowercase().ends_with(".csv") {
            FileKind::Csv
        } else {
            FileKind::Xlsx
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Csv => "csv",
            FileKind::Xlsx => "xlsx",
        }
    }
}

/// Extension after the last `.`, if the name has one
pub fn file_extension(filename: &str) -> Option<&str> {
    filename.rsplit_once('.').map(|(_, ext)| ext)
}

/// Check if the uploaded file has a valid extension (csv or xlsx)
pub fn allowed_file(filename: &str) -> bool {
    match file_extension(filename) {
        Some(ext) => {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Check a declared filename before any content is read
pub fn validate_filename(filename: &str) -> Result<FileKind> {
    if filename.is_empty() {
        return Err(AppError::EmptyFilename);
    }
    if !allowed_file(filename) {
        return Err(AppError::UnsupportedType);
    }
    Ok(FileKind::for_filename(filename))
}

/// A file received in the `file` field of an upload form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Filename declared by the client
    pub filename: String,

    /// Raw file content
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Validate the declared filename and resolve the parser to use
    pub fn validate(&self) -> Result<FileKind> {
        validate_filename(&self.filename)
    }
}
