use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    MissingFile,
    EmptyFilename,
    UnsupportedType,
    PayloadTooLarge(usize),
    ParseError(String),
    ProfilingError(String),
    MissingOutput,
    ConfigError(String),
    IoError(String),
    Internal(String),
}

impl AppError {
    /// True for errors caused by the client's request rather than by processing.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::MissingFile
                | AppError::EmptyFilename
                | AppError::UnsupportedType
                | AppError::PayloadTooLarge(_)
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::MissingFile => write!(f, "No file part"),
            AppError::EmptyFilename => write!(f, "No selected file"),
            AppError::UnsupportedType => write!(
                f,
                "File type not allowed. Please upload a CSV or Excel file"
            ),
            AppError::PayloadTooLarge(limit) => {
                write!(f, "File exceeds the upload limit of {} bytes", limit)
            }
            AppError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AppError::ProfilingError(msg) => write!(f, "Profiling error: {}", msg),
            AppError::MissingOutput => write!(f, "Report file not found"),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
