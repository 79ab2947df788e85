//! Error types for lesson storage and session logic.
use thiserror::Error;

/// Failures raised by the lesson store and by providers that front it.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid file name: '{0}'")]
    InvalidName(String),

    #[error("Lesson not found: {0}")]
    NotFound(String),

    #[error("Lesson '{name}' is corrupt: {reason}")]
    Corrupt { name: String, reason: String },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// `true` for failures that mean "try the next provider" rather than
    /// "the data itself is wrong".
    pub fn is_reachability(&self) -> bool {
        matches!(self, AppError::StorageUnavailable(_))
    }

    pub(crate) fn io(context: &str, err: std::io::Error) -> Self {
        AppError::StorageUnavailable(format!("{}: {}", context, err))
    }
}

/// Rejections produced by session operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("'{headword}' / '{translation}' already exists in {file}")]
    Duplicate {
        headword: String,
        translation: String,
        file: String,
    },

    #[error("No word with id {0}")]
    UnknownRecord(String),

    #[error("Record {record} belongs to '{actual}', not '{expected}'")]
    ForeignRecord {
        record: String,
        expected: String,
        actual: String,
    },
}
