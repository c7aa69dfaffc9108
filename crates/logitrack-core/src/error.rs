use thiserror::Error;

/// Raised when a server-delivered attachment payload cannot be wrapped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MaterializeError {
    #[error("attachment payload is not a byte array: {0}")]
    NotByteArray(String),

    #[error("attachment payload holds a non-byte value at index {index}: {value}")]
    ByteOutOfRange { index: usize, value: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("a spreadsheet attachment is required for {0}")]
    MissingAttachment(&'static str),

    #[error("invalid file type {0:?}: upload an Excel file (.xlsx or .xls)")]
    InvalidFileType(String),

    #[error("file size {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: usize, limit: usize },
}
