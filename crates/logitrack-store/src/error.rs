use logitrack_core::{RecordId, ValidationError};
use logitrack_service::ServiceError;
use logitrack_sheet::{DecodeError, EncodeError};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("could not encode sheet: {0}")]
    Encode(#[from] EncodeError),

    #[error("no record {0} in this collection")]
    UnknownRecord(RecordId),

    #[error("record {0} is still being created")]
    NotYetCreated(RecordId),

    #[error("view was closed before the response arrived")]
    Abandoned,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// The backend's message, when the failure came from the backend.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            StoreError::Service(e) => e.server_message(),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("could not read attachment: {0}")]
    Decode(#[from] DecodeError),

    #[error("record {0} has no attachment")]
    NoAttachment(RecordId),

    #[error("no attachment is open")]
    Closed,

    #[error("record {0} has unsaved edits")]
    UnsavedEdits(RecordId),

    #[error("row {index} out of range ({len} rows)")]
    RowOutOfRange { index: usize, len: usize },

    #[error("no column named {0:?}")]
    UnknownColumn(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
