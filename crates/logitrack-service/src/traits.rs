use async_trait::async_trait;
use logitrack_core::record::RawRecord;
use logitrack_core::{Attachment, RecordForm, RecordId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ServiceError {
    /// The backend's own message text, for errors that carry one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ServiceError::NotFound(m)
            | ServiceError::InvalidInput(m)
            | ServiceError::Server { message: m, .. } => Some(m),
            _ => None,
        }
    }
}

/// REST boundary for the record categories.
///
/// Every call is addressed by the category's collection path
/// (`/api/shipments`, ...). `HttpService` talks to a running backend; tests
/// may substitute their own implementation.
#[async_trait]
pub trait RecordService: Send + Sync {
    async fn list_records(&self, base_path: &str) -> Result<Vec<RawRecord>, ServiceError>;

    /// `Ok(None)` when the backend acknowledges the create without echoing
    /// a record back.
    async fn create_record(
        &self,
        base_path: &str,
        form: &RecordForm,
    ) -> Result<Option<RawRecord>, ServiceError>;

    /// The form's attachment is sent only when present.
    async fn update_record(
        &self,
        base_path: &str,
        id: &RecordId,
        form: &RecordForm,
    ) -> Result<RawRecord, ServiceError>;

    async fn update_excel(
        &self,
        base_path: &str,
        id: &RecordId,
        attachment: &Attachment,
    ) -> Result<RawRecord, ServiceError>;

    async fn delete_record(&self, base_path: &str, id: &RecordId) -> Result<(), ServiceError>;
}
