use async_trait::async_trait;
use logitrack_core::record::RawRecord;
use logitrack_core::{Attachment, RecordForm, RecordId};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};

use crate::{ClientConfig, RecordService, ServiceError};

/// Async HTTP client implementation of RecordService.
/// Connects to a running logitrack backend.
pub struct HttpService {
    base_url: String,
    client: Client,
}

impl HttpService {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::new(),
        }
    }

    /// Build a client whose requests give up after `config.timeout`.
    pub fn with_config(config: &ClientConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServiceError::Network(format!("client setup: {e}")))?;
        Ok(Self {
            base_url: config.server_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the server is reachable.
    pub async fn health_check(&self) -> Result<(), ServiceError> {
        let resp = send(self.client.get(format!("{}/api/health", self.base_url))).await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(parse_error(resp).await)
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

async fn send(builder: RequestBuilder) -> Result<reqwest::Response, ServiceError> {
    builder.send().await.map_err(transport_error)
}

fn transport_error(e: reqwest::Error) -> ServiceError {
    if e.is_timeout() {
        ServiceError::Timeout
    } else {
        ServiceError::Network(e.to_string())
    }
}

fn file_part(attachment: &Attachment) -> Result<Part, ServiceError> {
    Part::bytes(attachment.extract_bytes().to_vec())
        .file_name(attachment.filename().to_string())
        .mime_str(attachment.content_type())
        .map_err(|e| ServiceError::InvalidInput(format!("content type: {e}")))
}

/// Multipart body for create and update: the scalar fields, plus
/// `file_data` only when the form carries a new attachment.
fn record_form(form: &RecordForm) -> Result<Form, ServiceError> {
    let mut body = Form::new()
        .text("name", form.name.clone())
        .text("description", form.description.clone())
        .text("status", form.status.as_str())
        .text("createdBy", form.created_by.clone());
    if let Some(attachment) = &form.attachment {
        body = body.part("file_data", file_part(attachment)?);
    }
    Ok(body)
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        resp.json::<T>()
            .await
            .map_err(|e| ServiceError::Decode(format!("json decode: {e}")))
    } else {
        Err(parse_error_with_status(status, resp).await)
    }
}

async fn parse_error(resp: reqwest::Response) -> ServiceError {
    let status = resp.status();
    parse_error_with_status(status, resp).await
}

async fn parse_error_with_status(status: StatusCode, resp: reqwest::Response) -> ServiceError {
    let body = resp.text().await.unwrap_or_default();
    let msg = error_message(status, &body);

    if status == StatusCode::NOT_FOUND {
        ServiceError::NotFound(msg)
    } else if status == StatusCode::BAD_REQUEST {
        ServiceError::InvalidInput(msg)
    } else {
        ServiceError::Server {
            status: status.as_u16(),
            message: msg,
        }
    }
}

/// `error`, then `message` from a JSON body; else the body text; else the
/// status line.
fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v["error"]
                .as_str()
                .or_else(|| v["message"].as_str())
                .map(String::from)
        });
    match from_json {
        Some(msg) => msg,
        None if !body.trim().is_empty() => body.to_string(),
        None => status.to_string(),
    }
}

#[async_trait]
impl RecordService for HttpService {
    async fn list_records(&self, base_path: &str) -> Result<Vec<RawRecord>, ServiceError> {
        let resp = send(self.client.get(self.url(base_path))).await?;
        handle_response(resp).await
    }

    async fn create_record(
        &self,
        base_path: &str,
        form: &RecordForm,
    ) -> Result<Option<RawRecord>, ServiceError> {
        let builder = self
            .client
            .post(self.url(base_path))
            .multipart(record_form(form)?);
        let resp = send(builder).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(parse_error_with_status(status, resp).await);
        }
        let body = resp.bytes().await.map_err(transport_error)?;
        match serde_json::from_slice::<RawRecord>(&body) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::debug!("create on {base_path} returned no record: {e}");
                Ok(None)
            }
        }
    }

    async fn update_record(
        &self,
        base_path: &str,
        id: &RecordId,
        form: &RecordForm,
    ) -> Result<RawRecord, ServiceError> {
        let builder = self
            .client
            .put(self.url(&format!("{base_path}/{id}")))
            .multipart(record_form(form)?);
        handle_response(send(builder).await?).await
    }

    async fn update_excel(
        &self,
        base_path: &str,
        id: &RecordId,
        attachment: &Attachment,
    ) -> Result<RawRecord, ServiceError> {
        let body = Form::new()
            .text("file_name", attachment.filename().to_string())
            .part("file_data", file_part(attachment)?);
        let builder = self
            .client
            .put(self.url(&format!("{base_path}/{id}/excel")))
            .multipart(body);
        handle_response(send(builder).await?).await
    }

    async fn delete_record(&self, base_path: &str, id: &RecordId) -> Result<(), ServiceError> {
        let resp = send(self.client.delete(self.url(&format!("{base_path}/{id}")))).await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(parse_error(resp).await)
        }
    }
}
