use std::fmt;

use chrono::Local;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::attachment::Attachment;
use crate::category::Category;
use crate::error::ValidationError;

const TEMPORARY_PREFIX: &str = "tmp-";

/// Server-assigned record identifier. The backend may send numbers or
/// strings; both are kept as their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Client-side placeholder used while a create is in flight.
    pub fn temporary() -> Self {
        Self(format!("{TEMPORARY_PREFIX}{}", uuid::Uuid::new_v4()))
    }

    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMPORARY_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<u64> for RecordId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }
        Ok(match Wire::deserialize(deserializer)? {
            Wire::Text(s) => RecordId(s),
            Wire::Unsigned(n) => RecordId(n.to_string()),
            Wire::Signed(n) => RecordId(n.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Completed,
    #[default]
    Incomplete,
}

impl Status {
    pub const ALL: &[Status] = &[Status::Completed, Status::Incomplete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Completed => "completed",
            Status::Incomplete => "incomplete",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Status::Completed => "Completed",
            Status::Incomplete => "Incomplete",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "completed" => Some(Status::Completed),
            "incomplete" => Some(Status::Incomplete),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One row of a category's collection, with its attachment already
/// materialized.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: RecordId,
    pub name: String,
    pub description: String,
    pub status: Status,
    pub created_by: String,
    pub created_at: Option<String>,
    pub updated_by: Option<String>,
    pub updated_at: Option<String>,
    pub attachment: Option<Attachment>,
    /// Fields the backend sent that this client does not model.
    pub extra: Map<String, Value>,
}

impl Record {
    /// Values a free-text search runs against.
    pub fn searchable_text(&self) -> String {
        let mut parts: Vec<&str> = vec![
            self.id.as_str(),
            &self.name,
            &self.description,
            self.status.as_str(),
            &self.created_by,
        ];
        parts.extend(self.created_at.as_deref());
        parts.extend(self.updated_by.as_deref());
        parts.extend(self.updated_at.as_deref());
        if let Some(att) = &self.attachment {
            parts.push(att.filename());
        }
        parts.join(" ")
    }
}

/// Record as it arrives over the wire, before attachment materialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: RecordId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "createdBy")]
    pub created_by: Option<String>,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, rename = "updatedBy")]
    pub updated_by: Option<String>,
    #[serde(default, rename = "updatedAt")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub file_data: Option<Value>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The attachment half of a [`RawRecord`], still unmaterialized.
#[derive(Debug, Clone, Default)]
pub struct RawAttachment {
    pub file_data: Option<Value>,
    pub file_name: Option<String>,
}

impl RawAttachment {
    /// True when the backend sent no payload at all (`null` or missing).
    pub fn is_absent(&self) -> bool {
        matches!(self.file_data, None | Some(Value::Null))
    }
}

impl RawRecord {
    /// Convert the scalar fields, handing back the attachment payload
    /// separately. Unknown status strings read as `incomplete`.
    pub fn into_parts(self) -> (Record, RawAttachment) {
        let status = self
            .status
            .as_deref()
            .and_then(Status::from_str)
            .unwrap_or_default();
        let record = Record {
            id: self.id,
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            status,
            created_by: self.created_by.unwrap_or_default(),
            created_at: self.created_at,
            updated_by: self.updated_by,
            updated_at: self.updated_at,
            attachment: None,
            extra: self.extra,
        };
        let raw = RawAttachment {
            file_data: self.file_data,
            file_name: self.file_name,
        };
        (record, raw)
    }
}

/// A record the user is about to create.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
    pub name: String,
    pub description: String,
    pub status: Status,
    pub created_by: String,
    pub created_at: String,
    pub updated_by: Option<String>,
    pub updated_at: String,
    pub attachment: Option<Attachment>,
}

impl RecordDraft {
    /// A draft dated today, `incomplete`, with no attachment yet.
    pub fn new(name: &str, created_by: &str) -> Self {
        let today = today();
        Self {
            name: name.to_string(),
            description: String::new(),
            status: Status::Incomplete,
            created_by: created_by.to_string(),
            created_at: today.clone(),
            updated_by: None,
            updated_at: today,
            attachment: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// Check the draft locally before any request is made.
    pub fn validate(&self, category: &Category) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if self.created_by.trim().is_empty() {
            return Err(ValidationError::MissingField("createdBy"));
        }
        if category.requires_attachment && self.attachment.is_none() {
            return Err(ValidationError::MissingAttachment(category.display_name));
        }
        Ok(())
    }

    /// The record shown locally while the create request is outstanding.
    pub fn to_record(&self, id: RecordId) -> Record {
        Record {
            id,
            name: self.name.clone(),
            description: self.description.clone(),
            status: self.status,
            created_by: self.created_by.clone(),
            created_at: Some(self.created_at.clone()),
            updated_by: self.updated_by.clone(),
            updated_at: Some(self.updated_at.clone()),
            attachment: self.attachment.clone(),
            extra: Map::new(),
        }
    }
}

/// Edits to an existing record. `None` leaves the field as it is; an absent
/// attachment keeps the server-side attachment unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub created_by: Option<String>,
    pub attachment: Option<Attachment>,
}

impl RecordUpdate {
    /// Fill unspecified fields from `current` to form a complete submission.
    pub fn resolve(&self, current: &Record) -> RecordForm {
        RecordForm {
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| current.description.clone()),
            status: self.status.unwrap_or(current.status),
            created_by: self
                .created_by
                .clone()
                .unwrap_or_else(|| current.created_by.clone()),
            attachment: self.attachment.clone(),
        }
    }
}

/// The scalar fields plus optional file that make up a create or update
/// multipart body.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordForm {
    pub name: String,
    pub description: String,
    pub status: Status,
    pub created_by: String,
    pub attachment: Option<Attachment>,
}

impl From<&RecordDraft> for RecordForm {
    fn from(draft: &RecordDraft) -> Self {
        Self {
            name: draft.name.clone(),
            description: draft.description.clone(),
            status: draft.status,
            created_by: draft.created_by.clone(),
            attachment: draft.attachment.clone(),
        }
    }
}

fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}
