use std::collections::HashMap;
use std::sync::Mutex;

use bytes::Bytes;
use chrono::Utc;
use logitrack_core::attachment::BufferJson;
use logitrack_core::Category;
use serde_json::{json, Value};

/// A stored record, as the backend keeps it.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub status: String,
    pub created_by: String,
    pub created_at: String,
    pub updated_by: Option<String>,
    pub updated_at: String,
    pub file_data: Option<Bytes>,
    pub file_name: Option<String>,
}

impl StoredRecord {
    /// Wire form: `file_data` travels as a JSON byte array.
    pub fn to_json(&self) -> Value {
        let file_data = match &self.file_data {
            Some(bytes) => json!(BufferJson::new(bytes.to_vec())),
            None => Value::Null,
        };
        json!({
            "id": self.id,
            "name": self.name,
            "description": self.description,
            "status": self.status,
            "createdBy": self.created_by,
            "createdAt": self.created_at,
            "updatedBy": self.updated_by,
            "updatedAt": self.updated_at,
            "file_data": file_data,
            "file_name": self.file_name,
        })
    }
}

/// Scalar fields of a create or update request. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct RecordFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub bytes: Bytes,
    pub file_name: Option<String>,
}

/// In-memory record tables, one per category, with ids shared across all.
#[derive(Debug, Default)]
pub struct RecordTables {
    inner: Mutex<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    next_id: u64,
    rows: HashMap<&'static str, Vec<StoredRecord>>,
}

impl RecordTables {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn list(&self, category: &Category) -> Vec<StoredRecord> {
        self.lock()
            .rows
            .get(category.key)
            .cloned()
            .unwrap_or_default()
    }

    pub fn get(&self, category: &Category, id: u64) -> Option<StoredRecord> {
        self.lock()
            .rows
            .get(category.key)
            .and_then(|rows| rows.iter().find(|r| r.id == id).cloned())
    }

    pub fn insert(
        &self,
        category: &'static Category,
        fields: RecordFields,
        file: Option<UploadedFile>,
    ) -> StoredRecord {
        let now = Utc::now().to_rfc3339();
        let mut tables = self.lock();
        tables.next_id += 1;
        let (file_data, file_name) = split_file(file, category);
        let record = StoredRecord {
            id: tables.next_id,
            name: fields.name.unwrap_or_default(),
            description: fields.description.unwrap_or_default(),
            status: fields.status.unwrap_or_else(|| "incomplete".to_string()),
            created_by: fields.created_by.unwrap_or_default(),
            created_at: now.clone(),
            updated_by: fields.updated_by,
            updated_at: now,
            file_data,
            file_name,
        };
        tables
            .rows
            .entry(category.key)
            .or_default()
            .push(record.clone());
        record
    }

    /// Apply edits; a `None` file keeps the stored attachment.
    pub fn update(
        &self,
        category: &'static Category,
        id: u64,
        fields: RecordFields,
        file: Option<UploadedFile>,
    ) -> Option<StoredRecord> {
        let mut tables = self.lock();
        let record = tables
            .rows
            .get_mut(category.key)?
            .iter_mut()
            .find(|r| r.id == id)?;
        if let Some(name) = fields.name {
            record.name = name;
        }
        if let Some(description) = fields.description {
            record.description = description;
        }
        if let Some(status) = fields.status {
            record.status = status;
        }
        if let Some(created_by) = fields.created_by {
            record.created_by = created_by;
        }
        if fields.updated_by.is_some() {
            record.updated_by = fields.updated_by;
        }
        if file.is_some() {
            let (file_data, file_name) = split_file(file, category);
            record.file_data = file_data;
            record.file_name = file_name;
        }
        record.updated_at = Utc::now().to_rfc3339();
        Some(record.clone())
    }

    pub fn remove(&self, category: &Category, id: u64) -> bool {
        let mut tables = self.lock();
        let Some(rows) = tables.rows.get_mut(category.key) else {
            return false;
        };
        let before = rows.len();
        rows.retain(|r| r.id != id);
        rows.len() != before
    }
}

fn split_file(file: Option<UploadedFile>, category: &Category) -> (Option<Bytes>, Option<String>) {
    match file {
        Some(file) => {
            let name = file
                .file_name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| category.default_filename.to_string());
            (Some(file.bytes), Some(name))
        }
        None => (None, None),
    }
}
