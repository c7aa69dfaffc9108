use std::collections::HashMap;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use logitrack_core::{Category, Status};
use serde_json::{json, Value};

use super::{api_error, ApiError, AppState};
use crate::table::{RecordFields, UploadedFile};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/{category}", get(list_records).post(create_record))
        .route(
            "/api/{category}/{id}",
            put(update_record).delete(delete_record),
        )
        .route("/api/{category}/{id}/excel", put(update_excel))
}

fn category(key: &str) -> Result<&'static Category, ApiError> {
    Category::from_key(key)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("unknown collection: {key}")))
}

fn record_id(raw: &str) -> Result<u64, ApiError> {
    raw.parse()
        .map_err(|_| api_error(StatusCode::NOT_FOUND, "record not found"))
}

#[derive(Default)]
struct UploadForm {
    fields: HashMap<String, String>,
    file: Option<UploadedFile>,
}

impl UploadForm {
    fn field(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    fn record_fields(&self) -> Result<RecordFields, ApiError> {
        let status = match self.fields.get("status") {
            Some(raw) => Some(
                Status::from_str(raw)
                    .ok_or_else(|| {
                        api_error(StatusCode::BAD_REQUEST, format!("invalid status: {raw}"))
                    })?
                    .as_str()
                    .to_string(),
            ),
            None => None,
        };
        Ok(RecordFields {
            name: self.field("name"),
            description: self.field("description"),
            status,
            created_by: self.field("createdBy"),
            updated_by: self.field("updatedBy"),
        })
    }
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let bad = |e: axum::extract::multipart::MultipartError| {
        api_error(StatusCode::BAD_REQUEST, format!("malformed multipart body: {e}"))
    };
    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await.map_err(bad)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file_data" {
            let file_name = field.file_name().map(String::from);
            let bytes = field.bytes().await.map_err(bad)?;
            form.file = Some(UploadedFile { bytes, file_name });
        } else {
            let text = field.text().await.map_err(bad)?;
            form.fields.insert(name, text);
        }
    }
    Ok(form)
}

async fn hold_if_delayed(state: &AppState, key: Option<&str>) {
    if let Some(delay) = state.faults.delay_for(key) {
        tokio::time::sleep(delay).await;
    }
}

async fn list_records(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let category = category(&key)?;
    let records: Vec<Value> = state
        .tables
        .list(category)
        .iter()
        .map(|r| r.to_json())
        .collect();
    Ok(Json(Value::Array(records)))
}

async fn create_record(
    State(state): State<AppState>,
    Path(key): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let category = category(&key)?;
    let form = read_form(multipart).await?;
    let fields = form.record_fields()?;

    if fields.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
        return Err(api_error(StatusCode::BAD_REQUEST, "name is required"));
    }
    if category.requires_attachment && form.file.is_none() {
        return Err(api_error(StatusCode::BAD_REQUEST, "file_data is required"));
    }

    hold_if_delayed(&state, fields.name.as_deref()).await;
    let record = state.tables.insert(category, fields, form.file);
    tracing::info!("created {} record {}", category.key, record.id);
    Ok((StatusCode::CREATED, Json(record.to_json())))
}

async fn update_record(
    State(state): State<AppState>,
    Path((key, id)): Path<(String, String)>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let category = category(&key)?;
    let id = record_id(&id)?;
    let form = read_form(multipart).await?;
    let fields = form.record_fields()?;

    hold_if_delayed(&state, fields.name.as_deref()).await;
    let record = state
        .tables
        .update(category, id, fields, form.file)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "record not found"))?;
    tracing::info!("updated {} record {id}", category.key);
    Ok(Json(record.to_json()))
}

async fn update_excel(
    State(state): State<AppState>,
    Path((key, id)): Path<(String, String)>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let category = category(&key)?;
    let id = record_id(&id)?;
    let form = read_form(multipart).await?;

    let Some(mut file) = form.file.clone() else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Excel file is required" })),
        ));
    };
    let file_name = form.field("file_name").filter(|n| !n.is_empty());
    if file_name.is_some() {
        file.file_name = file_name;
    }

    hold_if_delayed(&state, file.file_name.as_deref()).await;
    let record = state
        .tables
        .update(category, id, RecordFields::default(), Some(file))
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "record not found"))?;
    tracing::info!("replaced attachment of {} record {id}", category.key);
    Ok(Json(record.to_json()))
}

async fn delete_record(
    State(state): State<AppState>,
    Path((key, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let category = category(&key)?;
    let id = record_id(&id)?;
    if state.tables.remove(category, id) {
        tracing::info!("deleted {} record {id}", category.key);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(api_error(StatusCode::NOT_FOUND, "record not found"))
    }
}
