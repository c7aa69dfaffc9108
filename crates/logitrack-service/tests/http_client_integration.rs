//! Integration tests for HttpService against the reference backend.
//!
//! Each test spawns an in-process axum server on 127.0.0.1:0 and exercises
//! the multipart and JSON paths through a real request/response cycle.

use logitrack_core::category::{CUSTOMERS, SHIPMENTS};
use logitrack_core::{materialize, Attachment, RecordForm, RecordId, Status};
use logitrack_server::test_helpers::spawn_test_server;
use logitrack_service::{HttpService, RecordService, ServiceError};

fn form(name: &str, attachment: Option<Attachment>) -> RecordForm {
    RecordForm {
        name: name.into(),
        description: "weekly load".into(),
        status: Status::Incomplete,
        created_by: "ops".into(),
        attachment,
    }
}

#[tokio::test]
async fn health_check_via_http() {
    let server = spawn_test_server().await;
    let svc = HttpService::new(&server.base_url);
    svc.health_check().await.unwrap();
}

#[tokio::test]
async fn record_crud_via_http() {
    let server = spawn_test_server().await;
    let svc = HttpService::new(&server.base_url);
    let base = SHIPMENTS.base_path;

    // Create
    let att = Attachment::new(vec![80u8, 75, 3, 4], "a.xlsx");
    let created = svc
        .create_record(base, &form("R1", Some(att)))
        .await
        .unwrap()
        .expect("backend echoes the record");
    assert_eq!(created.name.as_deref(), Some("R1"));
    assert_eq!(created.created_by.as_deref(), Some("ops"));
    assert_eq!(created.file_name.as_deref(), Some("a.xlsx"));

    // List, with the attachment as a byte-array payload
    let all = svc.list_records(base).await.unwrap();
    assert_eq!(all.len(), 1);
    let payload = all[0].file_data.as_ref().unwrap();
    let att = materialize(payload, all[0].file_name.as_deref(), SHIPMENTS.default_filename).unwrap();
    assert_eq!(att.bytes().as_ref(), &[80, 75, 3, 4]);

    // Update scalar fields only
    let mut edit = form("R1 renamed", None);
    edit.status = Status::Completed;
    let updated = svc.update_record(base, &created.id, &edit).await.unwrap();
    assert_eq!(updated.name.as_deref(), Some("R1 renamed"));
    assert_eq!(updated.status.as_deref(), Some("completed"));
    assert_eq!(updated.file_name.as_deref(), Some("a.xlsx"), "attachment kept");

    // Replace the attachment
    let replaced = svc
        .update_excel(base, &created.id, &Attachment::new(vec![9u8, 9], "b.xlsx"))
        .await
        .unwrap();
    assert_eq!(replaced.file_name.as_deref(), Some("b.xlsx"));

    // Delete
    svc.delete_record(base, &created.id).await.unwrap();
    assert!(svc.list_records(base).await.unwrap().is_empty());
}

#[tokio::test]
async fn attachment_is_optional_where_allowed() {
    let server = spawn_test_server().await;
    let svc = HttpService::new(&server.base_url);

    let created = svc
        .create_record(CUSTOMERS.base_path, &form("walk-in", None))
        .await
        .unwrap()
        .unwrap();
    assert!(created.file_data.as_ref().map_or(true, |v| v.is_null()));

    let err = svc
        .create_record(SHIPMENTS.base_path, &form("no file", None))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(m) if m == "file_data is required"));
}

#[tokio::test]
async fn server_errors_surface_verbatim() {
    let server = spawn_test_server().await;
    let svc = HttpService::new(&server.base_url);

    server.fail_next(400, "name already taken");
    let err = svc.list_records(SHIPMENTS.base_path).await.unwrap_err();
    assert!(matches!(&err, ServiceError::InvalidInput(m) if m == "name already taken"));

    server.fail_next_with_message(500, "Excel file is required");
    let err = svc.list_records(SHIPMENTS.base_path).await.unwrap_err();
    assert!(matches!(
        &err,
        ServiceError::Server { status: 500, message } if message == "Excel file is required"
    ));
    assert_eq!(err.server_message(), Some("Excel file is required"));
}

#[tokio::test]
async fn missing_records_are_not_found() {
    let server = spawn_test_server().await;
    let svc = HttpService::new(&server.base_url);

    let err = svc
        .delete_record(SHIPMENTS.base_path, &RecordId::from(404))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = svc
        .update_record(SHIPMENTS.base_path, &RecordId::from(404), &form("x", None))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn unnamed_excel_upload_gets_default_name() {
    let server = spawn_test_server().await;
    let svc = HttpService::new(&server.base_url);
    let created = svc
        .create_record(CUSTOMERS.base_path, &form("c", None))
        .await
        .unwrap()
        .unwrap();

    let ok = svc
        .update_excel(CUSTOMERS.base_path, &created.id, &Attachment::new(Vec::<u8>::new(), ""))
        .await
        .unwrap();
    assert_eq!(ok.file_name.as_deref(), Some(CUSTOMERS.default_filename));
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let svc = HttpService::new(&format!("http://{addr}"));
    let err = svc.list_records(SHIPMENTS.base_path).await.unwrap_err();
    assert!(matches!(err, ServiceError::Network(_)), "got {err:?}");
}
