use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use logitrack_core::attachment::content_type_for_path;
use logitrack_core::{Attachment, Category, Record, RecordDraft, RecordFilter, RecordId, RecordUpdate};
use logitrack_service::RecordService;
use logitrack_store::{Catalog, EditSession, RecordStore};

use crate::config::Command;
use crate::render;

/// Run one command against the catalog, writing its output to `out`.
pub async fn run<S, W>(catalog: &Catalog<S>, command: Command, out: &mut W) -> Result<()>
where
    S: RecordService + ?Sized,
    W: Write,
{
    match command {
        Command::List { category, filter } => {
            let store = loaded(catalog, category).await?;
            let records = store.filtered(&RecordFilter::from(filter));
            write!(out, "{}", render::records(&records))?;
        }
        Command::Show { category, id } => {
            let store = loaded(catalog, category).await?;
            let record = find(store, &id)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&render::record_json(&record))?)?;
        }
        Command::Download { category, id, dir, name } => {
            let store = loaded(catalog, category).await?;
            let record = find(store, &id)?;
            let Some(path) = store
                .download(record.attachment.as_ref(), name.as_deref(), &dir)
                .await?
            else {
                bail!("{} record {id} has no attachment", category.key);
            };
            writeln!(out, "saved {}", path.display())?;
        }
        Command::View { category, id, search } => {
            let session = open_session(catalog, category, &id).await?;
            let rows = session.matching_rows(search.as_deref().unwrap_or_default());
            writeln!(out, "{}", session.filename().unwrap_or_default())?;
            write!(out, "{}", render::sheet(session.columns(), &rows))?;
        }
        Command::SetCell { category, id, row, column, value } => {
            let mut session = open_session(catalog, category, &id).await?;
            session.set_cell(row, &column, &value)?;
            let record = session.commit().await?;
            writeln!(out, "updated {column} of row {row} in record {}", record.id)?;
        }
        Command::Rename { category, id, filename } => {
            let mut session = open_session(catalog, category, &id).await?;
            session.set_filename(&filename)?;
            let record = session.commit().await?;
            let saved_as = record.attachment.as_ref().map(|a| a.filename()).unwrap_or_default();
            writeln!(out, "record {} attachment is now {saved_as}", record.id)?;
        }
        Command::Create { category, name, description, status, created_by, file } => {
            let store = store(catalog, category)?;
            let mut draft = RecordDraft::new(&name, &created_by)
                .with_description(&description)
                .with_status(status);
            if let Some(path) = file {
                draft = draft.with_attachment(read_upload(&path).await?);
            }
            let record = store.create(draft).await?;
            writeln!(out, "created {} record {}", category.key, record.id)?;
        }
        Command::Edit { category, id, name, description, status, created_by, file } => {
            let store = loaded(catalog, category).await?;
            let attachment = match file {
                Some(path) => Some(read_upload(&path).await?),
                None => None,
            };
            let update = RecordUpdate {
                name,
                description,
                status,
                created_by,
                attachment,
            };
            let record = store.update(&RecordId::new(id), update).await?;
            writeln!(out, "updated {} record {}", category.key, record.id)?;
        }
        Command::Delete { category, id } => {
            let store = store(catalog, category)?;
            store.remove(&RecordId::new(id.as_str())).await?;
            writeln!(out, "deleted {} record {id}", category.key)?;
        }
    }
    Ok(())
}

fn store<'a, S: RecordService + ?Sized>(
    catalog: &'a Catalog<S>,
    category: &Category,
) -> Result<&'a Arc<RecordStore<S>>> {
    catalog
        .store(category)
        .with_context(|| format!("no store for {}", category.key))
}

async fn loaded<'a, S: RecordService + ?Sized>(
    catalog: &'a Catalog<S>,
    category: &Category,
) -> Result<&'a Arc<RecordStore<S>>> {
    let store = store(catalog, category)?;
    store
        .list()
        .await
        .with_context(|| format!("failed to load {}", category.display_name))?;
    Ok(store)
}

fn find<S: RecordService + ?Sized>(store: &RecordStore<S>, id: &str) -> Result<Record> {
    store
        .get(&RecordId::new(id))
        .with_context(|| format!("no {} record with id {id}", store.category().key))
}

async fn open_session<S: RecordService + ?Sized>(
    catalog: &Catalog<S>,
    category: &Category,
    id: &str,
) -> Result<EditSession<S>> {
    let store = loaded(catalog, category).await?;
    let record = find(store, id)?;
    let mut session = EditSession::new(Arc::clone(store));
    session.open(&record)?;
    Ok(session)
}

/// Read a spreadsheet from disk through the upload intake rules.
async fn read_upload(path: &Path) -> Result<Attachment> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let attachment = Attachment::from_upload(bytes, &filename, content_type_for_path(path))?;
    Ok(attachment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use clap::Parser;
    use logitrack_core::category::{CUSTOMERS, SHIPMENTS};
    use logitrack_server::table::{RecordFields, UploadedFile};
    use logitrack_server::test_helpers::{spawn_test_server, TestServer};
    use logitrack_service::HttpService;
    use logitrack_sheet::{decode, encode, Row};

    use crate::config::Cli;

    fn sheet() -> Vec<u8> {
        encode(&[
            Row::from_pairs([("Item", "Pallet"), ("Qty", "4")]),
            Row::from_pairs([("Item", "Crate"), ("Qty", "9")]),
        ])
        .unwrap()
    }

    fn seed(server: &TestServer) -> u64 {
        server
            .state
            .tables
            .insert(
                &SHIPMENTS,
                RecordFields {
                    name: Some("North run".into()),
                    created_by: Some("ops".into()),
                    ..Default::default()
                },
                Some(UploadedFile {
                    bytes: Bytes::from(sheet()),
                    file_name: Some("north.xlsx".into()),
                }),
            )
            .id
    }

    async fn exec(server: &TestServer, args: &[&str]) -> Result<String> {
        let cli = Cli::try_parse_from(
            ["logitrack", "--server-url", server.base_url.as_str()]
                .iter()
                .chain(args),
        )?;
        let svc = HttpService::with_config(&cli.client_config())?;
        let catalog = Catalog::new(Arc::new(svc));
        let mut out = Vec::new();
        run(&catalog, cli.command, &mut out).await?;
        Ok(String::from_utf8(out)?)
    }

    #[tokio::test]
    async fn list_and_show() {
        let server = spawn_test_server().await;
        let id = seed(&server);

        let out = exec(&server, &["list", "shipments"]).await.unwrap();
        assert!(out.contains("North run"));
        assert!(out.contains("north.xlsx"));

        let out = exec(&server, &["list", "shipments", "--search", "south"]).await.unwrap();
        assert_eq!(out.lines().count(), 1, "header only");

        let out = exec(&server, &["show", "shipments", &id.to_string()]).await.unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["name"], "North run");
        assert_eq!(v["file_name"], "north.xlsx");
    }

    #[tokio::test]
    async fn view_and_set_cell() {
        let server = spawn_test_server().await;
        let id = seed(&server).to_string();

        let out = exec(&server, &["view", "shipments", &id, "--search", "crate"]).await.unwrap();
        assert_eq!(out, "north.xlsx\n#  Item   Qty\n1  Crate  9\n");

        exec(&server, &["set-cell", "shipments", &id, "--row", "1", "--column", "Qty", "--value", "10"])
            .await
            .unwrap();
        let stored = server.state.tables.get(&SHIPMENTS, id.parse().unwrap()).unwrap();
        let rows = decode(&stored.file_data.unwrap()).unwrap();
        assert_eq!(rows[1].get("Qty"), Some("10"));
        assert_eq!(rows[0].get("Qty"), Some("4"));

        let err = exec(&server, &["set-cell", "shipments", &id, "--row", "5", "--column", "Qty", "--value", "1"])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err}");
    }

    #[tokio::test]
    async fn rename_and_download() {
        let server = spawn_test_server().await;
        let id = seed(&server).to_string();
        let tmp = tempfile::tempdir().unwrap();

        exec(&server, &["rename", "shipments", &id, "march.xlsx"]).await.unwrap();
        let dir = tmp.path().to_str().unwrap();
        let out = exec(&server, &["download", "shipments", &id, "--dir", dir]).await.unwrap();
        assert!(out.trim_end().ends_with("march.xlsx"));
        let saved = std::fs::read(tmp.path().join("march.xlsx")).unwrap();
        assert_eq!(decode(&saved).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn create_edit_delete() {
        let server = spawn_test_server().await;
        let tmp = tempfile::tempdir().unwrap();
        let upload = tmp.path().join("load.xlsx");
        std::fs::write(&upload, sheet()).unwrap();

        exec(
            &server,
            &["create", "shipments", "--name", "South run", "--created-by", "ops", "--file", upload.to_str().unwrap()],
        )
        .await
        .unwrap();
        let stored = server.state.tables.list(&SHIPMENTS).remove(0);
        assert_eq!(stored.file_name.as_deref(), Some("load.xlsx"));
        let id = stored.id.to_string();

        exec(&server, &["edit", "shipments", &id, "--status", "completed"]).await.unwrap();
        let stored = server.state.tables.get(&SHIPMENTS, stored.id).unwrap();
        assert_eq!(stored.status, "completed");
        assert_eq!(stored.file_name.as_deref(), Some("load.xlsx"));

        exec(&server, &["delete", "shipments", &id]).await.unwrap();
        exec(&server, &["delete", "shipments", &id]).await.unwrap();
        assert!(server.state.tables.list(&SHIPMENTS).is_empty());
    }

    #[tokio::test]
    async fn create_rejects_non_spreadsheet_upload() {
        let server = spawn_test_server().await;
        let tmp = tempfile::tempdir().unwrap();
        let upload = tmp.path().join("notes.txt");
        std::fs::write(&upload, b"hello").unwrap();

        let err = exec(
            &server,
            &["create", "customers", "--name", "Acme", "--created-by", "ops", "--file", upload.to_str().unwrap()],
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("invalid file type"), "{err}");
        assert!(server.state.tables.list(&CUSTOMERS).is_empty());
    }

    #[tokio::test]
    async fn download_without_attachment_fails() {
        let server = spawn_test_server().await;
        exec(&server, &["create", "customers", "--name", "Walk-in", "--created-by", "ops"])
            .await
            .unwrap();
        let id = server.state.tables.list(&CUSTOMERS)[0].id.to_string();

        let err = exec(&server, &["download", "customers", &id]).await.unwrap_err();
        assert!(err.to_string().contains("no attachment"));
    }
}
