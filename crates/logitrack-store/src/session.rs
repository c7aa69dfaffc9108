use std::sync::Arc;

use logitrack_core::{Record, RecordId};
use logitrack_service::RecordService;
use logitrack_sheet::{column_union, decode, Row};

use crate::store::RecordStore;
use crate::SessionError;

/// Where an [`EditSession`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    /// Rows decoded, nothing edited yet.
    Viewing,
    /// At least one cell changed since opening.
    Editing,
}

#[derive(Debug)]
struct OpenSheet {
    record_id: RecordId,
    rows: Vec<Row>,
    columns: Vec<String>,
    filename: String,
    dirty: bool,
}

/// Transient editing state for one record's attachment.
///
/// Opening decodes the attachment into rows; cell and filename edits stay
/// local until [`commit`](EditSession::commit) uploads a re-encoded sheet
/// through the owning store. A failed commit keeps every edit.
pub struct EditSession<S: ?Sized> {
    store: Arc<RecordStore<S>>,
    open: Option<OpenSheet>,
}

impl<S: RecordService + ?Sized> EditSession<S> {
    pub fn new(store: Arc<RecordStore<S>>) -> Self {
        Self { store, open: None }
    }

    pub fn state(&self) -> SessionState {
        match &self.open {
            None => SessionState::Closed,
            Some(sheet) if sheet.dirty => SessionState::Editing,
            Some(_) => SessionState::Viewing,
        }
    }

    /// Decode `record`'s attachment and start viewing it. On failure the
    /// session stays as it was.
    ///
    /// Fails with [`SessionError::UnsavedEdits`] while edits are pending;
    /// [`commit`](Self::commit) or [`discard`](Self::discard) them first.
    pub fn open(&mut self, record: &Record) -> Result<(), SessionError> {
        if let Some(sheet) = self.open.as_ref().filter(|s| s.dirty) {
            return Err(SessionError::UnsavedEdits(sheet.record_id.clone()));
        }
        let attachment = record
            .attachment
            .as_ref()
            .ok_or_else(|| SessionError::NoAttachment(record.id.clone()))?;
        let rows = decode(attachment.bytes())?;
        let columns = column_union(&rows);
        tracing::debug!(
            "opened {} ({} rows) of record {}",
            attachment.filename(),
            rows.len(),
            record.id
        );
        self.open = Some(OpenSheet {
            record_id: record.id.clone(),
            rows,
            columns,
            filename: attachment.filename().to_string(),
            dirty: false,
        });
        Ok(())
    }

    /// Open a record of the owning store by id.
    pub fn open_id(&mut self, id: &RecordId) -> Result<(), SessionError> {
        let record = self
            .store
            .get(id)
            .ok_or_else(|| crate::StoreError::UnknownRecord(id.clone()))?;
        self.open(&record)
    }

    fn sheet(&self) -> Result<&OpenSheet, SessionError> {
        self.open.as_ref().ok_or(SessionError::Closed)
    }

    fn sheet_mut(&mut self) -> Result<&mut OpenSheet, SessionError> {
        self.open.as_mut().ok_or(SessionError::Closed)
    }

    pub fn record_id(&self) -> Option<&RecordId> {
        self.open.as_ref().map(|s| &s.record_id)
    }

    pub fn rows(&self) -> &[Row] {
        match &self.open {
            Some(sheet) => &sheet.rows,
            None => &[],
        }
    }

    pub fn columns(&self) -> &[String] {
        match &self.open {
            Some(sheet) => &sheet.columns,
            None => &[],
        }
    }

    pub fn filename(&self) -> Option<&str> {
        self.open.as_ref().map(|s| s.filename.as_str())
    }

    pub fn is_dirty(&self) -> bool {
        self.state() == SessionState::Editing
    }

    /// Replace one cell. `row` is an index into [`rows`](Self::rows), never
    /// into a filtered view.
    pub fn set_cell(&mut self, row: usize, column: &str, value: &str) -> Result<(), SessionError> {
        let sheet = self.sheet_mut()?;
        if !sheet.columns.iter().any(|c| c == column) {
            return Err(SessionError::UnknownColumn(column.to_string()));
        }
        let len = sheet.rows.len();
        let target = sheet
            .rows
            .get_mut(row)
            .ok_or(SessionError::RowOutOfRange { index: row, len })?;
        target.set(column, value);
        sheet.dirty = true;
        Ok(())
    }

    /// Change the name the attachment will be saved under.
    pub fn set_filename(&mut self, filename: &str) -> Result<(), SessionError> {
        self.sheet_mut()?.filename = filename.trim().to_string();
        Ok(())
    }

    /// Rows whose values contain `term` (case-insensitive), paired with
    /// their index in the full sheet.
    pub fn matching_rows(&self, term: &str) -> Vec<(usize, &Row)> {
        let needle = term.to_lowercase();
        self.rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                needle.is_empty() || row.joined_values().to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Whether a commit could be started now: a sheet is open and no other
    /// mutation of the record is outstanding.
    pub fn can_commit(&self) -> bool {
        self.open
            .as_ref()
            .is_some_and(|s| !self.store.is_busy(&s.record_id))
    }

    /// Upload the edited sheet. On success the session closes and the
    /// updated record is returned; on failure it stays open with its edits.
    pub async fn commit(&mut self) -> Result<Record, SessionError> {
        let sheet = self.sheet()?;
        let record = self
            .store
            .update_attachment_only(&sheet.record_id, &sheet.rows, &sheet.filename)
            .await?;
        self.open = None;
        Ok(record)
    }

    /// Close without saving.
    pub fn discard(&mut self) {
        if let Some(sheet) = self.open.take() {
            tracing::debug!("discarded edits to record {}", sheet.record_id);
        }
    }
}
