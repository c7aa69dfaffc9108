use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use logitrack_core::record::RawRecord;
use logitrack_core::{
    materialize, Attachment, Category, Record, RecordDraft, RecordFilter, RecordForm, RecordId,
    RecordUpdate,
};
use logitrack_service::{RecordService, ServiceError};
use logitrack_sheet::Row;

use crate::download::save_attachment;
use crate::queue::MutationQueue;
use crate::view::ViewState;
use crate::StoreError;

/// What a store is waiting on, for rendering in-flight state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Activity {
    pub loading: bool,
    pub creating: usize,
    /// Records with a queued or running update or delete.
    pub busy: Vec<RecordId>,
}

impl Activity {
    pub fn is_idle(&self) -> bool {
        !self.loading && self.creating == 0 && self.busy.is_empty()
    }
}

/// The in-memory collection for one record category, kept in step with the
/// backend.
///
/// Collection order is the order of the last successful [`list`], with
/// creates appended and updates replacing in place. Mutations of one record
/// are applied in the order they were initiated.
///
/// [`list`]: RecordStore::list
pub struct RecordStore<S: ?Sized> {
    category: &'static Category,
    service: Arc<S>,
    records: Mutex<Vec<Record>>,
    queue: MutationQueue,
    loads: AtomicUsize,
    creates: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn begin(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<S: RecordService + ?Sized> RecordStore<S> {
    pub fn new(category: &'static Category, service: Arc<S>) -> Self {
        Self {
            category,
            service,
            records: Mutex::new(Vec::new()),
            queue: MutationQueue::new(),
            loads: AtomicUsize::new(0),
            creates: AtomicUsize::new(0),
        }
    }

    pub fn category(&self) -> &'static Category {
        self.category
    }

    fn base(&self) -> &'static str {
        self.category.base_path
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Record>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // -- Reads --

    /// Snapshot of the current collection.
    pub fn records(&self) -> Vec<Record> {
        self.lock().clone()
    }

    pub fn get(&self, id: &RecordId) -> Option<Record> {
        self.lock().iter().find(|r| &r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn filtered(&self, filter: &RecordFilter) -> Vec<Record> {
        filter.apply(&self.lock()).into_iter().cloned().collect()
    }

    pub fn activity(&self) -> Activity {
        Activity {
            loading: self.loads.load(Ordering::SeqCst) > 0,
            creating: self.creates.load(Ordering::SeqCst),
            busy: self.queue.busy_ids(),
        }
    }

    /// Whether an update or delete of `id` is outstanding, so a save
    /// control for it should be disabled.
    pub fn is_busy(&self, id: &RecordId) -> bool {
        self.queue.is_busy(id)
    }

    // -- Materialization --

    /// Convert a wire record, wrapping its attachment when one was sent.
    /// A malformed payload is logged and the attachment treated as absent.
    fn materialize_record(&self, raw: RawRecord) -> Record {
        let (mut record, attachment) = raw.into_parts();
        if let Some(data) = attachment.file_data.as_ref().filter(|v| !v.is_null()) {
            match materialize(
                data,
                attachment.file_name.as_deref(),
                self.category.default_filename,
            ) {
                Ok(att) => record.attachment = Some(att),
                Err(e) => tracing::warn!(
                    "{} record {}: unreadable attachment: {e}",
                    self.category.key,
                    record.id
                ),
            }
        }
        record
    }

    /// Replace the record with `record.id` in place; `false` if it is gone.
    fn replace(&self, record: &Record) -> bool {
        let mut records = self.lock();
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => {
                *slot = record.clone();
                true
            }
            None => false,
        }
    }

    // -- Operations --

    /// Load the collection from the backend, replacing local state.
    /// On failure the current collection is left as it is.
    pub async fn list(&self) -> Result<Vec<Record>, StoreError> {
        self.list_in(&ViewState::default()).await
    }

    pub(crate) async fn list_in(&self, view: &ViewState) -> Result<Vec<Record>, StoreError> {
        view.ensure_open(self.category)?;
        let _loading = InFlight::begin(&self.loads);
        let raws = match self.service.list_records(self.base()).await {
            Ok(raws) => raws,
            Err(e) => {
                tracing::error!("{}: failed to load records: {e}", self.category.key);
                return Err(e.into());
            }
        };
        view.ensure_open(self.category)?;

        let records: Vec<Record> = raws
            .into_iter()
            .map(|raw| self.materialize_record(raw))
            .collect();
        *self.lock() = records.clone();
        tracing::info!("{}: loaded {} records", self.category.key, records.len());
        Ok(records)
    }

    /// Create a record.
    ///
    /// The draft is validated locally, then shown at the end of the
    /// collection under a temporary id until the backend answers. On
    /// success it is replaced by the backend's record; on failure it is
    /// removed again and the error returned.
    pub async fn create(&self, draft: RecordDraft) -> Result<Record, StoreError> {
        self.create_in(&ViewState::default(), draft).await
    }

    pub(crate) async fn create_in(
        &self,
        view: &ViewState,
        draft: RecordDraft,
    ) -> Result<Record, StoreError> {
        view.ensure_open(self.category)?;
        draft.validate(self.category)?;

        let temp_id = RecordId::temporary();
        let provisional = draft.to_record(temp_id.clone());
        self.lock().push(provisional.clone());

        let _creating = InFlight::begin(&self.creates);
        let result = self
            .service
            .create_record(self.base(), &RecordForm::from(&draft))
            .await;
        view.ensure_open(self.category)?;

        match result {
            Ok(Some(raw)) => {
                let mut record = self.materialize_record(raw);
                if record.attachment.is_none() {
                    record.attachment = draft.attachment;
                }
                let mut records = self.lock();
                let already_listed = records.iter().any(|r| r.id == record.id);
                match records.iter().position(|r| r.id == temp_id) {
                    Some(i) if already_listed => {
                        records.remove(i);
                    }
                    Some(i) => records[i] = record.clone(),
                    None if already_listed => {}
                    None => records.push(record.clone()),
                }
                tracing::info!("{}: created record {}", self.category.key, record.id);
                Ok(record)
            }
            Ok(None) => {
                tracing::warn!(
                    "{}: create acknowledged without a record; keeping {temp_id} until the next load",
                    self.category.key
                );
                Ok(provisional)
            }
            Err(e) => {
                self.lock().retain(|r| r.id != temp_id);
                tracing::warn!("{}: create failed: {e}", self.category.key);
                Err(e.into())
            }
        }
    }

    fn check_updatable(&self, id: &RecordId) -> Result<Record, StoreError> {
        if id.is_temporary() {
            return Err(StoreError::NotYetCreated(id.clone()));
        }
        self.get(id)
            .ok_or_else(|| StoreError::UnknownRecord(id.clone()))
    }

    /// Submit edited fields. The attachment is sent only when `update`
    /// carries one; otherwise the backend keeps its copy and the local
    /// attachment is preserved.
    ///
    /// The call takes its place in the record's queue as soon as it is
    /// made, before the returned future is first polled.
    pub fn update<'a>(
        &'a self,
        id: &RecordId,
        update: RecordUpdate,
    ) -> impl Future<Output = Result<Record, StoreError>> + 'a {
        self.update_in(ViewState::default(), id, update)
    }

    pub(crate) fn update_in<'a>(
        &'a self,
        view: ViewState,
        id: &RecordId,
        update: RecordUpdate,
    ) -> impl Future<Output = Result<Record, StoreError>> + 'a {
        let mut ticket = self.queue.enqueue(id);
        let id = id.clone();
        async move {
            ticket.ready().await;
            view.ensure_open(self.category)?;
            let current = self.check_updatable(&id)?;
            let form = update.resolve(&current);

            let raw = self
                .service
                .update_record(self.base(), &id, &form)
                .await
                .inspect_err(|e| tracing::warn!("{}: update of {id} failed: {e}", self.category.key))?;
            view.ensure_open(self.category)?;

            let mut record = self.materialize_record(raw);
            if record.attachment.is_none() {
                record.attachment = form
                    .attachment
                    .or_else(|| self.get(&id).and_then(|r| r.attachment))
                    .or(current.attachment);
            }
            if !self.replace(&record) {
                tracing::warn!("{}: {id} left the collection during update", self.category.key);
            }
            tracing::info!("{}: updated record {id}", self.category.key);
            drop(ticket);
            Ok(record)
        }
    }

    /// Re-encode `rows` and upload them as the record's attachment.
    ///
    /// The freshly encoded bytes become the local attachment; the copy the
    /// backend echoes is not re-read. Rows are encoded at call time, so
    /// later edits to the caller's rows do not leak into this upload.
    pub fn update_attachment_only<'a>(
        &'a self,
        id: &RecordId,
        rows: &[Row],
        filename: &str,
    ) -> impl Future<Output = Result<Record, StoreError>> + 'a {
        self.update_attachment_only_in(ViewState::default(), id, rows, filename)
    }

    pub(crate) fn update_attachment_only_in<'a>(
        &'a self,
        view: ViewState,
        id: &RecordId,
        rows: &[Row],
        filename: &str,
    ) -> impl Future<Output = Result<Record, StoreError>> + 'a {
        let mut ticket = self.queue.enqueue(id);
        let id = id.clone();
        let encoded = logitrack_sheet::encode(rows);
        let filename = match filename.trim() {
            "" => self.category.default_filename.to_string(),
            name => name.to_string(),
        };
        async move {
            ticket.ready().await;
            view.ensure_open(self.category)?;
            let attachment = Attachment::new(encoded?, &filename);
            self.check_updatable(&id)?;

            let raw = self
                .service
                .update_excel(self.base(), &id, &attachment)
                .await
                .inspect_err(|e| {
                    tracing::warn!("{}: attachment upload for {id} failed: {e}", self.category.key)
                })?;
            view.ensure_open(self.category)?;

            let (mut record, _) = raw.into_parts();
            record.attachment = Some(attachment);
            if !self.replace(&record) {
                tracing::warn!("{}: {id} left the collection during upload", self.category.key);
            }
            tracing::info!("{}: replaced attachment of {id}", self.category.key);
            drop(ticket);
            Ok(record)
        }
    }

    /// Delete a record. A record the backend no longer has counts as
    /// deleted, so removing twice is not an error.
    pub fn remove<'a>(
        &'a self,
        id: &RecordId,
    ) -> impl Future<Output = Result<(), StoreError>> + 'a {
        self.remove_in(ViewState::default(), id)
    }

    pub(crate) fn remove_in<'a>(
        &'a self,
        view: ViewState,
        id: &RecordId,
    ) -> impl Future<Output = Result<(), StoreError>> + 'a {
        let mut ticket = self.queue.enqueue(id);
        let id = id.clone();
        async move {
            ticket.ready().await;
            view.ensure_open(self.category)?;
            if id.is_temporary() {
                return Err(StoreError::NotYetCreated(id));
            }

            match self.service.delete_record(self.base(), &id).await {
                Ok(()) => {}
                Err(ServiceError::NotFound(msg)) => {
                    tracing::info!("{}: {id} already gone ({msg})", self.category.key);
                }
                Err(e) => {
                    tracing::error!("{}: failed to delete {id}: {e}", self.category.key);
                    return Err(e.into());
                }
            }
            view.ensure_open(self.category)?;

            self.lock().retain(|r| r.id != id);
            tracing::info!("{}: deleted record {id}", self.category.key);
            drop(ticket);
            Ok(())
        }
    }

    /// Save an attachment into `dir`. Does nothing, returning `None`, when
    /// there is no attachment.
    pub async fn download(
        &self,
        attachment: Option<&Attachment>,
        filename: Option<&str>,
        dir: &Path,
    ) -> Result<Option<PathBuf>, StoreError> {
        let Some(attachment) = attachment else {
            return Ok(None);
        };
        save_attachment(attachment, filename, self.category.default_filename, dir)
            .await
            .map(Some)
    }
}
