use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use logitrack_core::{Category, Record, RecordDraft, RecordId, RecordUpdate};
use logitrack_service::RecordService;
use logitrack_sheet::Row;

use crate::store::RecordStore;
use crate::StoreError;

/// Open or closed state of the view a call was made from.
#[derive(Debug, Clone, Default)]
pub(crate) struct ViewState {
    closed: Arc<AtomicBool>,
}

impl ViewState {
    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn ensure_open(&self, category: &Category) -> Result<(), StoreError> {
        if self.is_closed() {
            tracing::warn!("{}: dropping response for a closed view", category.key);
            Err(StoreError::Abandoned)
        } else {
            Ok(())
        }
    }
}

/// One screen's handle on a shared [`RecordStore`].
///
/// Calls made through a view stop touching the store once the view is
/// detached: responses that arrive afterwards are not applied and the
/// calls fail with [`StoreError::Abandoned`]. Other views of the same
/// store, and the store itself, are unaffected.
pub struct StoreView<S: ?Sized> {
    store: Arc<RecordStore<S>>,
    state: ViewState,
}

impl<S: RecordService + ?Sized> StoreView<S> {
    pub fn new(store: Arc<RecordStore<S>>) -> Self {
        Self {
            store,
            state: ViewState::default(),
        }
    }

    pub fn store(&self) -> &Arc<RecordStore<S>> {
        &self.store
    }

    /// Mark this view as torn down.
    pub fn detach(&self) {
        self.state.close();
    }

    pub fn is_detached(&self) -> bool {
        self.state.is_closed()
    }

    pub async fn list(&self) -> Result<Vec<Record>, StoreError> {
        self.store.list_in(&self.state).await
    }

    pub async fn create(&self, draft: RecordDraft) -> Result<Record, StoreError> {
        self.store.create_in(&self.state, draft).await
    }

    pub fn update<'a>(
        &'a self,
        id: &RecordId,
        update: RecordUpdate,
    ) -> impl Future<Output = Result<Record, StoreError>> + 'a {
        self.store.update_in(self.state.clone(), id, update)
    }

    pub fn update_attachment_only<'a>(
        &'a self,
        id: &RecordId,
        rows: &[Row],
        filename: &str,
    ) -> impl Future<Output = Result<Record, StoreError>> + 'a {
        self.store
            .update_attachment_only_in(self.state.clone(), id, rows, filename)
    }

    pub fn remove<'a>(
        &'a self,
        id: &RecordId,
    ) -> impl Future<Output = Result<(), StoreError>> + 'a {
        self.store.remove_in(self.state.clone(), id)
    }
}

impl<S: ?Sized> Clone for StoreView<S> {
    /// A clone shares the original's open state.
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            state: self.state.clone(),
        }
    }
}
