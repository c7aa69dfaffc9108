use std::sync::Arc;

use logitrack_core::category::{
    CUSTOMERS, DELIVERY_FORWARDS, DISPATCH_OUTPUTS, ITEM_ACTIVITY_LOGS, ITEM_SNAPSHOTS, SHIPMENTS,
    SUMMARY,
};
use logitrack_core::Category;
use logitrack_service::RecordService;

use crate::session::EditSession;
use crate::store::RecordStore;
use crate::view::StoreView;

/// One store per record category, all sharing a service.
///
/// Screens are handed the catalog (or a single store from it) rather than
/// reaching for globals, so each test can build its own.
pub struct Catalog<S: ?Sized> {
    pub shipments: Arc<RecordStore<S>>,
    pub customers: Arc<RecordStore<S>>,
    pub dispatch_outputs: Arc<RecordStore<S>>,
    pub delivery_forwards: Arc<RecordStore<S>>,
    pub item_snapshots: Arc<RecordStore<S>>,
    pub item_activity_logs: Arc<RecordStore<S>>,
    pub summary: Arc<RecordStore<S>>,
}

impl<S: RecordService + ?Sized> Catalog<S> {
    pub fn new(service: Arc<S>) -> Self {
        let store =
            |category: &'static Category| Arc::new(RecordStore::new(category, Arc::clone(&service)));
        Self {
            shipments: store(&SHIPMENTS),
            customers: store(&CUSTOMERS),
            dispatch_outputs: store(&DISPATCH_OUTPUTS),
            delivery_forwards: store(&DELIVERY_FORWARDS),
            item_snapshots: store(&ITEM_SNAPSHOTS),
            item_activity_logs: store(&ITEM_ACTIVITY_LOGS),
            summary: store(&SUMMARY),
        }
    }

    /// All stores, in [`Category::ALL`] order.
    pub fn stores(&self) -> [&Arc<RecordStore<S>>; 7] {
        [
            &self.shipments,
            &self.customers,
            &self.dispatch_outputs,
            &self.delivery_forwards,
            &self.item_snapshots,
            &self.item_activity_logs,
            &self.summary,
        ]
    }

    pub fn store(&self, category: &Category) -> Option<&Arc<RecordStore<S>>> {
        self.stores()
            .into_iter()
            .find(|s| s.category().key == category.key)
    }

    pub fn by_key(&self, key: &str) -> Option<&Arc<RecordStore<S>>> {
        Category::from_key(key).and_then(|c| self.store(c))
    }

    /// A new view on `category`'s store, open until it is detached.
    pub fn view(&self, category: &Category) -> Option<StoreView<S>> {
        self.store(category).map(|s| StoreView::new(Arc::clone(s)))
    }

    /// A fresh edit session bound to `category`'s store.
    pub fn edit_session(&self, category: &Category) -> Option<EditSession<S>> {
        self.store(category).map(|s| EditSession::new(Arc::clone(s)))
    }
}
