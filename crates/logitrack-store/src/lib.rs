//! Client-side record stores for the logitrack categories.
//!
//! [`RecordStore`] keeps one category's collection in step with the backend,
//! [`StoreView`] scopes a screen's calls to that screen's lifetime,
//! [`EditSession`] edits a record's spreadsheet attachment, and [`Catalog`]
//! bundles the seven stores for a running client.

mod catalog;
mod download;
mod error;
mod queue;
mod session;
mod store;
mod view;

pub use catalog::Catalog;
pub use download::save_attachment;
pub use error::{SessionError, StoreError};
pub use queue::{MutationQueue, Ticket};
pub use session::{EditSession, SessionState};
pub use store::{Activity, RecordStore};
pub use view::StoreView;
