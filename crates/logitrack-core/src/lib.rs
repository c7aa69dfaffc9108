pub mod attachment;
pub mod category;
pub mod error;
pub mod filter;
pub mod record;

pub use attachment::{materialize, Attachment};
pub use category::Category;
pub use error::{MaterializeError, ValidationError};
pub use filter::RecordFilter;
pub use record::{Record, RecordDraft, RecordForm, RecordId, RecordUpdate, Status};
