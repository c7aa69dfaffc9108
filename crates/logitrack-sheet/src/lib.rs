//! Spreadsheet codec for record attachments.
//!
//! [`decode`] turns the first sheet of an `.xlsx` document into [`Row`]s of
//! display strings keyed by the header row; [`encode`] writes rows back out
//! as a single-sheet workbook.

mod dates;
mod decode;
mod encode;
mod error;
mod row;

pub use dates::locale_date;
pub use decode::decode;
pub use encode::{encode, encode_sheet, DEFAULT_SHEET_NAME};
pub use error::{DecodeError, EncodeError};
pub use row::{column_union, Row};
