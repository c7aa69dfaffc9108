use rust_xlsxwriter::{Workbook, Worksheet};

use crate::decode::{MAX_COLS, MAX_ROWS};
use crate::error::EncodeError;
use crate::row::{column_union, Row};

pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Serialize rows into a single-sheet `.xlsx` named [`DEFAULT_SHEET_NAME`].
pub fn encode(rows: &[Row]) -> Result<Vec<u8>, EncodeError> {
    encode_sheet(rows, DEFAULT_SHEET_NAME)
}

/// Serialize rows into a single-sheet `.xlsx` with the given sheet name.
///
/// The header row is the union of the rows' columns in first-appearance
/// order. Every value is written as text; a column a row does not have is
/// left blank.
pub fn encode_sheet(rows: &[Row], sheet_name: &str) -> Result<Vec<u8>, EncodeError> {
    let columns = column_union(rows);
    if columns.len() > MAX_COLS as usize || rows.len() >= MAX_ROWS as usize {
        return Err(EncodeError::TooLarge {
            rows: rows.len(),
            columns: columns.len(),
        });
    }

    let mut worksheet = Worksheet::new();
    worksheet
        .set_name(sheet_name)
        .map_err(|_| EncodeError::InvalidSheetName(sheet_name.to_string()))?;

    for (col, name) in (0u16..).zip(&columns) {
        worksheet.write_string(0, col, name)?;
    }
    for (row_index, row) in (1u32..).zip(rows) {
        for (col, name) in (0u16..).zip(&columns) {
            if let Some(value) = row.get(name) {
                worksheet.write_string(row_index, col, value)?;
            }
        }
    }

    let mut workbook = Workbook::new();
    workbook.push_worksheet(worksheet);
    Ok(workbook.save_to_buffer()?)
}
