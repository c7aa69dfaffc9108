use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unreadable workbook: {0}")]
    Workbook(#[from] calamine::XlsxError),

    #[error("malformed sheet {sheet:?}: {detail}")]
    Malformed { sheet: String, detail: String },

    #[error("workbook contains no sheets")]
    NoSheets,
}

impl DecodeError {
    pub(crate) fn malformed(sheet: &str, detail: impl Into<String>) -> Self {
        DecodeError::Malformed {
            sheet: sheet.to_string(),
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("xlsx writer error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("invalid sheet name {0:?}")]
    InvalidSheetName(String),

    #[error("{rows} rows by {columns} columns does not fit in one sheet")]
    TooLarge { rows: usize, columns: usize },
}
