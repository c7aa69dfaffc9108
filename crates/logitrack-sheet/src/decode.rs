use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};

use crate::dates::{locale_date, parse_iso_date};
use crate::error::DecodeError;
use crate::row::Row;

/// Rows in an Excel sheet.
pub(crate) const MAX_ROWS: u32 = 1_048_576;
/// Columns in an Excel sheet.
pub(crate) const MAX_COLS: u32 = 16_384;
/// Upper bound on the cells a sheet expands to once short rows are blank-filled.
const MAX_DECODED_CELLS: usize = 2_000_000;

/// Cells of one sheet row, keyed by zero-based column.
type Grid = BTreeMap<u32, Vec<(u32, String)>>;

/// Parse the first sheet of an `.xlsx` document into rows.
///
/// The first non-empty sheet row is the header; every following row gets
/// one entry per header column, with `""` for cells that are not present.
/// Rows with no values at all are skipped. Date-formatted cells come back as
/// `M/D/YYYY` strings.
///
/// Cell references past Excel's 1,048,576 rows or 16,384 columns, and
/// sheets too large to blank-fill, are rejected as malformed.
pub fn decode(bytes: &[u8]) -> Result<Vec<Row>, DecodeError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(DecodeError::NoSheets)?;

    let mut grid = Grid::new();
    let mut cells = workbook.worksheet_cells_reader(&sheet)?;
    while let Some(cell) = cells.next_cell()? {
        let (row, col) = cell.get_position();
        if row >= MAX_ROWS || col >= MAX_COLS {
            return Err(DecodeError::malformed(
                &sheet,
                format!("cell at row {} column {} is outside the sheet", row as u64 + 1, col as u64 + 1),
            ));
        }
        let Some(text) = display_text(Data::from(cell.get_value().clone())) else {
            continue;
        };
        grid.entry(row).or_default().push((col, text));
    }

    rows_from_grid(&sheet, grid)
}

/// Display string for a cell, or `None` when the cell holds no value.
fn display_text(value: Data) -> Option<String> {
    let text = match value {
        Data::Empty => return None,
        Data::String(s) => s,
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_general(f),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        Data::Error(e) => e.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(at) if dt.is_datetime() => locale_date(at.date()),
            _ => format_general(dt.as_f64()),
        },
        Data::DateTimeIso(s) => parse_iso_date(&s).map(locale_date).unwrap_or(s),
        Data::DurationIso(s) => s,
    };
    Some(text)
}

/// Format a number the way a General-formatted cell displays it.
fn format_general(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let magnitude = value.abs().log10().floor() as i32;
    let decimals = (14 - magnitude).clamp(0, 17) as usize;
    let text = format!("{value:.decimals$}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

fn rows_from_grid(sheet: &str, grid: Grid) -> Result<Vec<Row>, DecodeError> {
    let cols = grid.values().flatten().map(|(col, _)| *col);
    let (Some(min_col), Some(max_col)) = (cols.clone().min(), cols.max()) else {
        return Ok(Vec::new());
    };
    let width = (max_col - min_col) as usize + 1;
    let body_rows = grid.len().saturating_sub(1);
    if width.saturating_mul(body_rows.max(1)) > MAX_DECODED_CELLS {
        return Err(DecodeError::malformed(
            sheet,
            format!("{body_rows} rows by {width} columns is too large to display"),
        ));
    }

    let mut rows = grid.into_values();
    let Some(header_cells) = rows.next() else {
        return Ok(Vec::new());
    };
    let headers = header_names(spread(header_cells, min_col, width));

    Ok(rows
        .map(|cells| {
            let values = spread(cells, min_col, width);
            Row::from_unique(headers.iter().cloned().zip(values).collect())
        })
        .collect())
}

/// Lay a row's cells out over `width` columns starting at `min_col`.
fn spread(cells: Vec<(u32, String)>, min_col: u32, width: usize) -> Vec<String> {
    let mut values = vec![String::new(); width];
    for (col, text) in cells {
        values[(col - min_col) as usize] = text;
    }
    values
}

/// Header row names: blanks become `__EMPTY`, repeats get a `_N` suffix.
fn header_names(texts: Vec<String>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::with_capacity(texts.len());
    let mut next_suffix: HashMap<String, usize> = HashMap::new();
    texts
        .into_iter()
        .map(|text| {
            let base = if text.is_empty() { "__EMPTY".to_string() } else { text };
            let n = next_suffix.entry(base.clone()).or_insert(0);
            let mut name = if *n == 0 { base.clone() } else { format!("{base}_{n}") };
            while used.contains(&name) {
                *n += 1;
                name = format!("{base}_{n}");
            }
            *n += 1;
            used.insert(name.clone());
            name
        })
        .collect()
}
