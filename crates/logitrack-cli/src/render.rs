//! Plain-text tables for terminal output.

use logitrack_core::Record;
use logitrack_sheet::Row;
use serde_json::{json, Map, Value};

/// Left-aligned columns separated by two spaces.
fn table(header: &[&str], body: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in body {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = line(header.iter().copied(), &widths);
    for row in body {
        out.push_str(&line(row.iter().map(String::as_str), &widths));
    }
    out
}

fn line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &w)| format!("{cell:<w$}"))
        .collect();
    let mut line = padded.join("  ").trim_end().to_string();
    line.push('\n');
    line
}

pub fn records(records: &[Record]) -> String {
    let body: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                r.name.clone(),
                r.status.display_name().to_string(),
                r.created_by.clone(),
                r.created_at.clone().unwrap_or_default(),
                r.attachment
                    .as_ref()
                    .map(|a| a.filename().to_string())
                    .unwrap_or_else(|| "-".into()),
            ]
        })
        .collect();
    table(
        &["ID", "NAME", "STATUS", "CREATED BY", "CREATED", "ATTACHMENT"],
        &body,
    )
}

/// Sheet rows prefixed with their index in the full sheet.
pub fn sheet(columns: &[String], rows: &[(usize, &Row)]) -> String {
    let mut header = vec!["#"];
    header.extend(columns.iter().map(String::as_str));
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|(index, row)| {
            std::iter::once(index.to_string())
                .chain(columns.iter().map(|c| row.get(c).unwrap_or_default().to_string()))
                .collect()
        })
        .collect();
    table(&header, &body)
}

pub fn record_json(record: &Record) -> Value {
    let mut fields = Map::new();
    fields.extend(record.extra.clone());
    let known = json!({
        "id": record.id.as_str(),
        "name": record.name,
        "description": record.description,
        "status": record.status.as_str(),
        "createdBy": record.created_by,
        "createdAt": record.created_at,
        "updatedBy": record.updated_by,
        "updatedAt": record.updated_at,
        "file_name": record.attachment.as_ref().map(|a| a.filename()),
        "file_size": record.attachment.as_ref().map(|a| a.len()),
    });
    if let Value::Object(known) = known {
        fields.extend(known);
    }
    Value::Object(fields)
}
