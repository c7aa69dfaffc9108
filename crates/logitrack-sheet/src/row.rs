use std::collections::HashSet;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// One decoded sheet row: column name to display string, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from `(column, value)` pairs. A repeated column keeps its
    /// first position and its last value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut row = Row::new();
        for (k, v) in pairs {
            row.set(&k.into(), v);
        }
        row
    }

    /// Wrap cells whose column names are already distinct.
    pub(crate) fn from_unique(cells: Vec<(String, String)>) -> Self {
        Row { cells }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v.as_str())
    }

    /// Set a cell, appending the column if the row does not have it yet.
    /// Returns the previous value.
    pub fn set(&mut self, column: &str, value: impl Into<String>) -> Option<String> {
        let value = value.into();
        match self.cells.iter_mut().find(|(k, _)| k == column) {
            Some((_, v)) => Some(std::mem::replace(v, value)),
            None => {
                self.cells.push((column.to_string(), value));
                None
            }
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All values joined by a space, as a row search runs against.
    pub fn joined_values(&self) -> String {
        self.values().collect::<Vec<_>>().join(" ")
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (k, v) in &self.cells {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Union of the rows' column names, in first-appearance order.
pub fn column_union(rows: &[Row]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for column in row.columns() {
            if seen.insert(column) {
                columns.push(column.to_string());
            }
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_in_place_and_appends_new_columns() {
        let mut row = Row::from_pairs([("Name", "Alice"), ("Age", "30")]);
        assert_eq!(row.set("Age", "31"), Some("30".to_string()));
        assert_eq!(row.set("City", "Oslo"), None);
        let cols: Vec<_> = row.columns().collect();
        assert_eq!(cols, vec!["Name", "Age", "City"]);
        assert_eq!(row.get("Age"), Some("31"));
        assert_eq!(row.get("Missing"), None);
    }

    #[test]
    fn serializes_in_column_order() {
        let row = Row::from_pairs([("b", "2"), ("a", "1")]);
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"b":"2","a":"1"}"#);
    }

    #[test]
    fn union_keeps_first_appearance_order() {
        let rows = vec![
            Row::from_pairs([("Name", "A"), ("Age", "1")]),
            Row::from_pairs([("Age", "2"), ("City", "X")]),
        ];
        assert_eq!(column_union(&rows), vec!["Name", "Age", "City"]);
    }
}
