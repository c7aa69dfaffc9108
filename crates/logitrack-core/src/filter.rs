use chrono::{DateTime, NaiveDate};

use crate::record::Record;

/// Search-box and date-range filter over a category's records.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub search: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl RecordFilter {
    pub fn matches(&self, record: &Record) -> bool {
        let needle = self.search.to_lowercase();
        if !needle.is_empty() && !record.searchable_text().to_lowercase().contains(&needle) {
            return false;
        }
        if self.start.is_none() && self.end.is_none() {
            return true;
        }
        let Some(created) = record.created_at.as_deref().and_then(parse_date) else {
            return false;
        };
        self.start.map_or(true, |start| created >= start)
            && self.end.map_or(true, |end| created <= end)
    }

    /// Matching records, in collection order.
    pub fn apply<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Parse `YYYY-MM-DD`, optionally followed by a time part, or RFC 3339.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    s.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RecordDraft, RecordId};

    fn record(name: &str, created_at: Option<&str>) -> Record {
        let mut r = RecordDraft::new(name, "ana").to_record(RecordId::from(1));
        r.created_at = created_at.map(String::from);
        r
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn empty_filter_matches_everything() {
        let f = RecordFilter::default();
        assert!(f.matches(&record("a", None)));
    }

    #[test]
    fn search_is_case_insensitive() {
        let f = RecordFilter {
            search: "NORTH".into(),
            ..Default::default()
        };
        assert!(f.matches(&record("north route", None)));
        assert!(!f.matches(&record("south route", None)));
    }

    #[test]
    fn date_range_is_inclusive() {
        let f = RecordFilter {
            start: Some(date("2024-03-01")),
            end: Some(date("2024-03-31")),
            ..Default::default()
        };
        assert!(f.matches(&record("a", Some("2024-03-01"))));
        assert!(f.matches(&record("a", Some("2024-03-31T23:00:00Z"))));
        assert!(!f.matches(&record("a", Some("2024-04-01"))));
        assert!(!f.matches(&record("a", None)));
        assert!(!f.matches(&record("a", Some("yesterday"))));
    }

    #[test]
    fn apply_keeps_order() {
        let records = vec![
            record("b north", None),
            record("a south", None),
            record("c north", None),
        ];
        let f = RecordFilter {
            search: "north".into(),
            ..Default::default()
        };
        let names: Vec<_> = f.apply(&records).iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["b north", "c north"]);
    }
}
