use chrono::NaiveDate;

/// Render a date the way the dashboard's viewer does (`M/D/YYYY`).
pub fn locale_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

/// Parse the ISO text of a `t="d"` cell.
pub(crate) fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    s.trim()
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn locale_date_has_no_padding() {
        assert_eq!(locale_date(ymd(2024, 3, 5)), "3/5/2024");
        assert_eq!(locale_date(ymd(2024, 12, 25)), "12/25/2024");
    }

    #[test]
    fn iso_date_cells() {
        assert_eq!(parse_iso_date("2024-02-03T10:00:00Z"), Some(ymd(2024, 2, 3)));
        assert_eq!(parse_iso_date("garbage"), None);
    }
}
