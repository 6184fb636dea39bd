use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d"];

/// Parses a date-like token and drops any time-of-day.
///
/// Returns `None` for blanks, null spellings and anything unrecognized.
pub fn parse_loose_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() || is_null_token(s) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    // Leading date token; news exports often write "2025.01.02. 오후 3:12".
    let token = s
        .split(|c: char| c.is_whitespace() || c == 'T')
        .next()
        .unwrap_or(s)
        .trim_end_matches('.');

    if let Some(d) = ymd_from_compact(token) {
        return Some(d);
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(token, fmt).ok())
}

/// `YYYYMMDD` with exactly eight digits.
pub fn ymd_from_compact(token: &str) -> Option<NaiveDate> {
    if token.len() != 8 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let y = token[0..4].parse::<i32>().ok()?;
    let m = token[4..6].parse::<u32>().ok()?;
    let d = token[6..8].parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(y, m, d)
}

fn is_null_token(s: &str) -> bool {
    ["nan", "nat", "none", "null"]
        .iter()
        .any(|t| s.eq_ignore_ascii_case(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, day)
    }

    #[test]
    fn parses_common_date_spellings() {
        assert_eq!(parse_loose_date("2025-01-02"), d(2025, 1, 2));
        assert_eq!(parse_loose_date("2025.01.02"), d(2025, 1, 2));
        assert_eq!(parse_loose_date("2025/1/2"), d(2025, 1, 2));
        assert_eq!(parse_loose_date("20250102"), d(2025, 1, 2));
        assert_eq!(parse_loose_date("  2025-01-02  "), d(2025, 1, 2));
    }

    #[test]
    fn discards_time_of_day() {
        assert_eq!(parse_loose_date("2025-01-02 23:59:59"), d(2025, 1, 2));
        assert_eq!(parse_loose_date("2025-01-02T09:30:00"), d(2025, 1, 2));
        assert_eq!(parse_loose_date("2025-01-02T09:30:00+09:00"), d(2025, 1, 2));
        assert_eq!(parse_loose_date("2025.01.02 15:30"), d(2025, 1, 2));
        assert_eq!(parse_loose_date("2025.01.02. 오후 3:12"), d(2025, 1, 2));
    }

    #[test]
    fn rejects_garbage_and_nulls() {
        assert_eq!(parse_loose_date(""), None);
        assert_eq!(parse_loose_date("nan"), None);
        assert_eq!(parse_loose_date("NaT"), None);
        assert_eq!(parse_loose_date("어제"), None);
        assert_eq!(parse_loose_date("2025-13-40"), None);
        assert_eq!(ymd_from_compact("2025010"), None);
    }
}
