use chrono::{DateTime, NaiveDateTime};

/// Formats accepted for local date-times, most specific first.
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 local date-time.
/// RFC 3339 values with an offset keep their wall-clock time.
pub fn parse_local_datetime(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(input)
                .ok()
                .map(|dt| dt.naive_local())
        })
}

/// Format a date-time for display, e.g. `Mar 1, 2025 6:30 PM`
pub fn format_datetime(value: &NaiveDateTime) -> String {
    value.format("%b %-d, %Y %-I:%M %p").to_string()
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_local_datetime() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap();
        assert_eq!(parse_local_datetime("2025-03-01T18:30:00"), Some(expected));
        assert_eq!(parse_local_datetime("2025-03-01T18:30"), Some(expected));
        assert_eq!(parse_local_datetime("2025-03-01 18:30"), Some(expected));
        assert_eq!(parse_local_datetime(" 2025-03-01T18:30:00.000 "), Some(expected));
        assert_eq!(parse_local_datetime("2025-03-01T18:30:00+02:00"), Some(expected));
        assert_eq!(parse_local_datetime("2025-03-01"), None);
        assert_eq!(parse_local_datetime("not a date"), None);
    }

    #[test]
    fn test_format_datetime() {
        let dt = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(18, 5, 0)
            .unwrap();
        assert_eq!(format_datetime(&dt), "Mar 1, 2025 6:05 PM");

        let morning = NaiveDate::from_ymd_opt(2025, 12, 24)
            .unwrap()
            .and_hms_opt(0, 15, 0)
            .unwrap();
        assert_eq!(format_datetime(&morning), "Dec 24, 2025 12:15 AM");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("Łódź rocks", 4), "Ł...");
    }
}
