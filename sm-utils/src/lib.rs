//! Shared utility functions for the SnowModel CDEC pull crates.

/// Date utility functions
pub mod dates {
    use chrono::{Datelike, NaiveDate};

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?)
    }

    /// Parse a date string in "YYYYMMDD" format (CDEC compact format).
    ///
    /// CDEC CSV responses append a "HHMM" time after a space; it is ignored.
    pub fn parse_date_compact(s: &str) -> anyhow::Result<NaiveDate> {
        let day = s.split_whitespace().next().unwrap_or("");
        Ok(NaiveDate::parse_from_str(day, "%Y%m%d")?)
    }

    /// Calendar year of a date.
    pub fn year(date: &NaiveDate) -> i32 {
        date.year()
    }

    /// Three letter English month abbreviation, e.g. "Jan".
    pub fn month_abbrev(date: &NaiveDate) -> String {
        date.format("%b").to_string()
    }

    /// Day of month, always two digits ("05").
    pub fn day_padded(date: &NaiveDate) -> String {
        date.format("%d").to_string()
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::NaiveDate;

        #[test]
        fn test_format_and_parse() {
            let date = NaiveDate::from_ymd_opt(2023, 6, 15).unwrap();
            let formatted = format_date(&date);
            assert_eq!(formatted, "2023-06-15");
            let parsed = parse_date(&formatted).unwrap();
            assert_eq!(parsed, date);
        }

        #[test]
        fn test_parse_date_rejects_garbage() {
            assert!(parse_date("2023/06/15").is_err());
            assert!(parse_date("").is_err());
        }

        #[test]
        fn test_parse_date_compact() {
            let expected = NaiveDate::from_ymd_opt(2022, 2, 15).unwrap();
            assert_eq!(parse_date_compact("20220215").unwrap(), expected);
            assert_eq!(parse_date_compact("20220215 0000").unwrap(), expected);
            assert!(parse_date_compact("2022-02-15").is_err());
        }

        #[test]
        fn test_calendar_parts() {
            let jan = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
            assert_eq!(year(&jan), 2024);
            assert_eq!(month_abbrev(&jan), "Jan");
            assert_eq!(day_padded(&jan), "15");

            let oct = NaiveDate::from_ymd_opt(2023, 10, 5).unwrap();
            assert_eq!(month_abbrev(&oct), "Oct");
            assert_eq!(day_padded(&oct), "05");
        }
    }
}
