//! Time related utils.

use crate::{Error, Result};
use chrono::{NaiveDateTime, Utc};

/// DateTime is the alias for chrono::DateTime<Utc>.
pub type DateTime = chrono::DateTime<Utc>;

/// Date format: "20220313"
const DATE: &str = "%Y%m%d";

/// Time format for ISO 8601 basic: "20220313T072004Z"
const ISO8601: &str = "%Y%m%dT%H%M%SZ";

/// Create a new DateTime with current time.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format time into date: "20220313"
pub fn format_date(t: DateTime) -> String {
    t.format(DATE).to_string()
}

/// Format time into ISO 8601 basic format: "20220313T072004Z"
pub fn format_iso8601(t: DateTime) -> String {
    t.format(ISO8601).to_string()
}

/// Parse time from ISO 8601 basic format: "20220313T072004Z"
pub fn parse_iso8601(s: &str) -> Result<DateTime> {
    NaiveDateTime::parse_from_str(s, ISO8601)
        .map(|v| v.and_utc())
        .map_err(|e| {
            Error::request_invalid("timestamp is not in ISO 8601 basic format")
                .with_source(e)
                .with_context(format!("value: {s}"))
        })
}

/// Parse time from RFC 2822, which is the format of the `Date` header:
/// "Fri, 24 May 2013 00:00:00 GMT"
pub fn parse_rfc2822(s: &str) -> Result<DateTime> {
    chrono::DateTime::parse_from_rfc2822(s)
        .map(|v| v.with_timezone(&Utc))
        .map_err(|e| {
            Error::request_invalid("timestamp is not in RFC 2822 format")
                .with_source(e)
                .with_context(format!("value: {s}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_time() -> DateTime {
        Utc.with_ymd_and_hms(2022, 3, 1, 8, 12, 34).unwrap()
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(test_time()), "20220301");
    }

    #[test]
    fn test_format_iso8601() {
        assert_eq!(format_iso8601(test_time()), "20220301T081234Z");
    }

    #[test]
    fn test_parse_iso8601() {
        assert_eq!(parse_iso8601("20220301T081234Z").unwrap(), test_time());
        assert!(parse_iso8601("2022-03-01T08:12:34Z").is_err());
    }

    #[test]
    fn test_parse_rfc2822() {
        assert_eq!(
            parse_rfc2822("Tue, 01 Mar 2022 08:12:34 GMT").unwrap(),
            test_time()
        );
    }
}
