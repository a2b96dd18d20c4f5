//! Date conversion and validation utilities
//!
//! Dates are stored as ISO-8601 text: `YYYY-MM-DD` for calendar dates and
//! `YYYY-MM-DDTHH:MM:SS.sssZ` for timestamps, the same shape JavaScript's
//! `toISOString` produces.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use thiserror::Error;

/// Errors that can occur during date conversion
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DateConversionError {
    /// Date string parsing failed
    #[error("Failed to parse date string '{string}': {reason}")]
    ParseError { string: String, reason: String },

    /// Date arithmetic overflowed
    #[error("Date conversion overflow during calculation")]
    Overflow,
}

/// Errors that can occur during date validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DateValidationError {
    /// End date cannot be before start date
    #[error("{end_field} {end} cannot be before {start_field} {start}")]
    EndBeforeStart {
        start_field: &'static str,
        start: NaiveDate,
        end_field: &'static str,
        end: NaiveDate,
    },
}

impl From<DateConversionError> for crate::error::CleanErpError {
    fn from(error: DateConversionError) -> Self {
        match error {
            DateConversionError::ParseError { string, .. } => Self::InvalidDate { date: string },
            DateConversionError::Overflow => Self::InvalidDate {
                date: "overflow".to_string(),
            },
        }
    }
}

impl From<DateValidationError> for crate::error::CleanErpError {
    fn from(error: DateValidationError) -> Self {
        Self::validation(error.to_string())
    }
}

/// Format a calendar date as `YYYY-MM-DD`
pub fn format_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format a timestamp with millisecond precision and a `Z` suffix
pub fn format_iso_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a `YYYY-MM-DD` date
///
/// # Errors
/// Returns `DateConversionError::ParseError` if the string is not a valid date
pub fn parse_iso_date(s: &str) -> Result<NaiveDate, DateConversionError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| DateConversionError::ParseError {
        string: s.to_string(),
        reason: e.to_string(),
    })
}

/// Parse an RFC 3339 timestamp into UTC
///
/// # Errors
/// Returns `DateConversionError::ParseError` if the string is not a valid timestamp
pub fn parse_iso_timestamp(s: &str) -> Result<DateTime<Utc>, DateConversionError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DateConversionError::ParseError {
            string: s.to_string(),
            reason: e.to_string(),
        })
}

/// Optional variant of [`format_iso_date`] for nullable columns
pub fn format_optional_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(format_iso_date)
}

/// Optional variant of [`parse_iso_date`] for nullable columns
///
/// # Errors
/// Returns `DateConversionError::ParseError` if a present string is not a valid date
pub fn parse_optional_date(s: Option<&str>) -> Result<Option<NaiveDate>, DateConversionError> {
    s.map(parse_iso_date).transpose()
}

/// Validate that `end` is not before `start`.
///
/// Either side may be absent, in which case the range is valid. The field
/// names only feed the error message.
///
/// # Errors
/// Returns `DateValidationError::EndBeforeStart` if `end < start`
pub fn validate_date_range(
    start_field: &'static str,
    start: Option<NaiveDate>,
    end_field: &'static str,
    end: Option<NaiveDate>,
) -> Result<(), DateValidationError> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(DateValidationError::EndBeforeStart {
                start_field,
                start,
                end_field,
                end,
            });
        }
    }
    Ok(())
}

/// Format a date for display, handling None gracefully
pub fn format_date_for_display(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => format_iso_date(d),
        None => "-".to_string(),
    }
}

/// Add days to a date with overflow checking
///
/// # Errors
/// Returns `DateConversionError::Overflow` if the result is out of range
pub fn add_days(date: NaiveDate, days: i64) -> Result<NaiveDate, DateConversionError> {
    date.checked_add_signed(chrono::Duration::days(days))
        .ok_or(DateConversionError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_iso_timestamp_matches_js_shape() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 9, 7, 2).unwrap();
        assert_eq!(format_iso_timestamp(ts), "2024-03-05T09:07:02.000Z");
    }

    #[test]
    fn test_timestamp_round_trip() {
        let ts = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        let parsed = parse_iso_timestamp(&format_iso_timestamp(ts)).unwrap();
        assert_eq!(parsed, ts);
    }

    #[test]
    fn test_parse_iso_timestamp_with_offset() {
        let parsed = parse_iso_timestamp("2024-01-01T10:00:00+10:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_iso_date_valid() {
        let date = parse_iso_date("2024-06-15").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        assert_eq!(format_iso_date(date), "2024-06-15");
    }

    #[test]
    fn test_parse_iso_date_invalid() {
        assert!(parse_iso_date("invalid").is_err());
        assert!(parse_iso_date("2024-13-01").is_err());
        assert!(parse_iso_date("2024-06-32").is_err());
    }

    #[test]
    fn test_optional_dates() {
        assert_eq!(parse_optional_date(None).unwrap(), None);
        assert_eq!(
            parse_optional_date(Some("2024-02-29")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(format_optional_date(None), None);
    }

    #[test]
    fn test_validate_date_range_valid() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert!(validate_date_range("startDate", Some(start), "endDate", Some(end)).is_ok());
        assert!(validate_date_range("startDate", Some(start), "endDate", Some(start)).is_ok());
        assert!(validate_date_range("startDate", None, "endDate", Some(end)).is_ok());
        assert!(validate_date_range("startDate", Some(start), "endDate", None).is_ok());
    }

    #[test]
    fn test_validate_date_range_invalid() {
        let start = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let err = validate_date_range("startDate", Some(start), "endDate", Some(end)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "endDate 2024-01-01 cannot be before startDate 2024-12-31"
        );
    }

    #[test]
    fn test_format_date_for_display() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(format_date_for_display(Some(date)), "2024-06-15");
        assert_eq!(format_date_for_display(None), "-");
    }

    #[test]
    fn test_add_days() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(
            add_days(date, 10).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 11).unwrap()
        );
        assert_eq!(
            add_days(date, -1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
        );
        assert_eq!(add_days(NaiveDate::MAX, 1), Err(DateConversionError::Overflow));
    }
}
