//! Utility functions shared by the CleanERP crates

use crate::constants::{DATABASE_FILENAME, DATA_DIR, DATE_FORMATS};
use chrono::{DateTime, NaiveDate, Utc};
use convert_case::{Boundary, Case, Casing};
use std::path::PathBuf;

/// Get the default database path (`$HOME/.local/share/cleanerp/cleanerp.sqlite`)
#[must_use]
pub fn get_default_database_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
    PathBuf::from(home)
        .join(".local")
        .join("share")
        .join(DATA_DIR)
        .join(DATABASE_FILENAME)
}

/// Convert a camelCase identifier to snake_case.
///
/// Every upper-case ASCII letter becomes `_` plus its lower-case form and
/// nothing else changes, so `siteID` becomes `site_i_d` and digits never
/// start a word.
#[must_use]
pub fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Convert a snake_case identifier to camelCase.
///
/// Each `_` followed by a lower-case ASCII letter collapses into the
/// upper-case letter; this is the exact inverse of [`to_snake_case`].
#[must_use]
pub fn to_camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(ch) = chars.next() {
        match chars.peek() {
            Some(next) if ch == '_' && next.is_ascii_lowercase() => {
                out.push(next.to_ascii_uppercase());
                chars.next();
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Normalize a status label or code to its stored snake_case form.
///
/// `"Pending Launch"`, `"pending-launch"`, `"PENDING_LAUNCH"` and
/// `"PendingLaunch"` all become `pending_launch`.
#[must_use]
pub fn to_storage_code(label: &str) -> String {
    label
        .trim()
        .with_boundaries(&[
            Boundary::Underscore,
            Boundary::Hyphen,
            Boundary::Space,
            Boundary::LowerUpper,
        ])
        .to_case(Case::Snake)
}

/// Format a date for display
#[must_use]
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format a datetime for display
#[must_use]
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Parse a date string, trying each of [`DATE_FORMATS`] in turn
///
/// # Errors
/// Returns the `chrono::ParseError` of the first format if none match
pub fn parse_date(date_str: &str) -> Result<NaiveDate, chrono::ParseError> {
    let trimmed = date_str.trim();
    let mut first_error = None;
    for format in DATE_FORMATS {
        match NaiveDate::parse_from_str(trimmed, format) {
            Ok(date) => return Ok(date),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"),
    }
}

/// Validate a UUID string
#[must_use]
pub fn is_valid_uuid(uuid_str: &str) -> bool {
    uuid::Uuid::parse_str(uuid_str).is_ok()
}

/// Truncate a string to a maximum length, counting characters
#[must_use]
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Format a monetary amount with a dollar sign and thousands separators
#[must_use]
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return amount.to_string();
    }
    let negative = amount < 0.0;
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_database_path() {
        let path = get_default_database_path();
        let path_str = path.to_string_lossy();
        assert!(path_str.contains("cleanerp"));
        assert!(path_str.ends_with("cleanerp.sqlite"));
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("companyName"), "company_name");
        assert_eq!(to_snake_case("contactEmail"), "contact_email");
        assert_eq!(to_snake_case("addressLine1"), "address_line1");
        assert_eq!(to_snake_case("id"), "id");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("siteID"), "site_i_d");
        assert_eq!(to_snake_case("URL"), "_u_r_l");
    }

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case("company_name"), "companyName");
        assert_eq!(to_camel_case("payment_terms_days"), "paymentTermsDays");
        assert_eq!(to_camel_case("address_line1"), "addressLine1");
        assert_eq!(to_camel_case("id"), "id");
        assert_eq!(to_camel_case("alreadyCamel"), "alreadyCamel");
        assert_eq!(to_camel_case("site_i_d"), "siteID");
        assert_eq!(to_camel_case("_u_r_l"), "URL");
        assert_eq!(to_camel_case("line_1"), "line_1");
    }

    #[test]
    fn test_case_round_trip() {
        for key in ["siteName", "clientId", "estimatedHours", "updatedAt", "siteID", "URL", "geoJSONData"] {
            assert_eq!(to_camel_case(&to_snake_case(key)), key);
        }
    }

    #[test]
    fn test_to_storage_code() {
        for label in ["Pending Launch", "pending launch", "PENDING_LAUNCH", "pending-launch", "PendingLaunch", " pending_launch "] {
            assert_eq!(to_storage_code(label), "pending_launch", "{label}");
        }
        assert_eq!(to_storage_code("Active"), "active");
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(format_date(&date), "2024-02-29");
    }

    #[test]
    fn test_format_datetime() {
        let dt = DateTime::parse_from_rfc3339("2023-12-25T15:30:45Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_datetime(&dt), "2023-12-25 15:30:45 UTC");
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        assert_eq!(parse_date("2024-07-01").unwrap(), expected);
        assert_eq!(parse_date("01/07/2024").unwrap(), expected);
        assert_eq!(parse_date("2024/07/01").unwrap(), expected);
        assert_eq!(parse_date(" 2024-07-01 ").unwrap(), expected);
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date("not a date").is_err());
        assert!(parse_date("2024-13-01").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_is_valid_uuid() {
        assert!(is_valid_uuid("550e8400-e29b-41d4-a716-446655440000"));
        assert!(!is_valid_uuid("invalid-uuid"));
        assert!(!is_valid_uuid(""));
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("hello world", 5), "he...");
        assert_eq!(truncate_string("hi", 10), "hi");
        assert_eq!(truncate_string("test", 2), "...");
        assert_eq!(truncate_string("café au lait", 6), "caf...");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(2165.0), "$2,165.00");
        assert_eq!(format_currency(26000.5), "$26,000.50");
        assert_eq!(format_currency(1_234_567.891), "$1,234,567.89");
        assert_eq!(format_currency(-99.5), "-$99.50");
        assert_eq!(format_currency(999.999), "$1,000.00");
    }
}
