//! Request validation
//!
//! Field constraints are declared on the request types in [`crate::models`]
//! with `validator` derives. This module holds the custom rules those derives
//! reference and converts `validator` failures into [`CleanErpError`].

use crate::error::{CleanErpError, FieldIssue, Result};
use crate::models::{CreateContractRequest, CreateQuoteRequest, CreateWorkOrderRequest};
use chrono::NaiveDate;
use cleanerp_common::to_camel_case;
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

const PHONE_MIN_LEN: usize = 7;
const PHONE_MAX_LEN: usize = 20;
const POSTCODE_MIN_LEN: usize = 3;
const POSTCODE_MAX_LEN: usize = 10;

fn error_with_message(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Phone numbers: 7 to 20 characters of digits, spaces and `+()-`
///
/// # Errors
/// Returns a `phone` validation error when the value does not match
pub fn validate_phone(phone: &str) -> std::result::Result<(), ValidationError> {
    let len = phone.chars().count();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '(' | ')' | '-'));
    if (PHONE_MIN_LEN..=PHONE_MAX_LEN).contains(&len) && allowed {
        Ok(())
    } else {
        Err(error_with_message("phone", "Invalid phone number"))
    }
}

/// Postcodes: 3 to 10 letters, digits or spaces
///
/// # Errors
/// Returns a `postcode` validation error when the value does not match
pub fn validate_postcode(postcode: &str) -> std::result::Result<(), ValidationError> {
    let len = postcode.chars().count();
    let allowed = postcode
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ' ');
    if (POSTCODE_MIN_LEN..=POSTCODE_MAX_LEN).contains(&len) && allowed && !postcode.trim().is_empty()
    {
        Ok(())
    } else {
        Err(error_with_message("postcode", "Invalid postcode"))
    }
}

/// True when `end` is absent or not before `start`
#[must_use]
pub fn dates_in_order(start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    match (start, end) {
        (Some(start), Some(end)) => end >= start,
        _ => true,
    }
}

/// Contract end date must not precede its start date
///
/// # Errors
/// Returns a `date_range` validation error
pub fn validate_contract_dates(
    request: &CreateContractRequest,
) -> std::result::Result<(), ValidationError> {
    if dates_in_order(Some(request.start_date), request.end_date) {
        Ok(())
    } else {
        Err(error_with_message(
            "date_range",
            "End date cannot be before start date",
        ))
    }
}

/// Work order due date must not precede its scheduled date
///
/// # Errors
/// Returns a `date_range` validation error
pub fn validate_work_order_dates(
    request: &CreateWorkOrderRequest,
) -> std::result::Result<(), ValidationError> {
    if dates_in_order(request.scheduled_date, request.due_date) {
        Ok(())
    } else {
        Err(error_with_message(
            "date_range",
            "Due date cannot be before scheduled date",
        ))
    }
}

/// A quote names a lead or a client and expires no earlier than it is issued
///
/// # Errors
/// Returns a `quote_party` or `date_range` validation error
pub fn validate_quote_request(
    request: &CreateQuoteRequest,
) -> std::result::Result<(), ValidationError> {
    if request.lead_id.is_none() && request.client_id.is_none() {
        return Err(error_with_message(
            "quote_party",
            "A quote must reference a lead or a client",
        ));
    }
    if !dates_in_order(Some(request.issue_date), request.valid_until) {
        return Err(error_with_message(
            "date_range",
            "Valid-until date cannot be before issue date",
        ));
    }
    Ok(())
}

fn default_message(code: &str) -> String {
    match code {
        "length" => "has an invalid length".to_string(),
        "email" => "must be a valid email address".to_string(),
        "range" => "is out of range".to_string(),
        other => format!("failed {other} check"),
    }
}

/// Flatten `validator` errors into field issues keyed by camelCase field name
#[must_use]
pub fn collect_issues(errors: &ValidationErrors) -> Vec<FieldIssue> {
    let mut issues: Vec<FieldIssue> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            let field = to_camel_case(&field);
            field_errors.iter().map(move |error| FieldIssue {
                field: field.clone(),
                code: error.code.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map_or_else(|| default_message(&error.code), ToString::to_string),
            })
        })
        .collect();
    issues.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.code.cmp(&b.code)));
    issues
}

impl From<ValidationErrors> for CleanErpError {
    fn from(errors: ValidationErrors) -> Self {
        Self::InvalidFields {
            issues: collect_issues(&errors),
        }
    }
}

/// Run the declared constraints of a request
///
/// # Errors
/// Returns `CleanErpError::InvalidFields` listing every failed constraint
pub fn validate_request<T: Validate>(request: &T) -> Result<()> {
    request.validate().map_err(CleanErpError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::BillingFrequency;
    use crate::models::{CreateClientRequest, CreateSiteRequest};
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn quote_request() -> CreateQuoteRequest {
        CreateQuoteRequest {
            quote_number: "Q-1001".to_string(),
            lead_id: Some(Uuid::new_v4()),
            client_id: None,
            title: "Weekly office clean".to_string(),
            status: None,
            amount: 450.0,
            billing_frequency: BillingFrequency::Weekly,
            issue_date: date(2024, 3, 1),
            valid_until: Some(date(2024, 3, 31)),
            notes: None,
        }
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+61 (2) 9876-5432").is_ok());
        assert!(validate_phone("0412345").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("call me maybe").is_err());
        assert!(validate_phone("123456789012345678901").is_err());
    }

    #[test]
    fn test_validate_postcode() {
        assert!(validate_postcode("2000").is_ok());
        assert!(validate_postcode("SW1A 1AA").is_ok());
        assert!(validate_postcode("20").is_err());
        assert!(validate_postcode("20-00").is_err());
        assert!(validate_postcode("   ").is_err());
    }

    #[test]
    fn test_dates_in_order() {
        assert!(dates_in_order(Some(date(2024, 1, 1)), Some(date(2024, 1, 1))));
        assert!(dates_in_order(Some(date(2024, 1, 1)), None));
        assert!(dates_in_order(None, Some(date(2024, 1, 1))));
        assert!(!dates_in_order(Some(date(2024, 1, 2)), Some(date(2024, 1, 1))));
    }

    #[test]
    fn test_valid_client_passes() {
        let request = CreateClientRequest {
            company_name: "Acme Pty Ltd".to_string(),
            contact_email: Some("ops@acme.test".to_string()),
            contact_phone: Some("02 9999 0000".to_string()),
            postcode: Some("2000".to_string()),
            ..Default::default()
        };
        assert!(validate_request(&request).is_ok());
    }

    #[test]
    fn test_client_issues_are_sorted_and_camel_case() {
        let request = CreateClientRequest {
            company_name: String::new(),
            contact_email: Some("not-an-email".to_string()),
            ..Default::default()
        };
        let err = validate_request(&request).unwrap_err();
        let fields: Vec<&str> = err.issues().iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["companyName", "contactEmail"]);
        assert_eq!(err.issues()[0].message, "Company name is required");
        assert_eq!(err.issues()[1].code, "email");
    }

    #[test]
    fn test_site_coordinates_out_of_range() {
        let request = CreateSiteRequest {
            client_id: Uuid::new_v4(),
            site_name: "Head office".to_string(),
            address: "1 George St".to_string(),
            latitude: Some(95.0),
            longitude: Some(151.2),
            ..Default::default()
        };
        let err = validate_request(&request).unwrap_err();
        assert_eq!(err.issues().len(), 1);
        assert_eq!(err.issues()[0].field, "latitude");
        assert_eq!(err.issues()[0].code, "range");
    }

    #[test]
    fn test_contract_end_before_start() {
        let request = CreateContractRequest {
            client_id: Uuid::new_v4(),
            contract_number: "C-1".to_string(),
            contract_name: "Office".to_string(),
            status: None,
            start_date: date(2024, 6, 1),
            end_date: Some(date(2024, 5, 31)),
            billing_frequency: BillingFrequency::Monthly,
            contract_value: 1000.0,
            auto_renew: false,
            notes: None,
            site_ids: Vec::new(),
        };
        let err = validate_request(&request).unwrap_err();
        assert!(err.issues().iter().any(|i| i.code == "date_range"));
    }

    #[test]
    fn test_quote_requires_party() {
        assert!(validate_request(&quote_request()).is_ok());

        let mut request = quote_request();
        request.lead_id = None;
        let err = validate_request(&request).unwrap_err();
        assert!(err.issues().iter().any(|i| i.code == "quote_party"));

        request.client_id = Some(Uuid::new_v4());
        assert!(validate_request(&request).is_ok());
    }

    #[test]
    fn test_quote_valid_until_before_issue() {
        let mut request = quote_request();
        request.valid_until = Some(date(2024, 2, 1));
        let err = validate_request(&request).unwrap_err();
        assert!(err.issues().iter().any(|i| i.code == "date_range"));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let mut request = quote_request();
        request.amount = -1.0;
        let err = validate_request(&request).unwrap_err();
        assert_eq!(err.issues()[0].field, "amount");
        assert_eq!(err.issues()[0].message, "Amount cannot be negative");
    }
}
