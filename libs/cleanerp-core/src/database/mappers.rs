//! Row mapping utilities for converting database rows to domain models

use crate::{
    database::date_utils::{parse_iso_date, parse_iso_timestamp, parse_optional_date},
    error::{CleanErpError, Result},
    models::{
        Client, Contract, Employee, Lead, Quote, Site, SiteMarker, WorkOrder,
        WorkOrderAssignment,
    },
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

/// Parse a UUID stored as text
///
/// # Errors
/// Returns `CleanErpError::InvalidUuid` if the text is not a UUID
pub fn parse_uuid(uuid_str: &str) -> Result<Uuid> {
    Uuid::parse_str(uuid_str).map_err(|_| CleanErpError::InvalidUuid {
        uuid: uuid_str.to_string(),
    })
}

fn uuid_column(row: &SqliteRow, column: &str) -> Result<Uuid> {
    let value: String = row.try_get(column)?;
    parse_uuid(&value)
}

fn optional_uuid_column(row: &SqliteRow, column: &str) -> Result<Option<Uuid>> {
    row.try_get::<Option<String>, _>(column)?
        .as_deref()
        .map(parse_uuid)
        .transpose()
}

fn date_column(row: &SqliteRow, column: &str) -> Result<NaiveDate> {
    let value: String = row.try_get(column)?;
    Ok(parse_iso_date(&value)?)
}

fn optional_date_column(row: &SqliteRow, column: &str) -> Result<Option<NaiveDate>> {
    let value: Option<String> = row.try_get(column)?;
    Ok(parse_optional_date(value.as_deref())?)
}

fn timestamp_column(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
    let value: String = row.try_get(column)?;
    Ok(parse_iso_timestamp(&value)?)
}

fn parsed_column<T>(row: &SqliteRow, column: &str) -> Result<T>
where
    T: FromStr<Err = CleanErpError>,
{
    let value: String = row.try_get(column)?;
    value.parse()
}

/// Map a `clients` row
///
/// # Errors
/// Returns an error if a column is missing or holds an invalid value
pub fn map_client_row(row: &SqliteRow) -> Result<Client> {
    Ok(Client {
        id: uuid_column(row, "id")?,
        company_name: row.try_get("company_name")?,
        contact_name: row.try_get("contact_name")?,
        contact_email: row.try_get("contact_email")?,
        contact_phone: row.try_get("contact_phone")?,
        billing_address: row.try_get("billing_address")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        postcode: row.try_get("postcode")?,
        status: parsed_column(row, "status")?,
        payment_terms_days: row.try_get("payment_terms_days")?,
        notes: row.try_get("notes")?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}

/// Map a `sites` row
///
/// # Errors
/// Returns an error if a column is missing or holds an invalid value
pub fn map_site_row(row: &SqliteRow) -> Result<Site> {
    Ok(Site {
        id: uuid_column(row, "id")?,
        client_id: uuid_column(row, "client_id")?,
        site_name: row.try_get("site_name")?,
        address: row.try_get("address")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        postcode: row.try_get("postcode")?,
        status: parsed_column(row, "status")?,
        site_type: row.try_get("site_type")?,
        contact_name: row.try_get("contact_name")?,
        contact_phone: row.try_get("contact_phone")?,
        special_instructions: row.try_get("special_instructions")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        square_meters: row.try_get("square_meters")?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}

/// Map a site joined with its client's name into a map marker
///
/// # Errors
/// Returns an error if a column is missing or holds an invalid value
pub fn map_site_marker_row(row: &SqliteRow) -> Result<SiteMarker> {
    Ok(SiteMarker {
        site_id: uuid_column(row, "id")?,
        client_id: uuid_column(row, "client_id")?,
        site_name: row.try_get("site_name")?,
        client_name: row.try_get("company_name")?,
        address: row.try_get("address")?,
        status: parsed_column(row, "status")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
    })
}

/// Map a `contracts` row
///
/// # Errors
/// Returns an error if a column is missing or holds an invalid value
pub fn map_contract_row(row: &SqliteRow) -> Result<Contract> {
    Ok(Contract {
        id: uuid_column(row, "id")?,
        client_id: uuid_column(row, "client_id")?,
        contract_number: row.try_get("contract_number")?,
        contract_name: row.try_get("contract_name")?,
        status: parsed_column(row, "status")?,
        start_date: date_column(row, "start_date")?,
        end_date: optional_date_column(row, "end_date")?,
        billing_frequency: parsed_column(row, "billing_frequency")?,
        contract_value: row.try_get("contract_value")?,
        auto_renew: row.try_get("auto_renew")?,
        notes: row.try_get("notes")?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}

/// Map a `work_orders` row
///
/// # Errors
/// Returns an error if a column is missing or holds an invalid value
pub fn map_work_order_row(row: &SqliteRow) -> Result<WorkOrder> {
    Ok(WorkOrder {
        id: uuid_column(row, "id")?,
        site_id: uuid_column(row, "site_id")?,
        contract_id: optional_uuid_column(row, "contract_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        priority: parsed_column(row, "priority")?,
        status: parsed_column(row, "status")?,
        scheduled_date: optional_date_column(row, "scheduled_date")?,
        due_date: optional_date_column(row, "due_date")?,
        completed_date: optional_date_column(row, "completed_date")?,
        estimated_hours: row.try_get("estimated_hours")?,
        actual_hours: row.try_get("actual_hours")?,
        estimated_cost: row.try_get("estimated_cost")?,
        actual_cost: row.try_get("actual_cost")?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}

/// Map a `work_order_assignments` row
///
/// # Errors
/// Returns an error if a column is missing or holds an invalid value
pub fn map_assignment_row(row: &SqliteRow) -> Result<WorkOrderAssignment> {
    Ok(WorkOrderAssignment {
        work_order_id: uuid_column(row, "work_order_id")?,
        employee_id: uuid_column(row, "employee_id")?,
        assigned_at: timestamp_column(row, "assigned_at")?,
    })
}

/// Map an `employees` row
///
/// # Errors
/// Returns an error if a column is missing or holds an invalid value
pub fn map_employee_row(row: &SqliteRow) -> Result<Employee> {
    Ok(Employee {
        id: uuid_column(row, "id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        job_title: row.try_get("job_title")?,
        department: row.try_get("department")?,
        employment_type: parsed_column(row, "employment_type")?,
        status: parsed_column(row, "status")?,
        start_date: optional_date_column(row, "start_date")?,
        hourly_rate: row.try_get("hourly_rate")?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}

/// Map a `leads` row
///
/// # Errors
/// Returns an error if a column is missing or holds an invalid value
pub fn map_lead_row(row: &SqliteRow) -> Result<Lead> {
    Ok(Lead {
        id: uuid_column(row, "id")?,
        company_name: row.try_get("company_name")?,
        contact_name: row.try_get("contact_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        source: row.try_get("source")?,
        status: parsed_column(row, "status")?,
        estimated_value: row.try_get("estimated_value")?,
        estimated_frequency: parsed_column(row, "estimated_frequency")?,
        next_follow_up: optional_date_column(row, "next_follow_up")?,
        notes: row.try_get("notes")?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}

/// Map a `quotes` row
///
/// # Errors
/// Returns an error if a column is missing or holds an invalid value
pub fn map_quote_row(row: &SqliteRow) -> Result<Quote> {
    Ok(Quote {
        id: uuid_column(row, "id")?,
        quote_number: row.try_get("quote_number")?,
        lead_id: optional_uuid_column(row, "lead_id")?,
        client_id: optional_uuid_column(row, "client_id")?,
        title: row.try_get("title")?,
        status: parsed_column(row, "status")?,
        amount: row.try_get("amount")?,
        billing_frequency: parsed_column(row, "billing_frequency")?,
        issue_date: date_column(row, "issue_date")?,
        valid_until: optional_date_column(row, "valid_until")?,
        notes: row.try_get("notes")?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uuid_valid() {
        let uuid = Uuid::new_v4();
        assert_eq!(parse_uuid(&uuid.to_string()).unwrap(), uuid);
    }

    #[test]
    fn test_parse_uuid_invalid() {
        let err = parse_uuid("not-a-uuid").unwrap_err();
        assert!(matches!(err, CleanErpError::InvalidUuid { uuid } if uuid == "not-a-uuid"));
    }
}
