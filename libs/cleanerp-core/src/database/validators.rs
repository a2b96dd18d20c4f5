//! Entity validation utilities for database operations
//!
//! Referenced rows are checked before inserts and updates so a missing
//! client, site, contract, employee or lead surfaces as `NotFound` rather
//! than a foreign key failure.

use crate::error::{CleanErpError, Result};
use sqlx::SqlitePool;
use tracing::instrument;
use uuid::Uuid;

async fn validate_exists(
    pool: &SqlitePool,
    table: &'static str,
    entity: &'static str,
    id: &Uuid,
) -> Result<()> {
    let exists = sqlx::query(&format!("SELECT 1 FROM {table} WHERE id = ?"))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
        .map_err(|e| CleanErpError::database(format!("Failed to validate {entity}: {e}")))?
        .is_some();

    if !exists {
        return Err(CleanErpError::not_found(entity, id));
    }
    Ok(())
}

/// Validate that a client exists
///
/// # Errors
///
/// Returns `NotFound` if the client does not exist, or a database error if the query fails
#[instrument(skip(pool))]
pub async fn validate_client_exists(pool: &SqlitePool, id: &Uuid) -> Result<()> {
    validate_exists(pool, "clients", "Client", id).await
}

/// Validate that a site exists
///
/// # Errors
///
/// Returns `NotFound` if the site does not exist, or a database error if the query fails
#[instrument(skip(pool))]
pub async fn validate_site_exists(pool: &SqlitePool, id: &Uuid) -> Result<()> {
    validate_exists(pool, "sites", "Site", id).await
}

/// Validate that a contract exists
///
/// # Errors
///
/// Returns `NotFound` if the contract does not exist, or a database error if the query fails
#[instrument(skip(pool))]
pub async fn validate_contract_exists(pool: &SqlitePool, id: &Uuid) -> Result<()> {
    validate_exists(pool, "contracts", "Contract", id).await
}

/// Validate that a work order exists
///
/// # Errors
///
/// Returns `NotFound` if the work order does not exist, or a database error if the query fails
#[instrument(skip(pool))]
pub async fn validate_work_order_exists(pool: &SqlitePool, id: &Uuid) -> Result<()> {
    validate_exists(pool, "work_orders", "Work order", id).await
}

/// Validate that an employee exists
///
/// # Errors
///
/// Returns `NotFound` if the employee does not exist, or a database error if the query fails
#[instrument(skip(pool))]
pub async fn validate_employee_exists(pool: &SqlitePool, id: &Uuid) -> Result<()> {
    validate_exists(pool, "employees", "Employee", id).await
}

/// Validate that a lead exists
///
/// # Errors
///
/// Returns `NotFound` if the lead does not exist, or a database error if the query fails
#[instrument(skip(pool))]
pub async fn validate_lead_exists(pool: &SqlitePool, id: &Uuid) -> Result<()> {
    validate_exists(pool, "leads", "Lead", id).await
}

/// Validate that a quote exists
///
/// # Errors
///
/// Returns `NotFound` if the quote does not exist, or a database error if the query fails
#[instrument(skip(pool))]
pub async fn validate_quote_exists(pool: &SqlitePool, id: &Uuid) -> Result<()> {
    validate_exists(pool, "quotes", "Quote", id).await
}

/// Validate that no other row of `table` uses `value` in the unique `column`
///
/// # Errors
///
/// Returns a validation error naming the duplicate value
pub(crate) async fn validate_unique(
    pool: &SqlitePool,
    table: &'static str,
    column: &'static str,
    value: &str,
    except_id: Option<&Uuid>,
) -> Result<()> {
    let taken = sqlx::query(&format!(
        "SELECT 1 FROM {table} WHERE {column} = ? AND id != ?"
    ))
    .bind(value)
    .bind(except_id.map(ToString::to_string).unwrap_or_default())
    .fetch_optional(pool)
    .await
    .map_err(|e| CleanErpError::database(format!("Failed to check {column}: {e}")))?
    .is_some();

    if taken {
        return Err(CleanErpError::validation(format!(
            "{column} '{value}' is already in use"
        )));
    }
    Ok(())
}
