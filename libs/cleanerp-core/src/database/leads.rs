//! Lead operations

use super::core::{db_error, ErpDatabase};
use super::date_utils::{format_iso_date, format_iso_timestamp};
use super::mappers::{map_lead_row, map_quote_row};
use super::query_builders::{bind_value, stored_code, TableSpec, UpdateBuilder};
use super::validators::validate_lead_exists;
use crate::billing::BillingFrequency;
use crate::error::Result;
use crate::models::{CreateLeadRequest, Lead, LeadStatus, Quote, UpdateLeadRequest};
use crate::query::{ListQuery, Page, SortDirection};
use crate::validation::validate_request;
use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

pub const LEADS: TableSpec = TableSpec {
    table: "leads",
    entity: "Lead",
    sortable: &[
        "company_name",
        "contact_name",
        "source",
        "status",
        "estimated_value",
        "next_follow_up",
        "created_at",
        "updated_at",
    ],
    searchable: &["company_name", "contact_name", "email", "notes"],
    filterable: &["status", "source", "estimated_frequency"],
    coded: &[
        ("status", stored_code::<LeadStatus>),
        ("estimated_frequency", stored_code::<BillingFrequency>),
    ],
    default_sort: ("created_at", SortDirection::Desc),
};

/// Frequency assumed for a lead's estimate when none is given
pub const DEFAULT_LEAD_FREQUENCY: BillingFrequency = BillingFrequency::Monthly;

impl ErpDatabase {
    /// List leads
    ///
    /// # Errors
    ///
    /// Returns an error if the query names an unknown column or the database query fails
    #[instrument(skip(self))]
    pub async fn list_leads(&self, query: &ListQuery) -> Result<Page<Lead>> {
        self.fetch_page(&LEADS, query, map_lead_row).await
    }

    /// Get a lead by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    #[instrument(skip(self))]
    pub async fn get_lead(&self, id: &Uuid) -> Result<Option<Lead>> {
        self.fetch_by_id(LEADS.table, id, map_lead_row).await
    }

    /// Create a lead
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the database insert fails
    #[instrument(skip(self))]
    pub async fn create_lead(&self, request: CreateLeadRequest) -> Result<Lead> {
        validate_request(&request)?;

        let id = Uuid::new_v4();
        let now = format_iso_timestamp(Utc::now());

        sqlx::query(
            r"
            INSERT INTO leads (
                id, company_name, contact_name, email, phone, source, status,
                estimated_value, estimated_frequency, next_follow_up, notes,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(id.to_string())
        .bind(&request.company_name)
        .bind(request.contact_name.as_ref())
        .bind(request.email.as_ref())
        .bind(request.phone.as_ref())
        .bind(request.source.as_ref())
        .bind(request.status.unwrap_or_default().as_str())
        .bind(request.estimated_value)
        .bind(
            request
                .estimated_frequency
                .unwrap_or(DEFAULT_LEAD_FREQUENCY)
                .as_str(),
        )
        .bind(request.next_follow_up.map(format_iso_date))
        .bind(request.notes.as_ref())
        .bind(&now)
        .bind(&now)
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to create lead"))?;

        info!("Created lead with id: {}", id);
        self.fetch_existing(LEADS.table, LEADS.entity, &id, map_lead_row)
            .await
    }

    /// Update a lead; only fields that are present change
    ///
    /// # Errors
    ///
    /// Returns an error if the lead doesn't exist, validation fails, or the database update fails
    #[instrument(skip(self))]
    pub async fn update_lead(&self, request: UpdateLeadRequest) -> Result<Lead> {
        validate_request(&request)?;
        self.fetch_existing(LEADS.table, LEADS.entity, &request.id, map_lead_row)
            .await?;

        let builder = UpdateBuilder::new(LEADS.table)
            .set_if("company_name", request.company_name)
            .set_if("contact_name", request.contact_name)
            .set_if("email", request.email)
            .set_if("phone", request.phone)
            .set_if("source", request.source)
            .set_if("status", request.status.map(|s| s.as_str()))
            .set_if("estimated_value", request.estimated_value)
            .set_if(
                "estimated_frequency",
                request.estimated_frequency.map(|f| f.as_str()),
            )
            .set_if("next_follow_up", request.next_follow_up.map(format_iso_date))
            .set_if("notes", request.notes);

        let sql = builder.build_query_string();
        let mut q = sqlx::query(&sql);
        for value in builder.into_values() {
            q = bind_value(q, value);
        }
        q.bind(format_iso_timestamp(Utc::now()))
            .bind(request.id.to_string())
            .execute(self.pool())
            .await
            .map_err(db_error("Failed to update lead"))?;

        info!("Updated lead with id: {}", request.id);
        self.fetch_existing(LEADS.table, LEADS.entity, &request.id, map_lead_row)
            .await
    }

    /// Delete a lead; its quotes stay with the lead reference cleared
    ///
    /// # Errors
    ///
    /// Returns an error if the lead doesn't exist or the database delete fails
    #[instrument(skip(self))]
    pub async fn delete_lead(&self, id: &Uuid) -> Result<()> {
        self.delete_by_id(LEADS.table, LEADS.entity, id).await
    }

    /// Quotes issued to a lead, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the lead doesn't exist or the database query fails
    #[instrument(skip(self))]
    pub async fn list_quotes_for_lead(&self, lead_id: &Uuid) -> Result<Vec<Quote>> {
        validate_lead_exists(self.pool(), lead_id).await?;
        let rows = sqlx::query(
            "SELECT * FROM quotes WHERE lead_id = ? ORDER BY issue_date DESC, quote_number",
        )
        .bind(lead_id.to_string())
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list lead quotes"))?;
        rows.iter().map(map_quote_row).collect()
    }
}
