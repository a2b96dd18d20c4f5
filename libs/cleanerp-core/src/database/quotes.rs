//! Quote operations

use super::core::{db_error, ErpDatabase};
use super::date_utils::{format_iso_date, format_iso_timestamp, validate_date_range};
use super::mappers::map_quote_row;
use super::query_builders::{bind_value, stored_code, TableSpec, UpdateBuilder};
use super::validators::{validate_client_exists, validate_lead_exists, validate_unique};
use crate::billing::BillingFrequency;
use crate::error::Result;
use crate::models::{CreateQuoteRequest, Quote, QuoteStatus, UpdateQuoteRequest};
use crate::query::{ListQuery, Page, SortDirection};
use crate::validation::validate_request;
use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

pub const QUOTES: TableSpec = TableSpec {
    table: "quotes",
    entity: "Quote",
    sortable: &[
        "quote_number",
        "title",
        "status",
        "amount",
        "billing_frequency",
        "issue_date",
        "valid_until",
        "created_at",
    ],
    searchable: &["quote_number", "title", "notes"],
    filterable: &["status", "lead_id", "client_id", "billing_frequency"],
    coded: &[
        ("status", stored_code::<QuoteStatus>),
        ("billing_frequency", stored_code::<BillingFrequency>),
    ],
    default_sort: ("issue_date", SortDirection::Desc),
};

impl ErpDatabase {
    /// List quotes
    ///
    /// # Errors
    ///
    /// Returns an error if the query names an unknown column or the database query fails
    #[instrument(skip(self))]
    pub async fn list_quotes(&self, query: &ListQuery) -> Result<Page<Quote>> {
        self.fetch_page(&QUOTES, query, map_quote_row).await
    }

    /// Get a quote by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    #[instrument(skip(self))]
    pub async fn get_quote(&self, id: &Uuid) -> Result<Option<Quote>> {
        self.fetch_by_id(QUOTES.table, id, map_quote_row).await
    }

    /// Create a quote for a lead and/or a client
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails, a referenced lead or client doesn't
    /// exist, the quote number is taken, or the database insert fails
    #[instrument(skip(self))]
    pub async fn create_quote(&self, request: CreateQuoteRequest) -> Result<Quote> {
        validate_request(&request)?;
        if let Some(lead_id) = &request.lead_id {
            validate_lead_exists(self.pool(), lead_id).await?;
        }
        if let Some(client_id) = &request.client_id {
            validate_client_exists(self.pool(), client_id).await?;
        }
        validate_unique(
            self.pool(),
            QUOTES.table,
            "quote_number",
            &request.quote_number,
            None,
        )
        .await?;

        let id = Uuid::new_v4();
        let now = format_iso_timestamp(Utc::now());

        sqlx::query(
            r"
            INSERT INTO quotes (
                id, quote_number, lead_id, client_id, title, status, amount,
                billing_frequency, issue_date, valid_until, notes,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(id.to_string())
        .bind(&request.quote_number)
        .bind(request.lead_id.map(|u| u.to_string()))
        .bind(request.client_id.map(|u| u.to_string()))
        .bind(&request.title)
        .bind(request.status.unwrap_or_default().as_str())
        .bind(request.amount)
        .bind(request.billing_frequency.as_str())
        .bind(format_iso_date(request.issue_date))
        .bind(request.valid_until.map(format_iso_date))
        .bind(request.notes.as_ref())
        .bind(&now)
        .bind(&now)
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to create quote"))?;

        info!("Created quote {} with id: {}", request.quote_number, id);
        self.fetch_existing(QUOTES.table, QUOTES.entity, &id, map_quote_row)
            .await
    }

    /// Update a quote; only fields that are present change
    ///
    /// # Errors
    ///
    /// Returns an error if the quote doesn't exist, validation fails, or the database update fails
    #[instrument(skip(self))]
    pub async fn update_quote(&self, request: UpdateQuoteRequest) -> Result<Quote> {
        validate_request(&request)?;
        let current = self
            .fetch_existing(QUOTES.table, QUOTES.entity, &request.id, map_quote_row)
            .await?;

        validate_date_range(
            "issueDate",
            Some(request.issue_date.unwrap_or(current.issue_date)),
            "validUntil",
            request.valid_until.or(current.valid_until),
        )?;
        if let Some(lead_id) = &request.lead_id {
            validate_lead_exists(self.pool(), lead_id).await?;
        }
        if let Some(client_id) = &request.client_id {
            validate_client_exists(self.pool(), client_id).await?;
        }

        let builder = UpdateBuilder::new(QUOTES.table)
            .set_if("lead_id", request.lead_id.map(|u| u.to_string()))
            .set_if("client_id", request.client_id.map(|u| u.to_string()))
            .set_if("title", request.title)
            .set_if("status", request.status.map(|s| s.as_str()))
            .set_if("amount", request.amount)
            .set_if(
                "billing_frequency",
                request.billing_frequency.map(|f| f.as_str()),
            )
            .set_if("issue_date", request.issue_date.map(format_iso_date))
            .set_if("valid_until", request.valid_until.map(format_iso_date))
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
            .map_err(db_error("Failed to update quote"))?;

        info!("Updated quote with id: {}", request.id);
        self.fetch_existing(QUOTES.table, QUOTES.entity, &request.id, map_quote_row)
            .await
    }

    /// Delete a quote
    ///
    /// # Errors
    ///
    /// Returns an error if the quote doesn't exist or the database delete fails
    #[instrument(skip(self))]
    pub async fn delete_quote(&self, id: &Uuid) -> Result<()> {
        self.delete_by_id(QUOTES.table, QUOTES.entity, id).await
    }
}
