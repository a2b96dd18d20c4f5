//! Client operations

use super::core::{db_error, ErpDatabase};
use super::date_utils::format_iso_timestamp;
use super::mappers::{map_client_row, map_site_row};
use super::query_builders::{bind_value, stored_code, TableSpec, UpdateBuilder};
use crate::error::Result;
use crate::models::{Client, ClientStatus, CreateClientRequest, Site, UpdateClientRequest};
use crate::query::{ListQuery, Page, SortDirection};
use crate::validation::validate_request;
use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

pub const CLIENTS: TableSpec = TableSpec {
    table: "clients",
    entity: "Client",
    sortable: &[
        "company_name",
        "contact_name",
        "city",
        "state",
        "status",
        "created_at",
        "updated_at",
    ],
    searchable: &["company_name", "contact_name", "contact_email", "city"],
    filterable: &["status", "city", "state", "postcode"],
    coded: &[("status", stored_code::<ClientStatus>)],
    default_sort: ("company_name", SortDirection::Asc),
};

impl ErpDatabase {
    /// List clients
    ///
    /// # Errors
    ///
    /// Returns an error if the query names an unknown column or the database query fails
    #[instrument(skip(self))]
    pub async fn list_clients(&self, query: &ListQuery) -> Result<Page<Client>> {
        self.fetch_page(&CLIENTS, query, map_client_row).await
    }

    /// Get a client by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    #[instrument(skip(self))]
    pub async fn get_client(&self, id: &Uuid) -> Result<Option<Client>> {
        self.fetch_by_id(CLIENTS.table, id, map_client_row).await
    }

    /// Create a client
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the database insert fails
    #[instrument(skip(self))]
    pub async fn create_client(&self, request: CreateClientRequest) -> Result<Client> {
        validate_request(&request)?;

        let id = Uuid::new_v4();
        let now = format_iso_timestamp(Utc::now());

        sqlx::query(
            r"
            INSERT INTO clients (
                id, company_name, contact_name, contact_email, contact_phone,
                billing_address, city, state, postcode, status,
                payment_terms_days, notes, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(id.to_string())
        .bind(&request.company_name)
        .bind(request.contact_name.as_ref())
        .bind(request.contact_email.as_ref())
        .bind(request.contact_phone.as_ref())
        .bind(request.billing_address.as_ref())
        .bind(request.city.as_ref())
        .bind(request.state.as_ref())
        .bind(request.postcode.as_ref())
        .bind(request.status.unwrap_or_default().as_str())
        .bind(request.payment_terms_days)
        .bind(request.notes.as_ref())
        .bind(&now)
        .bind(&now)
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to create client"))?;

        info!("Created client with id: {}", id);
        self.fetch_existing(CLIENTS.table, CLIENTS.entity, &id, map_client_row)
            .await
    }

    /// Update a client; only fields that are present change
    ///
    /// # Errors
    ///
    /// Returns an error if the client doesn't exist, validation fails, or the database update fails
    #[instrument(skip(self))]
    pub async fn update_client(&self, request: UpdateClientRequest) -> Result<Client> {
        validate_request(&request)?;
        self.fetch_existing(CLIENTS.table, CLIENTS.entity, &request.id, map_client_row)
            .await?;

        let builder = UpdateBuilder::new(CLIENTS.table)
            .set_if("company_name", request.company_name)
            .set_if("contact_name", request.contact_name)
            .set_if("contact_email", request.contact_email)
            .set_if("contact_phone", request.contact_phone)
            .set_if("billing_address", request.billing_address)
            .set_if("city", request.city)
            .set_if("state", request.state)
            .set_if("postcode", request.postcode)
            .set_if("status", request.status.map(|s| s.as_str()))
            .set_if("payment_terms_days", request.payment_terms_days)
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
            .map_err(db_error("Failed to update client"))?;

        info!("Updated client with id: {}", request.id);
        self.fetch_existing(CLIENTS.table, CLIENTS.entity, &request.id, map_client_row)
            .await
    }

    /// Delete a client together with its sites and contracts.
    ///
    /// Work orders at those sites go with them; quotes addressed to the
    /// client keep their row with the client reference cleared.
    ///
    /// # Errors
    ///
    /// Returns an error if the client doesn't exist or the database delete fails
    #[instrument(skip(self))]
    pub async fn delete_client(&self, id: &Uuid) -> Result<()> {
        self.delete_by_id(CLIENTS.table, CLIENTS.entity, id).await
    }

    /// All sites of a client, by name
    ///
    /// # Errors
    ///
    /// Returns an error if the client doesn't exist or the database query fails
    #[instrument(skip(self))]
    pub async fn list_sites_for_client(&self, client_id: &Uuid) -> Result<Vec<Site>> {
        super::validators::validate_client_exists(self.pool(), client_id).await?;
        let rows = sqlx::query("SELECT * FROM sites WHERE client_id = ? ORDER BY site_name, id")
            .bind(client_id.to_string())
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to list client sites"))?;
        rows.iter().map(map_site_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CleanErpError;

    fn acme() -> CreateClientRequest {
        CreateClientRequest {
            company_name: "Acme Pty Ltd".to_string(),
            contact_name: Some("Jo Smith".to_string()),
            contact_email: Some("jo@acme.test".to_string()),
            city: Some("Sydney".to_string()),
            payment_terms_days: Some(14),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_get_client() {
        let db = ErpDatabase::in_memory().await.unwrap();
        let client = db.create_client(acme()).await.unwrap();
        assert_eq!(client.company_name, "Acme Pty Ltd");
        assert_eq!(client.status, ClientStatus::Active);
        assert_eq!(client.payment_terms_days, Some(14));
        assert_eq!(client.created_at, client.updated_at);

        let fetched = db.get_client(&client.id).await.unwrap().unwrap();
        assert_eq!(fetched, client);
    }

    #[tokio::test]
    async fn test_create_client_rejects_invalid_request() {
        let db = ErpDatabase::in_memory().await.unwrap();
        let request = CreateClientRequest {
            company_name: String::new(),
            ..Default::default()
        };
        let err = db.create_client(request).await.unwrap_err();
        assert!(matches!(err, CleanErpError::InvalidFields { .. }));
        assert_eq!(db.get_stats().await.unwrap().client_count, 0);
    }

    #[tokio::test]
    async fn test_update_client_partial() {
        let db = ErpDatabase::in_memory().await.unwrap();
        let client = db.create_client(acme()).await.unwrap();

        let updated = db
            .update_client(UpdateClientRequest {
                id: client.id,
                status: Some(ClientStatus::OnHold),
                notes: Some("Paused over winter".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.status, ClientStatus::OnHold);
        assert_eq!(updated.notes.as_deref(), Some("Paused over winter"));
        assert_eq!(updated.company_name, client.company_name);
        assert_eq!(updated.contact_email, client.contact_email);
        assert!(updated.updated_at >= client.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_client() {
        let db = ErpDatabase::in_memory().await.unwrap();
        let err = db
            .update_client(UpdateClientRequest {
                id: Uuid::new_v4(),
                city: Some("Perth".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CleanErpError::NotFound { entity: "Client", .. }));
    }

    #[tokio::test]
    async fn test_delete_client() {
        let db = ErpDatabase::in_memory().await.unwrap();
        let client = db.create_client(acme()).await.unwrap();
        db.delete_client(&client.id).await.unwrap();
        assert!(db.get_client(&client.id).await.unwrap().is_none());
        assert!(db.delete_client(&client.id).await.is_err());
    }
}
