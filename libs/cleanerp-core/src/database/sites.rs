//! Site operations

use super::core::{db_error, ErpDatabase};
use super::date_utils::format_iso_timestamp;
use super::mappers::map_site_row;
use super::query_builders::{bind_value, stored_code, TableSpec, UpdateBuilder};
use super::validators::validate_client_exists;
use crate::error::Result;
use crate::models::{CreateSiteRequest, Site, SiteStatus, UpdateSiteRequest};
use crate::query::{ListQuery, Page, SortDirection};
use crate::validation::validate_request;
use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

pub const SITES: TableSpec = TableSpec {
    table: "sites",
    entity: "Site",
    sortable: &[
        "site_name",
        "address",
        "city",
        "state",
        "postcode",
        "status",
        "site_type",
        "square_meters",
        "created_at",
        "updated_at",
    ],
    searchable: &["site_name", "address", "city", "postcode"],
    filterable: &["client_id", "status", "site_type", "city", "state"],
    coded: &[("status", stored_code::<SiteStatus>)],
    default_sort: ("site_name", SortDirection::Asc),
};

impl ErpDatabase {
    /// List sites
    ///
    /// # Errors
    ///
    /// Returns an error if the query names an unknown column or the database query fails
    #[instrument(skip(self))]
    pub async fn list_sites(&self, query: &ListQuery) -> Result<Page<Site>> {
        self.fetch_page(&SITES, query, map_site_row).await
    }

    /// Get a site by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    #[instrument(skip(self))]
    pub async fn get_site(&self, id: &Uuid) -> Result<Option<Site>> {
        self.fetch_by_id(SITES.table, id, map_site_row).await
    }

    /// Create a site for an existing client
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails, the client doesn't exist, or the database insert fails
    #[instrument(skip(self))]
    pub async fn create_site(&self, request: CreateSiteRequest) -> Result<Site> {
        validate_request(&request)?;
        validate_client_exists(self.pool(), &request.client_id).await?;

        let id = Uuid::new_v4();
        let now = format_iso_timestamp(Utc::now());

        sqlx::query(
            r"
            INSERT INTO sites (
                id, client_id, site_name, address, city, state, postcode,
                status, site_type, contact_name, contact_phone,
                special_instructions, latitude, longitude, square_meters,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(id.to_string())
        .bind(request.client_id.to_string())
        .bind(&request.site_name)
        .bind(&request.address)
        .bind(request.city.as_ref())
        .bind(request.state.as_ref())
        .bind(request.postcode.as_ref())
        .bind(request.status.unwrap_or_default().as_str())
        .bind(request.site_type.as_ref())
        .bind(request.contact_name.as_ref())
        .bind(request.contact_phone.as_ref())
        .bind(request.special_instructions.as_ref())
        .bind(request.latitude)
        .bind(request.longitude)
        .bind(request.square_meters)
        .bind(&now)
        .bind(&now)
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to create site"))?;

        info!("Created site with id: {}", id);
        self.fetch_existing(SITES.table, SITES.entity, &id, map_site_row)
            .await
    }

    /// Update a site; only fields that are present change
    ///
    /// # Errors
    ///
    /// Returns an error if the site or a newly referenced client doesn't exist,
    /// validation fails, or the database update fails
    #[instrument(skip(self))]
    pub async fn update_site(&self, request: UpdateSiteRequest) -> Result<Site> {
        validate_request(&request)?;
        self.fetch_existing(SITES.table, SITES.entity, &request.id, map_site_row)
            .await?;
        if let Some(client_id) = &request.client_id {
            validate_client_exists(self.pool(), client_id).await?;
        }

        let builder = UpdateBuilder::new(SITES.table)
            .set_if("client_id", request.client_id.map(|id| id.to_string()))
            .set_if("site_name", request.site_name)
            .set_if("address", request.address)
            .set_if("city", request.city)
            .set_if("state", request.state)
            .set_if("postcode", request.postcode)
            .set_if("status", request.status.map(|s| s.as_str()))
            .set_if("site_type", request.site_type)
            .set_if("contact_name", request.contact_name)
            .set_if("contact_phone", request.contact_phone)
            .set_if("special_instructions", request.special_instructions)
            .set_if("latitude", request.latitude)
            .set_if("longitude", request.longitude)
            .set_if("square_meters", request.square_meters);

        let sql = builder.build_query_string();
        let mut q = sqlx::query(&sql);
        for value in builder.into_values() {
            q = bind_value(q, value);
        }
        q.bind(format_iso_timestamp(Utc::now()))
            .bind(request.id.to_string())
            .execute(self.pool())
            .await
            .map_err(db_error("Failed to update site"))?;

        info!("Updated site with id: {}", request.id);
        self.fetch_existing(SITES.table, SITES.entity, &request.id, map_site_row)
            .await
    }

    /// Delete a site together with its work orders
    ///
    /// # Errors
    ///
    /// Returns an error if the site doesn't exist or the database delete fails
    #[instrument(skip(self))]
    pub async fn delete_site(&self, id: &Uuid) -> Result<()> {
        self.delete_by_id(SITES.table, SITES.entity, id).await
    }
}
