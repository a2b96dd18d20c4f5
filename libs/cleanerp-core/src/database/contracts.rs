//! Contract operations and the contract ↔ site relation

use super::core::{db_error, ErpDatabase};
use super::date_utils::{format_iso_date, format_iso_timestamp, validate_date_range};
use super::mappers::{map_contract_row, map_site_row};
use super::query_builders::{bind_value, stored_code, TableSpec, UpdateBuilder};
use super::validators::{
    validate_client_exists, validate_contract_exists, validate_site_exists, validate_unique,
};
use crate::billing::BillingFrequency;
use crate::error::{CleanErpError, Result};
use crate::models::{
    Contract, ContractStatus, CreateContractRequest, Site, UpdateContractRequest,
};
use crate::query::{ListQuery, Page, SortDirection};
use crate::validation::validate_request;
use chrono::Utc;
use sqlx::Row;
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub const CONTRACTS: TableSpec = TableSpec {
    table: "contracts",
    entity: "Contract",
    sortable: &[
        "contract_number",
        "contract_name",
        "status",
        "start_date",
        "end_date",
        "billing_frequency",
        "contract_value",
        "created_at",
        "updated_at",
    ],
    searchable: &["contract_number", "contract_name", "notes"],
    filterable: &["client_id", "status", "billing_frequency"],
    coded: &[
        ("status", stored_code::<ContractStatus>),
        ("billing_frequency", stored_code::<BillingFrequency>),
    ],
    default_sort: ("contract_number", SortDirection::Asc),
};

impl ErpDatabase {
    /// List contracts
    ///
    /// # Errors
    ///
    /// Returns an error if the query names an unknown column or the database query fails
    #[instrument(skip(self))]
    pub async fn list_contracts(&self, query: &ListQuery) -> Result<Page<Contract>> {
        self.fetch_page(&CONTRACTS, query, map_contract_row).await
    }

    /// Get a contract by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    #[instrument(skip(self))]
    pub async fn get_contract(&self, id: &Uuid) -> Result<Option<Contract>> {
        self.fetch_by_id(CONTRACTS.table, id, map_contract_row).await
    }

    /// Create a contract, linking the listed sites
    ///
    /// Validates that:
    /// - the client exists
    /// - the contract number is unused
    /// - every listed site exists and belongs to the client
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the database insert fails
    #[instrument(skip(self))]
    pub async fn create_contract(&self, request: CreateContractRequest) -> Result<Contract> {
        validate_request(&request)?;
        validate_client_exists(self.pool(), &request.client_id).await?;
        validate_unique(
            self.pool(),
            CONTRACTS.table,
            "contract_number",
            &request.contract_number,
            None,
        )
        .await?;
        for site_id in &request.site_ids {
            self.validate_site_owner(site_id, &request.client_id).await?;
        }

        let id = Uuid::new_v4();
        let now = format_iso_timestamp(Utc::now());

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        sqlx::query(
            r"
            INSERT INTO contracts (
                id, client_id, contract_number, contract_name, status,
                start_date, end_date, billing_frequency, contract_value,
                auto_renew, notes, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(id.to_string())
        .bind(request.client_id.to_string())
        .bind(&request.contract_number)
        .bind(&request.contract_name)
        .bind(request.status.unwrap_or_default().as_str())
        .bind(format_iso_date(request.start_date))
        .bind(request.end_date.map(format_iso_date))
        .bind(request.billing_frequency.as_str())
        .bind(request.contract_value)
        .bind(request.auto_renew)
        .bind(request.notes.as_ref())
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to create contract"))?;

        for site_id in &request.site_ids {
            sqlx::query("INSERT OR IGNORE INTO contract_sites (contract_id, site_id) VALUES (?, ?)")
                .bind(id.to_string())
                .bind(site_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(db_error("Failed to link contract site"))?;
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit contract"))?;

        info!(
            "Created contract {} with id: {} covering {} site(s)",
            request.contract_number,
            id,
            request.site_ids.len()
        );
        self.fetch_existing(CONTRACTS.table, CONTRACTS.entity, &id, map_contract_row)
            .await
    }

    /// Update a contract; only fields that are present change
    ///
    /// The resulting start and end dates are checked together, so moving only
    /// the start date past an existing end date is rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if the contract doesn't exist, validation fails, or the database update fails
    #[instrument(skip(self))]
    pub async fn update_contract(&self, request: UpdateContractRequest) -> Result<Contract> {
        validate_request(&request)?;
        let current = self
            .fetch_existing(CONTRACTS.table, CONTRACTS.entity, &request.id, map_contract_row)
            .await?;

        validate_date_range(
            "startDate",
            Some(request.start_date.unwrap_or(current.start_date)),
            "endDate",
            request.end_date.or(current.end_date),
        )?;
        if let Some(number) = &request.contract_number {
            validate_unique(
                self.pool(),
                CONTRACTS.table,
                "contract_number",
                number,
                Some(&request.id),
            )
            .await?;
        }

        let builder = UpdateBuilder::new(CONTRACTS.table)
            .set_if("contract_number", request.contract_number)
            .set_if("contract_name", request.contract_name)
            .set_if("status", request.status.map(|s| s.as_str()))
            .set_if("start_date", request.start_date.map(format_iso_date))
            .set_if("end_date", request.end_date.map(format_iso_date))
            .set_if(
                "billing_frequency",
                request.billing_frequency.map(|f| f.as_str()),
            )
            .set_if("contract_value", request.contract_value)
            .set_if("auto_renew", request.auto_renew)
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
            .map_err(db_error("Failed to update contract"))?;

        info!("Updated contract with id: {}", request.id);
        self.fetch_existing(CONTRACTS.table, CONTRACTS.entity, &request.id, map_contract_row)
            .await
    }

    /// Delete a contract; its work orders stay with the contract reference cleared
    ///
    /// # Errors
    ///
    /// Returns an error if the contract doesn't exist or the database delete fails
    #[instrument(skip(self))]
    pub async fn delete_contract(&self, id: &Uuid) -> Result<()> {
        self.delete_by_id(CONTRACTS.table, CONTRACTS.entity, id).await
    }

    async fn validate_site_owner(&self, site_id: &Uuid, client_id: &Uuid) -> Result<()> {
        let row = sqlx::query("SELECT client_id FROM sites WHERE id = ?")
            .bind(site_id.to_string())
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to look up site"))?
            .ok_or_else(|| CleanErpError::not_found("Site", site_id))?;
        let owner: String = row.try_get("client_id")?;
        if owner != client_id.to_string() {
            return Err(CleanErpError::validation(format!(
                "Site {site_id} does not belong to client {client_id}"
            )));
        }
        Ok(())
    }

    /// Add a site to a contract's coverage; adding it twice is a no-op
    ///
    /// # Errors
    ///
    /// Returns an error if either row doesn't exist, the site belongs to another
    /// client, or the database insert fails
    #[instrument(skip(self))]
    pub async fn add_site_to_contract(&self, contract_id: &Uuid, site_id: &Uuid) -> Result<()> {
        let contract = self
            .fetch_existing(CONTRACTS.table, CONTRACTS.entity, contract_id, map_contract_row)
            .await?;
        self.validate_site_owner(site_id, &contract.client_id).await?;

        let result =
            sqlx::query("INSERT OR IGNORE INTO contract_sites (contract_id, site_id) VALUES (?, ?)")
                .bind(contract_id.to_string())
                .bind(site_id.to_string())
                .execute(self.pool())
                .await
                .map_err(db_error("Failed to link contract site"))?;

        if result.rows_affected() == 0 {
            debug!("Site {} already covered by contract {}", site_id, contract_id);
        } else {
            info!("Added site {} to contract {}", site_id, contract_id);
        }
        Ok(())
    }

    /// Remove a site from a contract's coverage
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the site is not covered by the contract
    #[instrument(skip(self))]
    pub async fn remove_site_from_contract(
        &self,
        contract_id: &Uuid,
        site_id: &Uuid,
    ) -> Result<()> {
        let result = sqlx::query("DELETE FROM contract_sites WHERE contract_id = ? AND site_id = ?")
            .bind(contract_id.to_string())
            .bind(site_id.to_string())
            .execute(self.pool())
            .await
            .map_err(db_error("Failed to unlink contract site"))?;

        if result.rows_affected() == 0 {
            return Err(CleanErpError::not_found(
                "Contract site",
                format!("{contract_id}/{site_id}"),
            ));
        }
        info!("Removed site {} from contract {}", site_id, contract_id);
        Ok(())
    }

    /// Sites covered by a contract, by name
    ///
    /// # Errors
    ///
    /// Returns an error if the contract doesn't exist or the database query fails
    #[instrument(skip(self))]
    pub async fn list_contract_sites(&self, contract_id: &Uuid) -> Result<Vec<Site>> {
        validate_contract_exists(self.pool(), contract_id).await?;
        let rows = sqlx::query(
            r"
            SELECT s.* FROM sites s
            JOIN contract_sites cs ON cs.site_id = s.id
            WHERE cs.contract_id = ?
            ORDER BY s.site_name, s.id
            ",
        )
        .bind(contract_id.to_string())
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list contract sites"))?;
        rows.iter().map(map_site_row).collect()
    }

    /// Contracts covering a site
    ///
    /// # Errors
    ///
    /// Returns an error if the site doesn't exist or the database query fails
    #[instrument(skip(self))]
    pub async fn list_contracts_for_site(&self, site_id: &Uuid) -> Result<Vec<Contract>> {
        validate_site_exists(self.pool(), site_id).await?;
        let rows = sqlx::query(
            r"
            SELECT c.* FROM contracts c
            JOIN contract_sites cs ON cs.contract_id = c.id
            WHERE cs.site_id = ?
            ORDER BY c.contract_number
            ",
        )
        .bind(site_id.to_string())
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list site contracts"))?;
        rows.iter().map(map_contract_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateClientRequest, CreateSiteRequest};
    use chrono::NaiveDate;

    struct Fixture {
        db: ErpDatabase,
        client_id: Uuid,
        site_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let db = ErpDatabase::in_memory().await.unwrap();
        let client = db
            .create_client(CreateClientRequest {
                company_name: "Metro Health".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let site = db
            .create_site(CreateSiteRequest {
                client_id: client.id,
                site_name: "Clinic".to_string(),
                address: "5 King St".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        Fixture {
            db,
            client_id: client.id,
            site_id: site.id,
        }
    }

    fn contract(client_id: Uuid, number: &str) -> CreateContractRequest {
        CreateContractRequest {
            client_id,
            contract_number: number.to_string(),
            contract_name: "Nightly clean".to_string(),
            status: Some(ContractStatus::Active),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31),
            billing_frequency: BillingFrequency::Monthly,
            contract_value: 4330.0,
            auto_renew: true,
            notes: None,
            site_ids: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_create_contract_with_sites() {
        let f = fixture().await;
        let created = f
            .db
            .create_contract(CreateContractRequest {
                site_ids: vec![f.site_id],
                ..contract(f.client_id, "C-100")
            })
            .await
            .unwrap();

        assert_eq!(created.billing_frequency, BillingFrequency::Monthly);
        assert!(created.auto_renew);
        assert_eq!(created.billing_breakdown().weekly, 1000.0);

        let sites = f.db.list_contract_sites(&created.id).await.unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].id, f.site_id);

        let covering = f.db.list_contracts_for_site(&f.site_id).await.unwrap();
        assert_eq!(covering[0].id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_contract_number_rejected() {
        let f = fixture().await;
        f.db.create_contract(contract(f.client_id, "C-1")).await.unwrap();
        let err = f
            .db
            .create_contract(contract(f.client_id, "C-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, CleanErpError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_update_rejects_start_after_existing_end() {
        let f = fixture().await;
        let created = f.db.create_contract(contract(f.client_id, "C-2")).await.unwrap();
        let err = f
            .db
            .update_contract(UpdateContractRequest {
                id: created.id,
                start_date: NaiveDate::from_ymd_opt(2025, 6, 1),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("endDate"));

        let updated = f
            .db
            .update_contract(UpdateContractRequest {
                id: created.id,
                contract_value: Some(5000.0),
                status: Some(ContractStatus::OnHold),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.contract_value, 5000.0);
        assert_eq!(updated.status, ContractStatus::OnHold);
    }

    #[tokio::test]
    async fn test_add_and_remove_contract_site() {
        let f = fixture().await;
        let created = f.db.create_contract(contract(f.client_id, "C-3")).await.unwrap();

        f.db.add_site_to_contract(&created.id, &f.site_id).await.unwrap();
        f.db.add_site_to_contract(&created.id, &f.site_id).await.unwrap();
        assert_eq!(f.db.list_contract_sites(&created.id).await.unwrap().len(), 1);

        f.db.remove_site_from_contract(&created.id, &f.site_id)
            .await
            .unwrap();
        assert!(f.db.list_contract_sites(&created.id).await.unwrap().is_empty());
        assert!(f
            .db
            .remove_site_from_contract(&created.id, &f.site_id)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_site_of_other_client_rejected() {
        let f = fixture().await;
        let other = f
            .db
            .create_client(CreateClientRequest {
                company_name: "Other Co".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let created = f.db.create_contract(contract(other.id, "C-4")).await.unwrap();
        let err = f
            .db
            .add_site_to_contract(&created.id, &f.site_id)
            .await
            .unwrap_err();
        assert!(matches!(err, CleanErpError::Validation { .. }));
    }
}
