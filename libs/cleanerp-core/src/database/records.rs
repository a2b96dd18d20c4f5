//! Entity-agnostic access used by the CLI and by import/export
//!
//! Records are the camelCase JSON form of the entity structs.

use super::core::ErpDatabase;
use crate::error::{CleanErpError, Result};
use crate::models::{
    CreateClientRequest, CreateContractRequest, CreateEmployeeRequest, CreateLeadRequest,
    CreateQuoteRequest, CreateSiteRequest, CreateWorkOrderRequest, EntityKind,
};
use crate::query::{ListQuery, Page};
use crate::validation::validate_request;
use cleanerp_common::MAX_PAGE_SIZE;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};
use uuid::Uuid;
use validator::Validate;

fn to_record<T: Serialize>(entity: &T) -> Result<Value> {
    Ok(serde_json::to_value(entity)?)
}

fn to_record_page<T: Serialize>(page: Page<T>) -> Result<Page<Value>> {
    let items = page.items.iter().map(to_record).collect::<Result<Vec<_>>>()?;
    Ok(Page {
        items,
        total: page.total,
        page: page.page,
        page_size: page.page_size,
    })
}

fn decode<T: DeserializeOwned + Validate>(record: Value) -> Result<T> {
    let request: T = serde_json::from_value(record)?;
    validate_request(&request)?;
    Ok(request)
}

/// Deserialize and validate a record as the creation request for `kind`
/// without touching the database
///
/// # Errors
/// Returns an error if the record has the wrong shape or fails validation
pub fn check_record(kind: EntityKind, record: &Value) -> Result<()> {
    let record = record.clone();
    match kind {
        EntityKind::Clients => decode::<CreateClientRequest>(record).map(drop),
        EntityKind::Sites => decode::<CreateSiteRequest>(record).map(drop),
        EntityKind::Contracts => decode::<CreateContractRequest>(record).map(drop),
        EntityKind::WorkOrders => decode::<CreateWorkOrderRequest>(record).map(drop),
        EntityKind::Employees => decode::<CreateEmployeeRequest>(record).map(drop),
        EntityKind::Leads => decode::<CreateLeadRequest>(record).map(drop),
        EntityKind::Quotes => decode::<CreateQuoteRequest>(record).map(drop),
    }
}

impl ErpDatabase {
    /// One page of records of any kind
    ///
    /// # Errors
    ///
    /// Returns an error if the query is invalid for the kind or the database query fails
    #[instrument(skip(self))]
    pub async fn list_records(&self, kind: EntityKind, query: &ListQuery) -> Result<Page<Value>> {
        match kind {
            EntityKind::Clients => to_record_page(self.list_clients(query).await?),
            EntityKind::Sites => to_record_page(self.list_sites(query).await?),
            EntityKind::Contracts => to_record_page(self.list_contracts(query).await?),
            EntityKind::WorkOrders => to_record_page(self.list_work_orders(query).await?),
            EntityKind::Employees => to_record_page(self.list_employees(query).await?),
            EntityKind::Leads => to_record_page(self.list_leads(query).await?),
            EntityKind::Quotes => to_record_page(self.list_quotes(query).await?),
        }
    }

    /// Every record of a kind in its default order
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    #[instrument(skip(self))]
    pub async fn all_records(&self, kind: EntityKind) -> Result<Vec<Value>> {
        let mut records = Vec::new();
        let mut page_number = 1;
        loop {
            let query = ListQuery::new().page(page_number).page_size(MAX_PAGE_SIZE);
            let page = self.list_records(kind, &query).await?;
            let has_next = page.has_next();
            records.extend(page.items);
            if !has_next {
                break;
            }
            page_number += 1;
        }
        debug!("Loaded {} {} records", records.len(), kind);
        Ok(records)
    }

    /// A single record by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    #[instrument(skip(self))]
    pub async fn get_record(&self, kind: EntityKind, id: &Uuid) -> Result<Option<Value>> {
        let record = match kind {
            EntityKind::Clients => self.get_client(id).await?.map(|e| to_record(&e)),
            EntityKind::Sites => self.get_site(id).await?.map(|e| to_record(&e)),
            EntityKind::Contracts => self.get_contract(id).await?.map(|e| to_record(&e)),
            EntityKind::WorkOrders => self.get_work_order(id).await?.map(|e| to_record(&e)),
            EntityKind::Employees => self.get_employee(id).await?.map(|e| to_record(&e)),
            EntityKind::Leads => self.get_lead(id).await?.map(|e| to_record(&e)),
            EntityKind::Quotes => self.get_quote(id).await?.map(|e| to_record(&e)),
        };
        record.transpose()
    }

    /// Create a record from its camelCase JSON form
    ///
    /// # Errors
    ///
    /// Returns an error if the record is malformed, fails validation, or the insert fails
    #[instrument(skip(self, record))]
    pub async fn create_record(&self, kind: EntityKind, record: Value) -> Result<Value> {
        match kind {
            EntityKind::Clients => to_record(&self.create_client(decode(record)?).await?),
            EntityKind::Sites => to_record(&self.create_site(decode(record)?).await?),
            EntityKind::Contracts => to_record(&self.create_contract(decode(record)?).await?),
            EntityKind::WorkOrders => {
                to_record(&self.create_work_order(decode(record)?).await?)
            }
            EntityKind::Employees => to_record(&self.create_employee(decode(record)?).await?),
            EntityKind::Leads => to_record(&self.create_lead(decode(record)?).await?),
            EntityKind::Quotes => to_record(&self.create_quote(decode(record)?).await?),
        }
    }

    /// Delete a record of any kind
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such record exists
    #[instrument(skip(self))]
    pub async fn delete_record(&self, kind: EntityKind, id: &Uuid) -> Result<()> {
        match kind {
            EntityKind::Clients => self.delete_client(id).await,
            EntityKind::Sites => self.delete_site(id).await,
            EntityKind::Contracts => self.delete_contract(id).await,
            EntityKind::WorkOrders => self.delete_work_order(id).await,
            EntityKind::Employees => self.delete_employee(id).await,
            EntityKind::Leads => self.delete_lead(id).await,
            EntityKind::Quotes => self.delete_quote(id).await,
        }
    }

    /// Like [`Self::get_record`] but a missing record is an error
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such record exists
    pub async fn require_record(&self, kind: EntityKind, id: &Uuid) -> Result<Value> {
        self.get_record(kind, id)
            .await?
            .ok_or_else(|| CleanErpError::not_found(kind.entity_name(), id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_and_fetch_generic_record() {
        let db = ErpDatabase::in_memory().await.unwrap();
        let created = db
            .create_record(
                EntityKind::Clients,
                json!({ "companyName": "Harbour Hotel", "contactEmail": "ops@harbour.test" }),
            )
            .await
            .unwrap();
        assert_eq!(created["companyName"], "Harbour Hotel");
        assert_eq!(created["status"], "active");

        let id: Uuid = created["id"].as_str().unwrap().parse().unwrap();
        let fetched = db.require_record(EntityKind::Clients, &id).await.unwrap();
        assert_eq!(fetched, created);

        db.delete_record(EntityKind::Clients, &id).await.unwrap();
        assert!(db.get_record(EntityKind::Clients, &id).await.unwrap().is_none());
        assert!(matches!(
            db.require_record(EntityKind::Clients, &id).await,
            Err(CleanErpError::NotFound {
                entity: "Client",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_all_records_spans_pages() {
        let db = ErpDatabase::in_memory().await.unwrap();
        for i in 0..105 {
            db.create_record(EntityKind::Leads, json!({ "companyName": format!("Lead {i:03}") }))
                .await
                .unwrap();
        }
        let all = db.all_records(EntityKind::Leads).await.unwrap();
        assert_eq!(all.len(), 105);

        let page = db
            .list_records(EntityKind::Leads, &ListQuery::new().page_size(10).page(11))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 5);
        assert!(!page.has_next());
    }

    #[test]
    fn test_check_record() {
        assert!(check_record(EntityKind::Employees, &json!({ "firstName": "Jo", "lastName": "Ng" })).is_ok());
        assert!(check_record(EntityKind::Employees, &json!({ "firstName": "", "lastName": "Ng" })).is_err());
        assert!(check_record(EntityKind::Sites, &json!({ "siteName": "No client" })).is_err());
    }
}
