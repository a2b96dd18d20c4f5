//! Test utilities and seeded fixtures for CleanERP

use crate::billing::BillingFrequency;
use crate::database::{add_days, ErpDatabase};
use crate::error::Result;
use crate::models::{
    ClientStatus, ContractStatus, CreateClientRequest, CreateContractRequest,
    CreateEmployeeRequest, CreateLeadRequest, CreateQuoteRequest, CreateSiteRequest,
    CreateWorkOrderRequest, EmploymentType, LeadStatus, QuoteStatus, UpdateWorkOrderRequest,
    WorkOrderPriority, WorkOrderStatus,
};
use chrono::{NaiveDate, Utc};
use std::path::Path;
use uuid::Uuid;

/// Ids of the rows created by [`seed_test_data`]
#[derive(Debug, Clone)]
pub struct SeedData {
    pub harbour_hotel: Uuid,
    pub metro_health: Uuid,
    pub old_mill: Uuid,
    pub lobby_site: Uuid,
    pub conference_site: Uuid,
    pub clinic_site: Uuid,
    pub harbour_contract: Uuid,
    pub metro_contract: Uuid,
    pub expired_contract: Uuid,
    pub alex: Uuid,
    pub kim: Uuid,
    pub overdue_order: Uuid,
    pub upcoming_order: Uuid,
    pub completed_order: Uuid,
    pub bayside_lead: Uuid,
    pub hilltop_lead: Uuid,
    pub sent_quote: Uuid,
    pub accepted_quote: Uuid,
}

/// Weekly revenue of the seeded active contracts (1000.00 + 500.00)
pub const SEED_WEEKLY_REVENUE: f64 = 1500.0;

/// Create a migrated, seeded database file at `db_path`
///
/// # Errors
/// Returns an error if the database cannot be created or seeded
pub async fn create_test_database<P: AsRef<Path>>(db_path: P) -> Result<(ErpDatabase, SeedData)> {
    let db = ErpDatabase::new(db_path.as_ref()).await?;
    db.migrate().await?;
    let seed = seed_test_data(&db).await?;
    Ok((db, seed))
}

/// Create a seeded in-memory database
///
/// # Errors
/// Returns an error if the database cannot be created or seeded
pub async fn create_seeded_database() -> Result<(ErpDatabase, SeedData)> {
    let db = ErpDatabase::in_memory().await?;
    let seed = seed_test_data(&db).await?;
    Ok((db, seed))
}

#[must_use]
pub fn mock_client_request(company_name: &str) -> CreateClientRequest {
    CreateClientRequest {
        company_name: company_name.to_string(),
        contact_name: Some("Facilities Manager".to_string()),
        contact_email: Some(format!(
            "facilities@{}.test",
            company_name.to_lowercase().replace(' ', "")
        )),
        contact_phone: Some("+61 2 9000 0000".to_string()),
        city: Some("Sydney".to_string()),
        state: Some("NSW".to_string()),
        postcode: Some("2000".to_string()),
        payment_terms_days: Some(30),
        ..Default::default()
    }
}

#[must_use]
pub fn mock_site_request(client_id: Uuid, site_name: &str) -> CreateSiteRequest {
    CreateSiteRequest {
        client_id,
        site_name: site_name.to_string(),
        address: format!("1 {site_name} Street"),
        ..Default::default()
    }
}

#[must_use]
pub fn mock_contract_request(
    client_id: Uuid,
    contract_number: &str,
    contract_value: f64,
    billing_frequency: BillingFrequency,
) -> CreateContractRequest {
    CreateContractRequest {
        client_id,
        contract_number: contract_number.to_string(),
        contract_name: format!("Cleaning services {contract_number}"),
        status: Some(ContractStatus::Active),
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
        end_date: None,
        billing_frequency,
        contract_value,
        auto_renew: true,
        notes: None,
        site_ids: Vec::new(),
    }
}

/// Populate a migrated database with a small, fixed data set.
///
/// Work order due dates are relative to today so exactly one open order is
/// overdue.
///
/// # Errors
/// Returns an error if any insert fails
pub async fn seed_test_data(db: &ErpDatabase) -> Result<SeedData> {
    let today = Utc::now().date_naive();

    let harbour_hotel = db.create_client(mock_client_request("Harbour Hotel")).await?.id;
    let metro_health = db.create_client(mock_client_request("Metro Health")).await?.id;
    let old_mill = db
        .create_client(CreateClientRequest {
            status: Some(ClientStatus::Inactive),
            ..mock_client_request("Old Mill")
        })
        .await?
        .id;

    let lobby_site = db
        .create_site(CreateSiteRequest {
            latitude: Some(-33.8688),
            longitude: Some(151.2093),
            ..mock_site_request(harbour_hotel, "Lobby")
        })
        .await?
        .id;
    let conference_site = db
        .create_site(mock_site_request(harbour_hotel, "Conference Centre"))
        .await?
        .id;
    let clinic_site = db
        .create_site(CreateSiteRequest {
            latitude: Some(-37.8136),
            longitude: Some(144.9631),
            ..mock_site_request(metro_health, "Clinic")
        })
        .await?
        .id;

    let harbour_contract = db
        .create_contract(CreateContractRequest {
            site_ids: vec![lobby_site, conference_site],
            ..mock_contract_request(harbour_hotel, "C-1001", 4330.0, BillingFrequency::Monthly)
        })
        .await?
        .id;
    let metro_contract = db
        .create_contract(CreateContractRequest {
            site_ids: vec![clinic_site],
            ..mock_contract_request(metro_health, "C-1002", 500.0, BillingFrequency::Weekly)
        })
        .await?
        .id;
    let expired_contract = db
        .create_contract(CreateContractRequest {
            status: Some(ContractStatus::Expired),
            ..mock_contract_request(old_mill, "C-1003", 1300.0, BillingFrequency::Quarterly)
        })
        .await?
        .id;

    let alex = db
        .create_employee(CreateEmployeeRequest {
            first_name: "Alex".to_string(),
            last_name: "Brown".to_string(),
            hourly_rate: Some(34.0),
            ..Default::default()
        })
        .await?
        .id;
    let kim = db
        .create_employee(CreateEmployeeRequest {
            first_name: "Kim".to_string(),
            last_name: "Zhao".to_string(),
            employment_type: Some(EmploymentType::PartTime),
            ..Default::default()
        })
        .await?
        .id;

    let overdue_order = db
        .create_work_order(CreateWorkOrderRequest {
            site_id: lobby_site,
            contract_id: Some(harbour_contract),
            title: "Carpet steam clean".to_string(),
            priority: Some(WorkOrderPriority::High),
            status: Some(WorkOrderStatus::Scheduled),
            scheduled_date: Some(add_days(today, -5)?),
            due_date: Some(add_days(today, -2)?),
            estimated_hours: Some(6.0),
            assignee_ids: vec![alex],
            ..Default::default()
        })
        .await?
        .id;
    let upcoming_order = db
        .create_work_order(CreateWorkOrderRequest {
            site_id: clinic_site,
            contract_id: Some(metro_contract),
            title: "Window clean".to_string(),
            due_date: Some(add_days(today, 5)?),
            assignee_ids: vec![alex, kim],
            ..Default::default()
        })
        .await?
        .id;
    let completed_order = db
        .create_work_order(CreateWorkOrderRequest {
            site_id: lobby_site,
            title: "Deep clean".to_string(),
            due_date: Some(add_days(today, -10)?),
            ..Default::default()
        })
        .await?
        .id;
    db.update_work_order(UpdateWorkOrderRequest {
        id: completed_order,
        status: Some(WorkOrderStatus::Completed),
        actual_hours: Some(4.5),
        ..Default::default()
    })
    .await?;

    let bayside_lead = db
        .create_lead(CreateLeadRequest {
            company_name: "Bayside Gym".to_string(),
            source: Some("referral".to_string()),
            estimated_value: Some(1299.0),
            ..Default::default()
        })
        .await?
        .id;
    let hilltop_lead = db
        .create_lead(CreateLeadRequest {
            company_name: "Hilltop School".to_string(),
            status: Some(LeadStatus::Qualified),
            ..Default::default()
        })
        .await?
        .id;

    let sent_quote = db
        .create_quote(CreateQuoteRequest {
            quote_number: "Q-2001".to_string(),
            lead_id: Some(bayside_lead),
            client_id: None,
            title: "Gym floor care".to_string(),
            status: Some(QuoteStatus::Sent),
            amount: 800.0,
            billing_frequency: BillingFrequency::Fortnightly,
            issue_date: today,
            valid_until: Some(add_days(today, 30)?),
            notes: None,
        })
        .await?
        .id;
    let accepted_quote = db
        .create_quote(CreateQuoteRequest {
            quote_number: "Q-2002".to_string(),
            lead_id: None,
            client_id: Some(metro_health),
            title: "Clinic extension".to_string(),
            status: Some(QuoteStatus::Accepted),
            amount: 2000.0,
            billing_frequency: BillingFrequency::Monthly,
            issue_date: today,
            valid_until: None,
            notes: None,
        })
        .await?
        .id;

    Ok(SeedData {
        harbour_hotel,
        metro_health,
        old_mill,
        lobby_site,
        conference_site,
        clinic_site,
        harbour_contract,
        metro_contract,
        expired_contract,
        alex,
        kim,
        overdue_order,
        upcoming_order,
        completed_order,
        bayside_lead,
        hilltop_lead,
        sent_quote,
        accepted_quote,
    })
}
