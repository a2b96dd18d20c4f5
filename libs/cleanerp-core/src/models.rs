//! Data models for CleanERP entities
//!
//! Entities serialize with camelCase keys, the shape the front office works
//! with; the database layer stores the same fields in snake_case columns.
//! Request types carry the form-level constraints checked by
//! [`crate::validation::validate_request`].

use crate::billing::{calculate_all_billing_frequencies, BillingAmounts, BillingFrequency};
use crate::error::CleanErpError;
use crate::validation::{
    validate_contract_dates, validate_phone, validate_postcode, validate_quote_request,
    validate_work_order_dates,
};
use chrono::{DateTime, NaiveDate, Utc};
use cleanerp_common::to_storage_code;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// An enum persisted as a fixed text code
pub trait StoredCode: FromStr<Err = CleanErpError> + Copy {
    /// The code written to the database
    fn code(self) -> &'static str;
}

impl StoredCode for BillingFrequency {
    fn code(self) -> &'static str {
        self.as_str()
    }
}

/// Declares a status enum stored as a snake_case string and displayed as a label
macro_rules! status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => ($db:literal, $label:literal)),+ $(,)?
        }
        default = $default:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $db)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant in declaration order
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Storage and wire name
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $db,)+
                }
            }

            /// Human-readable label
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl StoredCode for $name {
            fn code(self) -> &'static str {
                self.as_str()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = CleanErpError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = to_storage_code(s);
                Self::ALL
                    .iter()
                    .copied()
                    .find(|variant| variant.as_str() == normalized)
                    .ok_or_else(|| {
                        CleanErpError::validation(format!(
                            "Invalid {}: {s}",
                            stringify!($name)
                        ))
                    })
            }
        }
    };
}

status_enum! {
    /// Client account status
    ClientStatus {
        Active => ("active", "Active"),
        Inactive => ("inactive", "Inactive"),
        OnHold => ("on_hold", "On Hold"),
    }
    default = Active
}

status_enum! {
    /// Site service status
    SiteStatus {
        Active => ("active", "Active"),
        Inactive => ("inactive", "Inactive"),
        PendingLaunch => ("pending_launch", "Pending Launch"),
        Suspended => ("suspended", "Suspended"),
    }
    default = Active
}

status_enum! {
    /// Contract status
    ContractStatus {
        Draft => ("draft", "Draft"),
        Active => ("active", "Active"),
        OnHold => ("on_hold", "On Hold"),
        Expired => ("expired", "Expired"),
        Terminated => ("terminated", "Terminated"),
    }
    default = Draft
}

status_enum! {
    /// Work order status
    WorkOrderStatus {
        Draft => ("draft", "Draft"),
        Scheduled => ("scheduled", "Scheduled"),
        InProgress => ("in_progress", "In Progress"),
        Completed => ("completed", "Completed"),
        Cancelled => ("cancelled", "Cancelled"),
        OnHold => ("on_hold", "On Hold"),
    }
    default = Draft
}

status_enum! {
    /// Work order priority
    WorkOrderPriority {
        Low => ("low", "Low"),
        Medium => ("medium", "Medium"),
        High => ("high", "High"),
        Urgent => ("urgent", "Urgent"),
    }
    default = Medium
}

status_enum! {
    /// Employee status
    EmployeeStatus {
        Active => ("active", "Active"),
        OnLeave => ("on_leave", "On Leave"),
        Terminated => ("terminated", "Terminated"),
    }
    default = Active
}

status_enum! {
    /// Employment arrangement
    EmploymentType {
        FullTime => ("full_time", "Full Time"),
        PartTime => ("part_time", "Part Time"),
        Casual => ("casual", "Casual"),
        Contractor => ("contractor", "Contractor"),
    }
    default = FullTime
}

status_enum! {
    /// Sales pipeline stage of a lead
    LeadStatus {
        New => ("new", "New"),
        Contacted => ("contacted", "Contacted"),
        Qualified => ("qualified", "Qualified"),
        ProposalSent => ("proposal_sent", "Proposal Sent"),
        Won => ("won", "Won"),
        Lost => ("lost", "Lost"),
    }
    default = New
}

status_enum! {
    /// Quote status
    QuoteStatus {
        Draft => ("draft", "Draft"),
        Sent => ("sent", "Sent"),
        Accepted => ("accepted", "Accepted"),
        Rejected => ("rejected", "Rejected"),
        Expired => ("expired", "Expired"),
    }
    default = Draft
}

impl WorkOrderStatus {
    /// Whether work is still outstanding
    #[must_use]
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl LeadStatus {
    /// Whether the lead is still being worked
    #[must_use]
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Won | Self::Lost)
    }
}

impl QuoteStatus {
    /// Whether the quote still counts towards the pipeline
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Draft | Self::Sent)
    }
}

// ---------------------------------------------------------------------------
// Clients
// ---------------------------------------------------------------------------

/// A customer organisation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub company_name: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub billing_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub status: ClientStatus,
    /// Days allowed for invoice payment
    pub payment_terms_days: Option<i64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client creation request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRequest {
    #[validate(length(min = 1, max = 200, message = "Company name is required"))]
    pub company_name: String,
    #[validate(length(max = 100))]
    pub contact_name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub contact_email: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub contact_phone: Option<String>,
    #[validate(length(max = 255))]
    pub billing_address: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 50))]
    pub state: Option<String>,
    #[validate(custom(function = "validate_postcode"))]
    pub postcode: Option<String>,
    #[serde(default)]
    pub status: Option<ClientStatus>,
    #[validate(range(min = 0, max = 120))]
    pub payment_terms_days: Option<i64>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Client update request; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClientRequest {
    #[serde(default)]
    pub id: Uuid,
    #[validate(length(min = 1, max = 200, message = "Company name is required"))]
    pub company_name: Option<String>,
    #[validate(length(max = 100))]
    pub contact_name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub contact_email: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub contact_phone: Option<String>,
    #[validate(length(max = 255))]
    pub billing_address: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 50))]
    pub state: Option<String>,
    #[validate(custom(function = "validate_postcode"))]
    pub postcode: Option<String>,
    pub status: Option<ClientStatus>,
    #[validate(range(min = 0, max = 120))]
    pub payment_terms_days: Option<i64>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Sites
// ---------------------------------------------------------------------------

/// A physical location serviced for a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: Uuid,
    pub client_id: Uuid,
    pub site_name: String,
    pub address: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub status: SiteStatus,
    pub site_type: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub special_instructions: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub square_meters: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Site {
    /// Coordinates when both are known
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// Site creation request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSiteRequest {
    pub client_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "Site name is required"))]
    pub site_name: String,
    #[validate(length(min = 1, max = 255, message = "Address is required"))]
    pub address: String,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 50))]
    pub state: Option<String>,
    #[validate(custom(function = "validate_postcode"))]
    pub postcode: Option<String>,
    #[serde(default)]
    pub status: Option<SiteStatus>,
    #[validate(length(max = 100))]
    pub site_type: Option<String>,
    #[validate(length(max = 100))]
    pub contact_name: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub contact_phone: Option<String>,
    #[validate(length(max = 2000))]
    pub special_instructions: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[validate(range(min = 0.0))]
    pub square_meters: Option<f64>,
}

/// Site update request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSiteRequest {
    #[serde(default)]
    pub id: Uuid,
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "Site name is required"))]
    pub site_name: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Address is required"))]
    pub address: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 50))]
    pub state: Option<String>,
    #[validate(custom(function = "validate_postcode"))]
    pub postcode: Option<String>,
    pub status: Option<SiteStatus>,
    #[validate(length(max = 100))]
    pub site_type: Option<String>,
    #[validate(length(max = 100))]
    pub contact_name: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub contact_phone: Option<String>,
    #[validate(length(max = 2000))]
    pub special_instructions: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[validate(range(min = 0.0))]
    pub square_meters: Option<f64>,
}

/// A site positioned on the map view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteMarker {
    pub site_id: Uuid,
    pub client_id: Uuid,
    pub site_name: String,
    pub client_name: String,
    pub address: String,
    pub status: SiteStatus,
    pub latitude: f64,
    pub longitude: f64,
}

// ---------------------------------------------------------------------------
// Contracts
// ---------------------------------------------------------------------------

/// A billing agreement with a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: Uuid,
    pub client_id: Uuid,
    pub contract_number: String,
    pub contract_name: String,
    pub status: ContractStatus,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub billing_frequency: BillingFrequency,
    /// Amount billed each `billing_frequency` cycle
    pub contract_value: f64,
    pub auto_renew: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    /// Weekly, monthly and annual equivalents of the contract value
    #[must_use]
    pub fn billing_breakdown(&self) -> BillingAmounts {
        calculate_all_billing_frequencies(self.contract_value, self.billing_frequency)
    }
}

/// Contract creation request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_contract_dates"))]
pub struct CreateContractRequest {
    pub client_id: Uuid,
    #[validate(length(min = 1, max = 50, message = "Contract number is required"))]
    pub contract_number: String,
    #[validate(length(min = 1, max = 200, message = "Contract name is required"))]
    pub contract_name: String,
    #[serde(default)]
    pub status: Option<ContractStatus>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub billing_frequency: BillingFrequency,
    #[validate(range(min = 0.0, message = "Contract value cannot be negative"))]
    pub contract_value: f64,
    #[serde(default)]
    pub auto_renew: bool,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    /// Sites covered from the start
    #[serde(default)]
    pub site_ids: Vec<Uuid>,
}

/// Contract update request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContractRequest {
    #[serde(default)]
    pub id: Uuid,
    #[validate(length(min = 1, max = 50, message = "Contract number is required"))]
    pub contract_number: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Contract name is required"))]
    pub contract_name: Option<String>,
    pub status: Option<ContractStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub billing_frequency: Option<BillingFrequency>,
    #[validate(range(min = 0.0, message = "Contract value cannot be negative"))]
    pub contract_value: Option<f64>,
    pub auto_renew: Option<bool>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Work orders
// ---------------------------------------------------------------------------

/// A scheduled cleaning job at a site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: Uuid,
    pub site_id: Uuid,
    pub contract_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub priority: WorkOrderPriority,
    pub status: WorkOrderStatus,
    pub scheduled_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub completed_date: Option<NaiveDate>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub estimated_cost: Option<f64>,
    pub actual_cost: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkOrder {
    /// Open and past its due date
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status.is_open() && self.due_date.is_some_and(|due| due < today)
    }
}

/// Work order creation request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_work_order_dates"))]
pub struct CreateWorkOrderRequest {
    pub site_id: Uuid,
    pub contract_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<WorkOrderPriority>,
    #[serde(default)]
    pub status: Option<WorkOrderStatus>,
    pub scheduled_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    #[validate(range(min = 0.0, max = 1000.0))]
    pub estimated_hours: Option<f64>,
    #[validate(range(min = 0.0))]
    pub estimated_cost: Option<f64>,
    /// Employees assigned on creation
    #[serde(default)]
    pub assignee_ids: Vec<Uuid>,
}

/// Work order update request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkOrderRequest {
    #[serde(default)]
    pub id: Uuid,
    pub contract_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub priority: Option<WorkOrderPriority>,
    pub status: Option<WorkOrderStatus>,
    pub scheduled_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub completed_date: Option<NaiveDate>,
    #[validate(range(min = 0.0, max = 1000.0))]
    pub estimated_hours: Option<f64>,
    #[validate(range(min = 0.0, max = 1000.0))]
    pub actual_hours: Option<f64>,
    #[validate(range(min = 0.0))]
    pub estimated_cost: Option<f64>,
    #[validate(range(min = 0.0))]
    pub actual_cost: Option<f64>,
}

/// An employee assigned to a work order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderAssignment {
    pub work_order_id: Uuid,
    pub employee_id: Uuid,
    pub assigned_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Employees
// ---------------------------------------------------------------------------

/// A staff member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub employment_type: EmploymentType,
    pub status: EmployeeStatus,
    pub start_date: Option<NaiveDate>,
    pub hourly_rate: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Employee creation request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeRequest {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    #[validate(length(max = 100))]
    pub job_title: Option<String>,
    #[validate(length(max = 100))]
    pub department: Option<String>,
    #[serde(default)]
    pub employment_type: Option<EmploymentType>,
    #[serde(default)]
    pub status: Option<EmployeeStatus>,
    pub start_date: Option<NaiveDate>,
    #[validate(range(min = 0.0, max = 1000.0))]
    pub hourly_rate: Option<f64>,
}

/// Employee update request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeeRequest {
    #[serde(default)]
    pub id: Uuid,
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    #[validate(length(max = 100))]
    pub job_title: Option<String>,
    #[validate(length(max = 100))]
    pub department: Option<String>,
    pub employment_type: Option<EmploymentType>,
    pub status: Option<EmployeeStatus>,
    pub start_date: Option<NaiveDate>,
    #[validate(range(min = 0.0, max = 1000.0))]
    pub hourly_rate: Option<f64>,
}

// ---------------------------------------------------------------------------
// Leads
// ---------------------------------------------------------------------------

/// A prospective customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    pub company_name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: Option<String>,
    pub status: LeadStatus,
    pub estimated_value: Option<f64>,
    pub estimated_frequency: BillingFrequency,
    pub next_follow_up: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// Equivalents of the estimated value, all zero when unknown
    #[must_use]
    pub fn estimated_breakdown(&self) -> BillingAmounts {
        calculate_all_billing_frequencies(
            self.estimated_value.unwrap_or_default(),
            self.estimated_frequency,
        )
    }
}

/// Lead creation request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadRequest {
    #[validate(length(min = 1, max = 200, message = "Company name is required"))]
    pub company_name: String,
    #[validate(length(max = 100))]
    pub contact_name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    #[validate(length(max = 100))]
    pub source: Option<String>,
    #[serde(default)]
    pub status: Option<LeadStatus>,
    #[validate(range(min = 0.0))]
    pub estimated_value: Option<f64>,
    pub estimated_frequency: Option<BillingFrequency>,
    pub next_follow_up: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Lead update request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadRequest {
    #[serde(default)]
    pub id: Uuid,
    #[validate(length(min = 1, max = 200, message = "Company name is required"))]
    pub company_name: Option<String>,
    #[validate(length(max = 100))]
    pub contact_name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    #[validate(length(max = 100))]
    pub source: Option<String>,
    pub status: Option<LeadStatus>,
    #[validate(range(min = 0.0))]
    pub estimated_value: Option<f64>,
    pub estimated_frequency: Option<BillingFrequency>,
    pub next_follow_up: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Quotes
// ---------------------------------------------------------------------------

/// A priced proposal to a lead or client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: Uuid,
    pub quote_number: String,
    pub lead_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub title: String,
    pub status: QuoteStatus,
    pub amount: f64,
    pub billing_frequency: BillingFrequency,
    pub issue_date: NaiveDate,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Quote {
    /// Weekly, monthly and annual equivalents of the quoted amount
    #[must_use]
    pub fn billing_breakdown(&self) -> BillingAmounts {
        calculate_all_billing_frequencies(self.amount, self.billing_frequency)
    }
}

/// Quote creation request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_quote_request"))]
pub struct CreateQuoteRequest {
    #[validate(length(min = 1, max = 50, message = "Quote number is required"))]
    pub quote_number: String,
    pub lead_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    pub status: Option<QuoteStatus>,
    #[validate(range(min = 0.0, message = "Amount cannot be negative"))]
    pub amount: f64,
    pub billing_frequency: BillingFrequency,
    pub issue_date: NaiveDate,
    pub valid_until: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Quote update request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuoteRequest {
    #[serde(default)]
    pub id: Uuid,
    pub lead_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: Option<String>,
    pub status: Option<QuoteStatus>,
    #[validate(range(min = 0.0, message = "Amount cannot be negative"))]
    pub amount: Option<f64>,
    pub billing_frequency: Option<BillingFrequency>,
    pub issue_date: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Entity kinds
// ---------------------------------------------------------------------------

/// The record types kept in the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Clients,
    Sites,
    Contracts,
    WorkOrders,
    Employees,
    Leads,
    Quotes,
}

impl EntityKind {
    pub const ALL: [Self; 7] = [
        Self::Clients,
        Self::Sites,
        Self::Contracts,
        Self::WorkOrders,
        Self::Employees,
        Self::Leads,
        Self::Quotes,
    ];

    /// Table name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clients => "clients",
            Self::Sites => "sites",
            Self::Contracts => "contracts",
            Self::WorkOrders => "work_orders",
            Self::Employees => "employees",
            Self::Leads => "leads",
            Self::Quotes => "quotes",
        }
    }

    /// Singular name used in messages
    #[must_use]
    pub const fn entity_name(self) -> &'static str {
        match self {
            Self::Clients => "Client",
            Self::Sites => "Site",
            Self::Contracts => "Contract",
            Self::WorkOrders => "Work order",
            Self::Employees => "Employee",
            Self::Leads => "Lead",
            Self::Quotes => "Quote",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = CleanErpError;

    /// Accepts singular or plural names, e.g. `client`, `work-orders`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = to_storage_code(s);
        let plural = if normalized.ends_with('s') {
            normalized
        } else {
            format!("{normalized}s")
        };
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == plural)
            .ok_or_else(|| CleanErpError::validation(format!("Unknown entity: {s}")))
    }
}

// ---------------------------------------------------------------------------
// Read models
// ---------------------------------------------------------------------------

/// Row counts per table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStats {
    pub client_count: u64,
    pub site_count: u64,
    pub contract_count: u64,
    pub work_order_count: u64,
    pub employee_count: u64,
    pub lead_count: u64,
    pub quote_count: u64,
}

impl DatabaseStats {
    #[must_use]
    pub fn total_records(&self) -> u64 {
        self.client_count
            + self.site_count
            + self.contract_count
            + self.work_order_count
            + self.employee_count
            + self.lead_count
            + self.quote_count
    }
}

/// Count of rows sharing a status value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
}

/// Figures shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub stats: DatabaseStats,
    pub active_clients: u64,
    pub sites_by_status: Vec<StatusCount>,
    pub active_contracts: u64,
    /// Recurring revenue of active contracts
    pub contract_revenue: BillingAmounts,
    pub open_work_orders: u64,
    pub overdue_work_orders: u64,
    pub active_employees: u64,
    pub leads_by_status: Vec<StatusCount>,
    /// Recurring value of draft and sent quotes
    pub quote_pipeline: BillingAmounts,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_status_parse_label_and_db_forms() {
        assert_eq!(
            "Pending Launch".parse::<SiteStatus>().unwrap(),
            SiteStatus::PendingLaunch
        );
        assert_eq!(
            "pending_launch".parse::<SiteStatus>().unwrap(),
            SiteStatus::PendingLaunch
        );
        assert_eq!(
            "SUSPENDED".parse::<SiteStatus>().unwrap(),
            SiteStatus::Suspended
        );
        assert!("closed".parse::<SiteStatus>().is_err());
    }

    #[test]
    fn test_status_serde_uses_db_names() {
        let json = serde_json::to_string(&WorkOrderStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let parsed: EmploymentType = serde_json::from_str("\"part_time\"").unwrap();
        assert_eq!(parsed, EmploymentType::PartTime);
    }

    #[test]
    fn test_status_display_uses_label() {
        assert_eq!(SiteStatus::PendingLaunch.to_string(), "Pending Launch");
        assert_eq!(LeadStatus::ProposalSent.to_string(), "Proposal Sent");
        assert_eq!(ClientStatus::OnHold.as_str(), "on_hold");
    }

    #[test]
    fn test_status_defaults() {
        assert_eq!(ClientStatus::default(), ClientStatus::Active);
        assert_eq!(ContractStatus::default(), ContractStatus::Draft);
        assert_eq!(WorkOrderPriority::default(), WorkOrderPriority::Medium);
        assert_eq!(LeadStatus::default(), LeadStatus::New);
    }

    #[test]
    fn test_all_variants_round_trip_through_as_str() {
        for status in SiteStatus::ALL {
            assert_eq!(status.as_str().parse::<SiteStatus>().unwrap(), *status);
        }
        for status in WorkOrderStatus::ALL {
            assert_eq!(status.label().parse::<WorkOrderStatus>().unwrap(), *status);
        }
    }

    #[test]
    fn test_open_statuses() {
        assert!(WorkOrderStatus::Scheduled.is_open());
        assert!(!WorkOrderStatus::Completed.is_open());
        assert!(!WorkOrderStatus::Cancelled.is_open());
        assert!(LeadStatus::Qualified.is_open());
        assert!(!LeadStatus::Won.is_open());
        assert!(QuoteStatus::Sent.is_open());
        assert!(!QuoteStatus::Accepted.is_open());
    }

    #[test]
    fn test_contract_billing_breakdown() {
        let now = Utc::now();
        let contract = Contract {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            contract_number: "C-001".to_string(),
            contract_name: "Office clean".to_string(),
            status: ContractStatus::Active,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: None,
            billing_frequency: BillingFrequency::Weekly,
            contract_value: 500.0,
            auto_renew: true,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        let amounts = contract.billing_breakdown();
        assert_eq!(amounts.monthly, 2165.0);
        assert_eq!(amounts.annually, 26000.0);
    }

    #[test]
    fn test_work_order_overdue() {
        let now = Utc::now();
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let mut order = WorkOrder {
            id: Uuid::new_v4(),
            site_id: Uuid::new_v4(),
            contract_id: None,
            title: "Window clean".to_string(),
            description: None,
            priority: WorkOrderPriority::High,
            status: WorkOrderStatus::Scheduled,
            scheduled_date: None,
            due_date: NaiveDate::from_ymd_opt(2024, 6, 14),
            completed_date: None,
            estimated_hours: None,
            actual_hours: None,
            estimated_cost: None,
            actual_cost: None,
            created_at: now,
            updated_at: now,
        };
        assert!(order.is_overdue(today));

        order.status = WorkOrderStatus::Completed;
        assert!(!order.is_overdue(today));

        order.status = WorkOrderStatus::Scheduled;
        order.due_date = Some(today);
        assert!(!order.is_overdue(today));
    }

    #[test]
    fn test_client_serializes_camel_case() {
        let now = Utc::now();
        let client = Client {
            id: Uuid::nil(),
            company_name: "Acme".to_string(),
            contact_name: None,
            contact_email: Some("ops@acme.test".to_string()),
            contact_phone: None,
            billing_address: None,
            city: None,
            state: None,
            postcode: None,
            status: ClientStatus::Active,
            payment_terms_days: Some(30),
            notes: None,
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&client).unwrap();
        assert_eq!(value["companyName"], "Acme");
        assert_eq!(value["contactEmail"], "ops@acme.test");
        assert_eq!(value["paymentTermsDays"], 30);
        assert_eq!(value["status"], "active");
    }

    #[test]
    fn test_database_stats_total() {
        let stats = DatabaseStats {
            client_count: 1,
            site_count: 2,
            contract_count: 3,
            work_order_count: 4,
            employee_count: 5,
            lead_count: 6,
            quote_count: 7,
        };
        assert_eq!(stats.total_records(), 28);
    }

    #[test]
    fn test_entity_kind_parsing() {
        assert_eq!("client".parse::<EntityKind>().unwrap(), EntityKind::Clients);
        assert_eq!(
            "Work-Orders".parse::<EntityKind>().unwrap(),
            EntityKind::WorkOrders
        );
        assert_eq!("work order".parse::<EntityKind>().unwrap(), EntityKind::WorkOrders);
        assert_eq!("quotes".parse::<EntityKind>().unwrap(), EntityKind::Quotes);
        assert!("invoices".parse::<EntityKind>().is_err());
        assert_eq!(EntityKind::WorkOrders.entity_name(), "Work order");
    }
}
