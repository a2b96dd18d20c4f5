//! CleanERP Core - back-office library for contract-cleaning businesses
//!
//! This library keeps clients, their sites, contracts, work orders, staff and
//! the sales pipeline (leads and quotes) in a SQLite database, and converts
//! prices between billing frequencies.
//!
//! # Features
//!
//! - **Async Database Access**: Built on SQLx with a configurable connection pool
//! - **Validated Requests**: Create/update requests are checked before they reach SQL
//! - **Billing Conversion**: Weekly, fortnightly, monthly, quarterly and annual equivalents
//! - **Paged Lists**: Whitelisted sort, search and filter on every entity
//! - **Export Support**: JSON and CSV with camelCase or snake_case keys
//!
//! # Quick Start
//!
//! ```no_run
//! use cleanerp_core::{CreateClientRequest, ErpDatabase, ListQuery, CleanErpError};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), CleanErpError> {
//! let db = ErpDatabase::new(Path::new("/var/lib/cleanerp/cleanerp.sqlite")).await?;
//! db.migrate().await?;
//!
//! let client = db
//!     .create_client(CreateClientRequest {
//!         company_name: "Harbour Hotel".to_string(),
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("Created {}", client.id);
//!
//! let page = db.list_clients(&ListQuery::new().search("harbour")).await?;
//! println!("{} matching clients", page.total);
//! # Ok(())
//! # }
//! ```
//!
//! # Crate Features
//!
//! - `export-csv` (default): CSV export
//! - `test-utils`: seeded fixtures for tests

pub mod billing;
pub mod config;
pub mod config_loader;
pub mod database;
pub mod error;
pub mod export;
pub mod mapping;
pub mod models;
pub mod query;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use billing::{
    calculate_all_billing_frequencies, convert_billing_amount, round_to_cents, BillingAmounts,
    BillingFrequency, ROUND_TRIP_TOLERANCE,
};
pub use config::{ErpConfig, LoggingConfig, PoolSettings};
pub use config_loader::{load_config, load_config_with_paths, ConfigLoader};
pub use database::{DatabasePoolConfig, ErpDatabase, HealthStatus, SqliteSettings};
pub use error::{CleanErpError, ErrorCategory, FieldIssue, Result};
pub use export::{DataExporter, DataImporter, ExportFormat, ImportSummary, KeyStyle};
pub use mapping::{map_from_db, map_to_db, prepare_for_db, to_db_record};
pub use models::*;
pub use query::{ListQuery, Page, SortDirection, SortSpec};
pub use validation::validate_request;

/// Re-export commonly used types
pub use chrono::{DateTime, NaiveDate, Utc};
pub use serde::{Deserialize, Serialize};
pub use uuid::Uuid;
