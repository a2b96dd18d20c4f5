//! Database module - storage, schema and per-entity operations

mod clients;
mod contracts;
mod core;
mod dashboard;
pub mod date_utils;
mod employees;
mod leads;
pub mod mappers;
pub mod query_builders;
mod quotes;
mod records;
pub mod schema;
mod sites;
pub mod validators;
mod work_orders;

pub use core::*;

pub use clients::CLIENTS;
pub use contracts::CONTRACTS;
pub use employees::EMPLOYEES;
pub use leads::{DEFAULT_LEAD_FREQUENCY, LEADS};
pub use quotes::QUOTES;
pub use records::check_record;
pub use sites::SITES;
pub use work_orders::WORK_ORDERS;

pub use date_utils::{
    add_days, format_date_for_display, format_iso_date, format_iso_timestamp, parse_iso_date,
    parse_iso_timestamp, validate_date_range, DateConversionError, DateValidationError,
};
pub use query_builders::{SqlValue, TableSpec, UpdateBuilder};
pub use schema::{SCHEMA_VERSION, TABLES};
