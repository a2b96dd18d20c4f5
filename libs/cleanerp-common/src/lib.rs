//! CleanERP Common - Shared utilities and constants
//!
//! This crate provides the helpers used by both the core library and the CLI:
//! identifier case conversion, date parsing and display formatting.
//!
//! # Examples
//!
//! ```
//! use cleanerp_common::{to_camel_case, to_snake_case, format_currency, DEFAULT_PAGE_SIZE};
//!
//! assert_eq!(to_snake_case("siteName"), "site_name");
//! assert_eq!(to_camel_case("site_name"), "siteName");
//! assert_eq!(format_currency(2165.0), "$2,165.00");
//! assert_eq!(DEFAULT_PAGE_SIZE, 25);
//! ```

pub mod constants;
pub mod utils;

pub use constants::*;
pub use utils::*;
