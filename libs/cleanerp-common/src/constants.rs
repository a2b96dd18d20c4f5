//! Constants shared across CleanERP crates

/// Default database filename
pub const DATABASE_FILENAME: &str = "cleanerp.sqlite";

/// Directory (under the user data dir) holding the database
pub const DATA_DIR: &str = "cleanerp";

/// Default number of rows per list page
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Largest page a caller may request
pub const MAX_PAGE_SIZE: u32 = 100;

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "CLEANERP_";

/// Supported date formats, tried in order when parsing user input
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

/// Supported datetime formats
pub const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S UTC",
];
