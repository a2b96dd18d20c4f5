//! Error types for the CleanERP core library

use serde::Serialize;
use thiserror::Error;

/// Result type alias for CleanERP operations
pub type Result<T> = std::result::Result<T, CleanErpError>;

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    /// Field path, e.g. `contactEmail` or `__all__` for struct-level checks
    pub field: String,
    /// Machine-readable code (`length`, `email`, `range`, ...)
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl std::fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Coarse classification used when surfacing errors to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCategory {
    Timeout,
    PermissionDenied,
    NotFound,
    Validation,
    Other,
}

/// Main error type for CleanERP operations
#[derive(Error, Debug)]
pub enum CleanErpError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid UUID: {uuid}")]
    InvalidUuid { uuid: String },

    #[error("Invalid date: {date}")]
    InvalidDate { date: String },

    #[error("Invalid billing frequency: {value}")]
    InvalidFrequency { value: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid fields: {}", format_issues(.issues))]
    InvalidFields { issues: Vec<FieldIssue> },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Unknown error: {message}")]
    Unknown { message: String },

    /// Failure of one record in a batch; `index` is 1-based
    #[error("Record {index}: {source}")]
    InRecord {
        index: usize,
        #[source]
        source: Box<CleanErpError>,
    },
}

fn format_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl CleanErpError {
    /// Create a database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    /// Create a not-found error for the named entity
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an unknown error
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    /// Attach the 1-based position of the record that failed
    #[must_use]
    pub fn in_record(self, index: usize) -> Self {
        Self::InRecord {
            index,
            source: Box::new(self),
        }
    }

    /// Classify the error.
    ///
    /// Driver errors only carry text, so timeouts and permission problems are
    /// recognised by substring.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Validation { .. }
            | Self::InvalidFields { .. }
            | Self::InvalidUuid { .. }
            | Self::InvalidDate { .. }
            | Self::InvalidFrequency { .. } => ErrorCategory::Validation,
            Self::Database(message) | Self::Unknown { message } => classify_message(message),
            Self::Io(e) => match e.kind() {
                std::io::ErrorKind::TimedOut => ErrorCategory::Timeout,
                std::io::ErrorKind::PermissionDenied => ErrorCategory::PermissionDenied,
                std::io::ErrorKind::NotFound => ErrorCategory::NotFound,
                _ => ErrorCategory::Other,
            },
            Self::Serialization(_) | Self::Configuration { .. } => ErrorCategory::Other,
            Self::InRecord { source, .. } => source.category(),
        }
    }

    /// Short message suitable for a notification
    #[must_use]
    pub fn user_message(&self) -> String {
        match self.category() {
            ErrorCategory::Timeout => {
                "The database took too long to respond. Please try again.".to_string()
            }
            ErrorCategory::PermissionDenied => {
                "You do not have permission to perform this action.".to_string()
            }
            ErrorCategory::NotFound | ErrorCategory::Validation => self.to_string(),
            ErrorCategory::Other => format!("Failed to load data: {self}"),
        }
    }

    /// Field issues carried by an `InvalidFields` error
    #[must_use]
    pub fn issues(&self) -> &[FieldIssue] {
        match self {
            Self::InvalidFields { issues } => issues,
            Self::InRecord { source, .. } => source.issues(),
            _ => &[],
        }
    }
}

fn classify_message(message: &str) -> ErrorCategory {
    let lower = message.to_lowercase();
    if lower.contains("timeout") || lower.contains("timed out") {
        ErrorCategory::Timeout
    } else if lower.contains("permission denied")
        || lower.contains("not authorized")
        || lower.contains("readonly database")
    {
        ErrorCategory::PermissionDenied
    } else {
        ErrorCategory::Other
    }
}

impl From<sqlx::Error> for CleanErpError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut => Self::Database("connection pool timeout".to_string()),
            other => Self::Database(other.to_string()),
        }
    }
}
