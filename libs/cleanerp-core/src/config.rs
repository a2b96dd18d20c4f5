//! Configuration for CleanERP
//!
//! Every source (file, environment) is read as a JSON overlay and deep-merged
//! into the current configuration, so a source only changes the keys it names.

use crate::database::{DatabasePoolConfig, SqliteSettings};
use crate::error::{CleanErpError, Result};
use cleanerp_common::{get_default_database_path, DEFAULT_PAGE_SIZE, ENV_PREFIX, MAX_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const JOURNAL_MODES: &[&str] = &["DELETE", "TRUNCATE", "PERSIST", "MEMORY", "WAL", "OFF"];

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErpConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    pub pool: PoolSettings,
    pub logging: LoggingConfig,
    /// Page size used when a list request doesn't ask for one
    pub default_page_size: u32,
}

/// Connection pool settings in config-file units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub busy_timeout_ms: u64,
    pub journal_mode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn` or `error`
    pub level: String,
    /// Emit JSON lines instead of plain text
    pub json: bool,
}

impl Default for ErpConfig {
    fn default() -> Self {
        Self {
            database_path: get_default_database_path(),
            pool: PoolSettings::default(),
            logging: LoggingConfig::default(),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        let pool = DatabasePoolConfig::default();
        Self {
            max_connections: pool.max_connections,
            min_connections: pool.min_connections,
            connect_timeout_secs: pool.connect_timeout.as_secs(),
            busy_timeout_ms: u64::try_from(pool.sqlite.busy_timeout.as_millis())
                .unwrap_or(u64::MAX),
            journal_mode: pool.sqlite.journal_mode,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl ErpConfig {
    /// Defaults with a custom database path
    #[must_use]
    pub fn with_database_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            database_path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Defaults overlaid with a JSON or YAML file (chosen by extension)
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::default();
        config.merge_with(&Self::read_overlay(path)?)?;
        Ok(config)
    }

    /// Defaults overlaid with `CLEANERP_*` environment variables
    ///
    /// # Errors
    /// Returns an error if a variable holds a value of the wrong type
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.merge_with(&Self::env_overlay()?)?;
        Ok(config)
    }

    /// Parse a config file into an overlay without applying defaults
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn read_overlay<P: AsRef<Path>>(path: P) -> Result<Value> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CleanErpError::Io(std::io::Error::other(format!(
                "Failed to read config file {}: {e}",
                path.display()
            )))
        })?;

        if is_yaml(path) {
            serde_yaml::from_str(&content).map_err(|e| {
                CleanErpError::configuration(format!("Failed to parse YAML config: {e}"))
            })
        } else {
            serde_json::from_str(&content).map_err(|e| {
                CleanErpError::configuration(format!("Failed to parse JSON config: {e}"))
            })
        }
    }

    /// Overlay built from the environment.
    ///
    /// Recognised variables (all prefixed `CLEANERP_`): `DATABASE_PATH`,
    /// `MAX_CONNECTIONS`, `MIN_CONNECTIONS`, `CONNECT_TIMEOUT_SECS`,
    /// `BUSY_TIMEOUT_MS`, `JOURNAL_MODE`, `LOG_LEVEL`, `LOG_JSON`, `PAGE_SIZE`.
    ///
    /// # Errors
    /// Returns an error if a numeric or boolean variable cannot be parsed
    pub fn env_overlay() -> Result<Value> {
        let mut root = Map::new();
        let mut pool = Map::new();
        let mut logging = Map::new();

        if let Some(path) = env_var("DATABASE_PATH") {
            root.insert("database_path".into(), Value::String(path));
        }
        for (var, key) in [
            ("MAX_CONNECTIONS", "max_connections"),
            ("MIN_CONNECTIONS", "min_connections"),
            ("CONNECT_TIMEOUT_SECS", "connect_timeout_secs"),
            ("BUSY_TIMEOUT_MS", "busy_timeout_ms"),
        ] {
            if let Some(value) = env_var(var) {
                pool.insert(key.into(), Value::from(parse_number(var, &value)?));
            }
        }
        if let Some(mode) = env_var("JOURNAL_MODE") {
            pool.insert("journal_mode".into(), Value::String(mode));
        }
        if let Some(level) = env_var("LOG_LEVEL") {
            logging.insert("level".into(), Value::String(level.to_lowercase()));
        }
        if let Some(json) = env_var("LOG_JSON") {
            logging.insert("json".into(), Value::Bool(parse_bool("LOG_JSON", &json)?));
        }
        if let Some(size) = env_var("PAGE_SIZE") {
            root.insert(
                "default_page_size".into(),
                Value::from(parse_number("PAGE_SIZE", &size)?),
            );
        }

        if !pool.is_empty() {
            root.insert("pool".into(), Value::Object(pool));
        }
        if !logging.is_empty() {
            root.insert("logging".into(), Value::Object(logging));
        }
        Ok(Value::Object(root))
    }

    /// Apply an overlay; keys it doesn't name keep their current values
    ///
    /// # Errors
    /// Returns an error if the merged document is not a valid configuration
    pub fn merge_with(&mut self, overlay: &Value) -> Result<()> {
        let mut merged = serde_json::to_value(&*self)?;
        deep_merge(&mut merged, overlay);
        *self = serde_json::from_value(merged)
            .map_err(|e| CleanErpError::configuration(format!("Invalid configuration: {e}")))?;
        Ok(())
    }

    /// Save as JSON or YAML
    ///
    /// # Errors
    /// Returns an error for an unknown format or if the file cannot be written
    pub fn to_file<P: AsRef<Path>>(&self, path: P, format: &str) -> Result<()> {
        let path = path.as_ref();
        let content = match format {
            "yaml" | "yml" => serde_yaml::to_string(self).map_err(|e| {
                CleanErpError::configuration(format!("Failed to serialize YAML: {e}"))
            })?,
            "json" => serde_json::to_string_pretty(self)?,
            _ => {
                return Err(CleanErpError::configuration(format!(
                    "Unsupported format: {format}"
                )))
            }
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns a `Configuration` error naming the first invalid setting
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(CleanErpError::configuration("Database path cannot be empty"));
        }
        if self.pool.max_connections == 0 {
            return Err(CleanErpError::configuration(
                "Max connections must be greater than 0",
            ));
        }
        if self.pool.min_connections > self.pool.max_connections {
            return Err(CleanErpError::configuration(format!(
                "Min connections ({}) cannot exceed max connections ({})",
                self.pool.min_connections, self.pool.max_connections
            )));
        }
        if !JOURNAL_MODES.contains(&self.pool.journal_mode.to_uppercase().as_str()) {
            return Err(CleanErpError::configuration(format!(
                "Invalid journal mode: {}. Must be one of: {}",
                self.pool.journal_mode,
                JOURNAL_MODES.join(", ")
            )));
        }
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(CleanErpError::configuration(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }
        if self.default_page_size == 0 || self.default_page_size > MAX_PAGE_SIZE {
            return Err(CleanErpError::configuration(format!(
                "Default page size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(())
    }

    /// Pool settings for [`crate::ErpDatabase::new_with_config`]
    #[must_use]
    pub fn pool_config(&self) -> DatabasePoolConfig {
        let defaults = DatabasePoolConfig::default();
        DatabasePoolConfig {
            max_connections: self.pool.max_connections,
            min_connections: self.pool.min_connections,
            connect_timeout: Duration::from_secs(self.pool.connect_timeout_secs),
            sqlite: SqliteSettings {
                journal_mode: self.pool.journal_mode.to_uppercase(),
                busy_timeout: Duration::from_millis(self.pool.busy_timeout_ms),
                ..defaults.sqlite.clone()
            },
            ..defaults
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml" | "yml")
    )
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{name}")).ok()
}

fn parse_number(name: &str, value: &str) -> Result<u64> {
    value.trim().parse().map_err(|_| {
        CleanErpError::configuration(format!("Invalid {ENV_PREFIX}{name} value: {value}"))
    })
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(CleanErpError::configuration(format!(
            "Invalid {ENV_PREFIX}{name} value: {value}"
        ))),
    }
}

fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}
