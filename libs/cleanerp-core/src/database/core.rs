use crate::{
    database::{
        query_builders::TableSpec,
        schema::{SCHEMA, SCHEMA_VERSION, TABLES},
    },
    error::{CleanErpError, Result},
    models::DatabaseStats,
    query::{ListQuery, Page},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Log a driver error and convert it, prefixing `context`
pub(crate) fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> CleanErpError {
    move |e| {
        error!("{context}: {e}");
        match CleanErpError::from(e) {
            CleanErpError::Database(message) => {
                CleanErpError::database(format!("{context}: {message}"))
            }
            other => other,
        }
    }
}

/// Database connection pool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabasePoolConfig {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections in the pool
    pub min_connections: u32,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Idle timeout for connections; `None` keeps them open
    pub idle_timeout: Option<Duration>,
    /// Maximum lifetime of a connection; `None` keeps them open
    pub max_lifetime: Option<Duration>,
    /// SQLite-specific settings
    pub sqlite: SqliteSettings,
}

/// SQLite settings applied to every pooled connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteSettings {
    /// Journal mode (`WAL`, `DELETE`, `MEMORY`, ...)
    pub journal_mode: String,
    /// Synchronous mode (`NORMAL`, `FULL`, `OFF`)
    pub synchronous: String,
    /// Cache size in pages (negative = KiB)
    pub cache_size: i64,
    /// Enforce foreign key constraints; delete cascades depend on this
    pub foreign_keys: bool,
    /// How long a writer waits for a lock
    pub busy_timeout: Duration,
}

impl Default for DatabasePoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
            sqlite: SqliteSettings::default(),
        }
    }
}

impl Default for SqliteSettings {
    fn default() -> Self {
        Self {
            journal_mode: "WAL".to_string(),
            synchronous: "NORMAL".to_string(),
            cache_size: -20000,
            foreign_keys: true,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl DatabasePoolConfig {
    /// Single long-lived connection, required for `sqlite::memory:` where
    /// every connection would otherwise see its own empty database
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            max_connections: 1,
            min_connections: 1,
            idle_timeout: None,
            max_lifetime: None,
            sqlite: SqliteSettings {
                journal_mode: "MEMORY".to_string(),
                ..SqliteSettings::default()
            },
            ..Self::default()
        }
    }

    fn connect_options(&self, database_url: &str) -> Result<SqliteConnectOptions> {
        let journal_mode = SqliteJournalMode::from_str(&self.sqlite.journal_mode).map_err(|e| {
            CleanErpError::configuration(format!(
                "Invalid journal mode '{}': {e}",
                self.sqlite.journal_mode
            ))
        })?;
        let synchronous = SqliteSynchronous::from_str(&self.sqlite.synchronous).map_err(|e| {
            CleanErpError::configuration(format!(
                "Invalid synchronous mode '{}': {e}",
                self.sqlite.synchronous
            ))
        })?;

        Ok(SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                CleanErpError::configuration(format!("Invalid database URL '{database_url}': {e}"))
            })?
            .create_if_missing(true)
            .journal_mode(journal_mode)
            .synchronous(synchronous)
            .foreign_keys(self.sqlite.foreign_keys)
            .busy_timeout(self.sqlite.busy_timeout)
            .pragma("cache_size", self.sqlite.cache_size.to_string()))
    }
}

/// Result of [`ErpDatabase::health_check`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub healthy: bool,
    pub connected: bool,
    /// Version recorded by the last migration, 0 before any
    pub schema_version: i64,
    pub pool_size: u32,
    pub idle_connections: u32,
    pub response_time_ms: u64,
    pub stats: DatabaseStats,
    pub checked_at: DateTime<Utc>,
}

/// Async access to the CleanERP SQLite database.
///
/// Cheap to clone; clones share the pool. Entity operations live in the
/// sibling modules (`clients`, `sites`, ...).
#[derive(Debug, Clone)]
pub struct ErpDatabase {
    pool: SqlitePool,
    config: DatabasePoolConfig,
}

impl ErpDatabase {
    /// Open (creating if needed) the database file with default pool settings
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    #[instrument]
    pub async fn new(database_path: &Path) -> Result<Self> {
        Self::new_with_config(database_path, DatabasePoolConfig::default()).await
    }

    /// Open (creating if needed) the database file with custom pool settings
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// connection fails
    #[instrument]
    pub async fn new_with_config(database_path: &Path, config: DatabasePoolConfig) -> Result<Self> {
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let database_url = format!("sqlite://{}", database_path.display());
        Self::from_connection_string_with_config(&database_url, config).await
    }

    /// Connect using a `sqlite:` URL with default pool settings
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the connection fails
    #[instrument]
    pub async fn from_connection_string(database_url: &str) -> Result<Self> {
        Self::from_connection_string_with_config(database_url, DatabasePoolConfig::default()).await
    }

    /// Connect using a `sqlite:` URL with custom pool settings
    ///
    /// # Errors
    ///
    /// Returns an error if the URL or settings are invalid or the connection fails
    #[instrument]
    pub async fn from_connection_string_with_config(
        database_url: &str,
        config: DatabasePoolConfig,
    ) -> Result<Self> {
        info!("Connecting to SQLite database: {}", database_url);

        let options = config.connect_options(database_url)?;
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect_with(options)
            .await
            .map_err(db_error("Failed to connect to database"))?;

        info!(
            "Database connection pool established with {} max connections",
            config.max_connections
        );

        Ok(Self { pool, config })
    }

    /// Fresh migrated in-memory database
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or migration fails
    #[instrument]
    pub async fn in_memory() -> Result<Self> {
        let db = Self::from_connection_string_with_config(
            "sqlite::memory:",
            DatabasePoolConfig::in_memory(),
        )
        .await?;
        db.migrate().await?;
        Ok(db)
    }

    /// Get the underlying connection pool
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Pool settings in use
    #[must_use]
    pub fn config(&self) -> &DatabasePoolConfig {
        &self.config
    }

    /// Create any missing tables and indexes
    ///
    /// # Errors
    ///
    /// Returns an error if a DDL statement fails
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to apply schema"))?;
        sqlx::query(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to record schema version"))?;
        info!("Database schema at version {}", SCHEMA_VERSION);
        Ok(())
    }

    /// Schema version recorded by [`Self::migrate`]
    ///
    /// # Errors
    ///
    /// Returns an error if the pragma cannot be read
    pub async fn schema_version(&self) -> Result<i64> {
        sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to read schema version"))
    }

    /// Check if the database is connected
    #[instrument(skip(self))]
    pub async fn is_connected(&self) -> bool {
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => {
                debug!("Database connection is healthy");
                true
            }
            Err(e) => {
                error!("Database connection check failed: {}", e);
                false
            }
        }
    }

    /// Row counts for every entity table
    ///
    /// # Errors
    ///
    /// Returns an error if a count query fails
    #[instrument(skip(self))]
    pub async fn get_stats(&self) -> Result<DatabaseStats> {
        Ok(DatabaseStats {
            client_count: self.count_rows("clients").await?,
            site_count: self.count_rows("sites").await?,
            contract_count: self.count_rows("contracts").await?,
            work_order_count: self.count_rows("work_orders").await?,
            employee_count: self.count_rows("employees").await?,
            lead_count: self.count_rows("leads").await?,
            quote_count: self.count_rows("quotes").await?,
        })
    }

    /// Connectivity, schema version, pool usage and row counts
    ///
    /// # Errors
    ///
    /// Returns an error if the stats or schema version cannot be read
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<HealthStatus> {
        let started = std::time::Instant::now();
        let connected = self.is_connected().await;
        let response_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let schema_version = self.schema_version().await?;
        let migrated = schema_version >= SCHEMA_VERSION;
        // An unmigrated file has no tables to count
        let stats = if migrated {
            self.get_stats().await?
        } else {
            warn!("Database schema is at version {schema_version}, expected {SCHEMA_VERSION}");
            DatabaseStats::default()
        };

        Ok(HealthStatus {
            healthy: connected && migrated,
            connected,
            schema_version,
            pool_size: self.pool.size(),
            idle_connections: u32::try_from(self.pool.num_idle()).unwrap_or(u32::MAX),
            response_time_ms,
            stats,
            checked_at: Utc::now(),
        })
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub(crate) async fn count_rows(&self, table: &'static str) -> Result<u64> {
        debug_assert!(TABLES.contains(&table));
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to count rows"))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Run a whitelisted list query and map its rows
    pub(crate) async fn fetch_page<T>(
        &self,
        spec: &TableSpec,
        query: &ListQuery,
        map_row: fn(&SqliteRow) -> Result<T>,
    ) -> Result<Page<T>> {
        spec.validate_query(query)?;

        let mut count = spec.count(query)?;
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to count list rows"))?;

        let mut select = spec.select_page(query)?;
        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list rows"))?;

        let items = rows.iter().map(map_row).collect::<Result<Vec<T>>>()?;
        debug!(
            "Fetched {} of {} {} (page {})",
            items.len(),
            total,
            spec.table,
            query.page
        );
        Ok(Page::new(items, u64::try_from(total).unwrap_or(0), query))
    }

    /// Fetch one row by id
    pub(crate) async fn fetch_by_id<T>(
        &self,
        table: &'static str,
        id: &Uuid,
        map_row: fn(&SqliteRow) -> Result<T>,
    ) -> Result<Option<T>> {
        let row = sqlx::query(&format!("SELECT * FROM {table} WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to fetch row"))?;
        row.as_ref().map(map_row).transpose()
    }

    /// Fetch one row by id, failing with `NotFound` when absent
    pub(crate) async fn fetch_existing<T>(
        &self,
        table: &'static str,
        entity: &'static str,
        id: &Uuid,
        map_row: fn(&SqliteRow) -> Result<T>,
    ) -> Result<T> {
        self.fetch_by_id(table, id, map_row)
            .await?
            .ok_or_else(|| CleanErpError::not_found(entity, id))
    }

    /// Delete one row by id; dependent rows follow the schema's delete rules
    pub(crate) async fn delete_by_id(
        &self,
        table: &'static str,
        entity: &'static str,
        id: &Uuid,
    ) -> Result<()> {
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = ?"))
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete row"))?;

        if result.rows_affected() == 0 {
            return Err(CleanErpError::not_found(entity, id));
        }
        info!("Deleted {} {}", entity, id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_in_memory_is_migrated() {
        let db = ErpDatabase::in_memory().await.unwrap();
        assert!(db.is_connected().await);
        assert_eq!(db.schema_version().await.unwrap(), SCHEMA_VERSION);
        assert_eq!(db.get_stats().await.unwrap().total_records(), 0);
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let db = ErpDatabase::in_memory().await.unwrap();
        db.migrate().await.unwrap();
        db.migrate().await.unwrap();
        assert_eq!(db.schema_version().await.unwrap(), SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_new_creates_file_and_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("erp.sqlite");
        let db = ErpDatabase::new(&path).await.unwrap();
        db.migrate().await.unwrap();
        assert!(path.exists());

        let health = db.health_check().await.unwrap();
        assert!(health.healthy);
        assert!(health.connected);
        assert_eq!(health.stats, DatabaseStats::default());
        db.close().await;
    }

    #[tokio::test]
    async fn test_health_before_migration_is_unhealthy() {
        let dir = TempDir::new().unwrap();
        let db = ErpDatabase::new(&dir.path().join("fresh.sqlite"))
            .await
            .unwrap();
        assert_eq!(db.schema_version().await.unwrap(), 0);
        assert!(db.get_stats().await.is_err());

        let health = db.health_check().await.unwrap();
        assert!(health.connected);
        assert!(!health.healthy);
        assert_eq!(health.schema_version, 0);
        assert_eq!(health.stats.total_records(), 0);
    }

    #[test]
    fn test_invalid_journal_mode_is_configuration_error() {
        let mut config = DatabasePoolConfig::default();
        config.sqlite.journal_mode = "SIDEWAYS".to_string();
        let err = config.connect_options("sqlite::memory:").unwrap_err();
        assert!(matches!(err, CleanErpError::Configuration { .. }));
    }

    #[test]
    fn test_in_memory_config_keeps_single_connection() {
        let config = DatabasePoolConfig::in_memory();
        assert_eq!(config.max_connections, 1);
        assert!(config.idle_timeout.is_none());
        assert!(config.max_lifetime.is_none());
    }
}
