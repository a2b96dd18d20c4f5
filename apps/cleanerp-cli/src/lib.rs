//! CleanERP CLI library
//!
//! Argument definitions and the command implementations behind the
//! `cleanerp` binary. Every command writes to a caller-supplied `Write`.

pub mod logging;

use clap::{Args, Parser, Subcommand};
use cleanerp_common::{format_currency, truncate_string};
use cleanerp_core::database::SCHEMA_VERSION;
use cleanerp_core::{
    calculate_all_billing_frequencies, convert_billing_amount, BillingAmounts, BillingFrequency,
    CleanErpError, ConfigLoader, DashboardSummary, DataExporter, DataImporter, EntityKind,
    ErpConfig, ErpDatabase, ExportFormat, HealthStatus, KeyStyle, ListQuery, Page, Result,
    SiteMarker, Uuid,
};
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

#[derive(Parser, Debug)]
#[command(name = "cleanerp")]
#[command(about = "Back office for contract-cleaning businesses")]
#[command(version)]
pub struct Cli {
    /// Database file (overrides the configuration)
    #[arg(long, short, global = true)]
    pub database: Option<PathBuf>,

    /// Configuration file, JSON or YAML
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Create or upgrade the database schema
    Init {
        /// Also write a sample configuration file
        #[arg(long)]
        sample_config: Option<PathBuf>,
    },
    /// Convert prices between billing frequencies
    Billing {
        #[command(subcommand)]
        operation: BillingCommand,
    },
    /// List records of an entity
    List {
        /// clients, sites, contracts, work-orders, employees, leads or quotes
        entity: EntityKind,
        #[command(flatten)]
        options: ListOptions,
    },
    /// Show one record as JSON
    Show { entity: EntityKind, id: Uuid },
    /// Delete one record
    Delete { entity: EntityKind, id: Uuid },
    /// Summary figures across the business
    Dashboard,
    /// Sites that have map coordinates
    Map,
    /// Export every record of an entity
    Export {
        entity: EntityKind,
        /// json or csv
        #[arg(long, short, default_value = "json")]
        format: ExportFormat,
        /// ui (camelCase) or db (snake_case) keys
        #[arg(long, short, default_value = "ui")]
        keys: KeyStyle,
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Import records from a JSON array file
    Import {
        entity: EntityKind,
        file: PathBuf,
        /// ui (camelCase) or db (snake_case) keys
        #[arg(long, short, default_value = "ui")]
        keys: KeyStyle,
    },
    /// Health check
    Health,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum BillingCommand {
    /// Convert an amount from one frequency to another
    Convert {
        #[arg(allow_negative_numbers = true)]
        amount: f64,
        #[arg(long)]
        from: BillingFrequency,
        #[arg(long)]
        to: BillingFrequency,
    },
    /// Show the weekly, monthly and annual equivalents of an amount
    Breakdown {
        #[arg(allow_negative_numbers = true)]
        amount: f64,
        #[arg(long, short, default_value = "weekly")]
        frequency: BillingFrequency,
    },
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Page number, starting at 1
    #[arg(long, short, default_value_t = 1)]
    pub page: u32,

    /// Rows per page (defaults to the configured page size)
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Free-text search
    #[arg(long, short)]
    pub search: Option<String>,

    /// Sort column with optional direction, e.g. `companyName:desc`
    #[arg(long)]
    pub sort: Option<String>,

    /// Equality filter `column=value`; repeatable
    #[arg(long = "filter")]
    pub filters: Vec<String>,
}

impl ListOptions {
    /// Build the list query these options describe
    ///
    /// # Errors
    /// Returns an error if the sort or a filter is malformed
    pub fn to_query(&self, default_page_size: u32) -> Result<ListQuery> {
        let mut query = ListQuery::new()
            .page(self.page)
            .page_size(self.page_size.unwrap_or(default_page_size));
        if let Some(term) = &self.search {
            query = query.search(term);
        }
        if let Some(sort) = &self.sort {
            query.sort = Some(sort.parse()?);
        }
        for filter in &self.filters {
            let (column, value) = parse_filter(filter)?;
            query = query.filter(&column, value);
        }
        Ok(query)
    }
}

/// Parse `column=value`
///
/// # Errors
/// Returns a validation error when the `=` or the column is missing
pub fn parse_filter(spec: &str) -> Result<(String, String)> {
    match spec.split_once('=') {
        Some((column, value)) if !column.trim().is_empty() => {
            Ok((column.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(CleanErpError::validation(format!(
            "Invalid filter '{spec}', expected column=value"
        ))),
    }
}

/// Load configuration for a CLI invocation.
///
/// An explicit `--config` file must exist; `--database` overrides the
/// configured path.
///
/// # Errors
/// Returns an error if a configuration source is missing, unreadable or invalid
pub fn load_cli_config(cli: &Cli) -> Result<ErpConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        if !path.exists() {
            return Err(CleanErpError::configuration(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        loader = loader.add_config_path(path);
    }
    let mut config = loader.load()?;
    if let Some(database) = &cli.database {
        config.database_path.clone_from(database);
    }
    Ok(config)
}

/// Fail with a hint when the schema has not been created yet
///
/// # Errors
/// Returns a configuration error if `init` has not been run
pub async fn ensure_initialized(db: &ErpDatabase) -> Result<()> {
    if db.schema_version().await? < SCHEMA_VERSION {
        return Err(CleanErpError::configuration(
            "Database is not initialized; run `cleanerp init` first",
        ));
    }
    Ok(())
}

/// Run a billing calculation
///
/// # Errors
/// Returns an error if writing fails
pub fn run_billing<W: Write>(operation: &BillingCommand, writer: &mut W) -> Result<()> {
    match *operation {
        BillingCommand::Convert { amount, from, to } => {
            let converted = convert_billing_amount(amount, from, to);
            writeln!(
                writer,
                "{} {from} = {} {to}",
                format_currency(amount),
                format_currency(converted)
            )?;
        }
        BillingCommand::Breakdown { amount, frequency } => {
            let amounts = calculate_all_billing_frequencies(amount, frequency);
            writeln!(writer, "{} {frequency}:", format_currency(amount))?;
            print_billing_amounts(&amounts, writer)?;
        }
    }
    Ok(())
}

/// Run a database command
///
/// # Errors
/// Returns an error if the command fails or writing fails
#[instrument(skip(db, config, writer))]
pub async fn run_command<W: Write>(
    command: Commands,
    db: &ErpDatabase,
    config: &ErpConfig,
    writer: &mut W,
) -> Result<()> {
    match command {
        Commands::Init { sample_config } => {
            db.migrate().await?;
            writeln!(
                writer,
                "Database ready at {} (schema version {SCHEMA_VERSION})",
                config.database_path.display()
            )?;
            if let Some(path) = sample_config {
                ConfigLoader::create_sample_config(&path, config_format(&path))?;
                writeln!(writer, "Sample configuration written to {}", path.display())?;
            }
        }
        Commands::Billing { operation } => run_billing(&operation, writer)?,
        Commands::List { entity, options } => {
            let query = options.to_query(config.default_page_size)?;
            let page = db.list_records(entity, &query).await?;
            print_page(entity, &page, writer)?;
        }
        Commands::Show { entity, id } => {
            let record = db.require_record(entity, &id).await?;
            writeln!(writer, "{}", serde_json::to_string_pretty(&record)?)?;
        }
        Commands::Delete { entity, id } => {
            db.delete_record(entity, &id).await?;
            writeln!(writer, "Deleted {} {id}", entity.entity_name())?;
        }
        Commands::Dashboard => print_dashboard(&db.dashboard_summary().await?, writer)?,
        Commands::Map => print_markers(&db.site_map_markers().await?, writer)?,
        Commands::Export {
            entity,
            format,
            keys,
            output,
        } => {
            let content = DataExporter::new(format, keys)
                .export_entity(db, entity)
                .await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, content).await?;
                    info!("Exported {} to {}", entity, path.display());
                    writeln!(writer, "Exported {entity} to {}", path.display())?;
                }
                None => writeln!(writer, "{content}")?,
            }
        }
        Commands::Import { entity, file, keys } => {
            let content = tokio::fs::read_to_string(&file).await?;
            let summary = DataImporter::new(keys).import(db, entity, &content).await?;
            writeln!(
                writer,
                "Imported {} {} records",
                summary.created, summary.entity
            )?;
        }
        Commands::Health => health_check(db, writer).await?,
    }
    Ok(())
}

fn config_format(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => "yaml",
        _ => "json",
    }
}

fn text<'a>(record: &'a Value, key: &str) -> &'a str {
    record.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// One-line description of a record
#[must_use]
pub fn record_summary(kind: EntityKind, record: &Value) -> String {
    match kind {
        EntityKind::Clients | EntityKind::Leads => text(record, "companyName").to_string(),
        EntityKind::Sites => format!(
            "{} ({})",
            text(record, "siteName"),
            truncate_string(text(record, "address"), 40)
        ),
        EntityKind::Contracts => {
            let value = record["contractValue"].as_f64().unwrap_or_default();
            format!(
                "{} {} ({} {})",
                text(record, "contractNumber"),
                text(record, "contractName"),
                format_currency(value),
                text(record, "billingFrequency")
            )
        }
        EntityKind::WorkOrders => match record["dueDate"].as_str() {
            Some(due) => format!("{} (due {due})", text(record, "title")),
            None => text(record, "title").to_string(),
        },
        EntityKind::Employees => {
            format!("{} {}", text(record, "firstName"), text(record, "lastName"))
        }
        EntityKind::Quotes => format!(
            "{} {}",
            text(record, "quoteNumber"),
            text(record, "title")
        ),
    }
}

/// Print one page of records to the given writer
///
/// # Errors
/// Returns an error if writing fails
pub fn print_page<W: Write>(kind: EntityKind, page: &Page<Value>, writer: &mut W) -> Result<()> {
    if page.is_empty() {
        writeln!(writer, "No {kind} found")?;
        return Ok(());
    }

    writeln!(
        writer,
        "Found {} {kind} (page {} of {}):",
        page.total,
        page.page,
        page.total_pages()
    )?;
    for record in &page.items {
        writeln!(
            writer,
            "  • {} [{}]",
            record_summary(kind, record),
            text(record, "status")
        )?;
        writeln!(writer, "    {}", text(record, "id"))?;
    }
    Ok(())
}

fn print_billing_amounts<W: Write>(amounts: &BillingAmounts, writer: &mut W) -> Result<()> {
    writeln!(writer, "  Weekly:      {}", format_currency(amounts.weekly))?;
    writeln!(writer, "  Fortnightly: {}", format_currency(amounts.fortnightly()))?;
    writeln!(writer, "  Monthly:     {}", format_currency(amounts.monthly))?;
    writeln!(writer, "  Quarterly:   {}", format_currency(amounts.quarterly()))?;
    writeln!(writer, "  Annually:    {}", format_currency(amounts.annually))?;
    Ok(())
}

/// Print the dashboard summary to the given writer
///
/// # Errors
/// Returns an error if writing fails
pub fn print_dashboard<W: Write>(summary: &DashboardSummary, writer: &mut W) -> Result<()> {
    let stats = &summary.stats;
    writeln!(writer, "CleanERP dashboard")?;
    writeln!(
        writer,
        "  Clients:     {} ({} active)",
        stats.client_count, summary.active_clients
    )?;
    writeln!(writer, "  Sites:       {}", stats.site_count)?;
    for status in &summary.sites_by_status {
        writeln!(writer, "    {}: {}", status.status, status.count)?;
    }
    writeln!(
        writer,
        "  Contracts:   {} ({} active)",
        stats.contract_count, summary.active_contracts
    )?;
    writeln!(
        writer,
        "  Work orders: {} ({} open, {} overdue)",
        stats.work_order_count, summary.open_work_orders, summary.overdue_work_orders
    )?;
    writeln!(
        writer,
        "  Employees:   {} ({} active)",
        stats.employee_count, summary.active_employees
    )?;
    writeln!(writer, "  Leads:       {}", stats.lead_count)?;
    for status in &summary.leads_by_status {
        writeln!(writer, "    {}: {}", status.status, status.count)?;
    }
    writeln!(writer, "  Quotes:      {}", stats.quote_count)?;
    writeln!(writer)?;
    writeln!(writer, "Contract revenue")?;
    print_billing_amounts(&summary.contract_revenue, writer)?;
    writeln!(writer, "Open quote pipeline")?;
    print_billing_amounts(&summary.quote_pipeline, writer)?;
    Ok(())
}

/// Print map markers to the given writer
///
/// # Errors
/// Returns an error if writing fails
pub fn print_markers<W: Write>(markers: &[SiteMarker], writer: &mut W) -> Result<()> {
    if markers.is_empty() {
        writeln!(writer, "No sites with coordinates")?;
        return Ok(());
    }

    writeln!(writer, "Found {} sites:", markers.len())?;
    for marker in markers {
        writeln!(
            writer,
            "  • {} - {} ({:.5}, {:.5})",
            marker.client_name, marker.site_name, marker.latitude, marker.longitude
        )?;
        writeln!(writer, "    {}", marker.address)?;
    }
    Ok(())
}

/// Print a health report
///
/// # Errors
/// Returns an error if writing fails
pub fn print_health<W: Write>(health: &HealthStatus, writer: &mut W) -> Result<()> {
    let state = if health.healthy { "healthy" } else { "unhealthy" };
    writeln!(writer, "Database {state}")?;
    writeln!(writer, "  Schema version: {}", health.schema_version)?;
    writeln!(
        writer,
        "  Connections:    {} ({} idle)",
        health.pool_size, health.idle_connections
    )?;
    writeln!(writer, "  Response time:  {} ms", health.response_time_ms)?;
    writeln!(writer, "  Records:        {}", health.stats.total_records())?;
    Ok(())
}

/// Perform a health check on the database
///
/// # Errors
/// Returns an error if the database is unreachable or the schema is missing
pub async fn health_check<W: Write>(db: &ErpDatabase, writer: &mut W) -> Result<()> {
    if !db.is_connected().await {
        return Err(CleanErpError::unknown("Database is not connected"));
    }
    ensure_initialized(db).await?;

    let health = db.health_check().await?;
    print_health(&health, writer)?;
    if !health.healthy {
        return Err(CleanErpError::unknown("Database health check failed"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cleanerp_core::test_utils::create_seeded_database;
    use cleanerp_core::SortDirection;
    use serde_json::json;

    fn output<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> Result<()>,
    {
        let mut buffer = Vec::new();
        f(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    fn list_options(sort: Option<&str>) -> ListOptions {
        ListOptions {
            page: 1,
            page_size: None,
            search: None,
            sort: sort.map(str::to_string),
            filters: vec!["status=On Hold".to_string()],
        }
    }

    #[test]
    fn test_list_options_sort() {
        let query = list_options(Some("companyName:desc")).to_query(25).unwrap();
        let sort = query.sort.unwrap();
        assert_eq!(sort.column, "companyName");
        assert_eq!(sort.direction, SortDirection::Desc);
        assert_eq!(
            query.filters,
            vec![("status".to_string(), "On Hold".to_string())]
        );

        let query = list_options(Some("city")).to_query(25).unwrap();
        assert_eq!(query.sort.unwrap().direction, SortDirection::Asc);
        assert!(list_options(None).to_query(25).unwrap().sort.is_none());
        assert!(list_options(Some(":desc")).to_query(25).is_err());
        assert!(list_options(Some("city:sideways")).to_query(25).is_err());
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!(
            parse_filter("status = active").unwrap(),
            ("status".to_string(), "active".to_string())
        );
        assert_eq!(
            parse_filter("notes=a=b").unwrap(),
            ("notes".to_string(), "a=b".to_string())
        );
        assert!(parse_filter("status").is_err());
        assert!(parse_filter("=active").is_err());
    }

    #[test]
    fn test_list_options_to_query() {
        let options = ListOptions {
            page: 2,
            page_size: None,
            search: Some("  harbour ".to_string()),
            sort: Some("siteName:desc".to_string()),
            filters: vec!["status=active".to_string()],
        };
        let query = options.to_query(10).unwrap();
        assert_eq!(query.page, 2);
        assert_eq!(query.page_size, 10);
        assert_eq!(query.search.as_deref(), Some("harbour"));
        assert_eq!(query.sort.unwrap().column, "siteName");
        assert_eq!(query.filters, vec![("status".to_string(), "active".to_string())]);
    }

    #[test]
    fn test_billing_breakdown_output() {
        let text = output(|w| {
            run_billing(
                &BillingCommand::Breakdown {
                    amount: 500.0,
                    frequency: BillingFrequency::Weekly,
                },
                w,
            )
        });
        assert!(text.starts_with("$500.00 weekly:"));
        assert!(text.contains("Monthly:     $2,165.00"));
        assert!(text.contains("Annually:    $26,000.00"));
    }

    #[test]
    fn test_billing_convert_output() {
        let text = output(|w| {
            run_billing(
                &BillingCommand::Convert {
                    amount: 4330.0,
                    from: BillingFrequency::Monthly,
                    to: BillingFrequency::Weekly,
                },
                w,
            )
        });
        assert_eq!(text, "$4,330.00 monthly = $1,000.00 weekly\n");
    }

    #[test]
    fn test_record_summary() {
        let contract = json!({
            "contractNumber": "C-1",
            "contractName": "Office",
            "contractValue": 2165.0,
            "billingFrequency": "monthly"
        });
        assert_eq!(
            record_summary(EntityKind::Contracts, &contract),
            "C-1 Office ($2,165.00 monthly)"
        );

        let order = json!({ "title": "Windows", "dueDate": "2024-03-01" });
        assert_eq!(
            record_summary(EntityKind::WorkOrders, &order),
            "Windows (due 2024-03-01)"
        );
        assert_eq!(
            record_summary(EntityKind::Employees, &json!({ "firstName": "Kim", "lastName": "Zhao" })),
            "Kim Zhao"
        );
    }

    #[test]
    fn test_print_empty_page() {
        let page = Page::new(Vec::new(), 0, &ListQuery::new());
        let text = output(|w| print_page(EntityKind::WorkOrders, &page, w));
        assert_eq!(text, "No work_orders found\n");
    }

    #[tokio::test]
    async fn test_dashboard_and_map_output() {
        let (db, _) = create_seeded_database().await.unwrap();

        let summary = db.dashboard_summary().await.unwrap();
        let text = output(|w| print_dashboard(&summary, w));
        assert!(text.contains("Work orders: 3 (2 open, 1 overdue)"));
        assert!(text.contains("Weekly:      $1,500.00"));

        let markers = db.site_map_markers().await.unwrap();
        let text = output(|w| print_markers(&markers, w));
        assert!(text.starts_with("Found 2 sites:"));
        assert!(text.contains("Harbour Hotel - Lobby (-33.86880, 151.20930)"));
    }

    #[tokio::test]
    async fn test_health_check_reports_uninitialized_database() {
        let db = ErpDatabase::from_connection_string("sqlite::memory:")
            .await
            .unwrap();
        let mut buffer = Vec::new();
        let err = health_check(&db, &mut buffer).await.unwrap_err();
        assert!(err.to_string().contains("cleanerp init"));
    }
}
