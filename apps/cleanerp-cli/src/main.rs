//! CleanERP CLI - command line back office for contract-cleaning businesses

use anyhow::{Context, Result};
use clap::Parser;
use cleanerp_cli::logging::{init_logging, LogOverrides};
use cleanerp_cli::{ensure_initialized, load_cli_config, run_billing, run_command, Cli, Commands};
use cleanerp_core::ErpDatabase;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_cli_config(&cli).context("Failed to load configuration")?;

    init_logging(
        &config.logging,
        LogOverrides {
            verbose: cli.verbose,
            json: cli.json_logs,
        },
    )?;

    let mut stdout = std::io::stdout();

    // Billing needs no database
    if let Commands::Billing { operation } = &cli.command {
        run_billing(operation, &mut stdout)?;
        return Ok(());
    }

    debug!("Opening database at {}", config.database_path.display());
    let db = ErpDatabase::new_with_config(&config.database_path, config.pool_config())
        .await
        .with_context(|| {
            format!(
                "Failed to open database at {}",
                config.database_path.display()
            )
        })?;

    if !matches!(cli.command, Commands::Init { .. } | Commands::Health) {
        ensure_initialized(&db).await?;
    }

    let result = run_command(cli.command, &db, &config, &mut stdout).await;
    db.close().await;
    result?;
    Ok(())
}
