//! DevHub Server: developer community backend.
//!
//! Parses the command line, loads layered configuration, installs logging,
//! and hands over to the API crate.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use devhub_core::config::AppConfig;

/// Command-line options of the server binary.
#[derive(Debug, Parser)]
#[command(name = "devhub-server", version, about = "DevHub REST backend")]
struct Cli {
    /// Configuration overlay loaded on top of `config/default.toml`.
    #[arg(long, env = "DEVHUB_ENV", default_value = "development")]
    config_env: String,

    /// Apply pending database migrations and exit.
    #[arg(long)]
    migrate_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config_env)
        .with_context(|| format!("Failed to load configuration (env: {})", cli.config_env))?;

    init_logging(&config);
    tracing::info!(
        "DevHub v{} (env: {})",
        env!("CARGO_PKG_VERSION"),
        cli.config_env
    );

    if cli.migrate_only {
        return migrate(&config).await;
    }

    devhub_api::run_server(config)
        .await
        .context("Server terminated with an error")
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Runs migrations against the configured PostgreSQL database.
async fn migrate(config: &AppConfig) -> anyhow::Result<()> {
    if config.database.provider != "postgres" {
        tracing::info!(
            "Database provider is '{}', nothing to migrate",
            config.database.provider
        );
        return Ok(());
    }

    tracing::info!("Connecting to database...");
    let pool = devhub_database::DatabasePool::connect(&config.database)
        .await
        .context("Database connection failed")?;

    tracing::info!("Running database migrations...");
    devhub_database::migration::run_migrations(pool.pool())
        .await
        .context("Migration failed")?;
    pool.close().await;

    tracing::info!("Database migrations complete");
    Ok(())
}
