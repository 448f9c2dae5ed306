use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cw_db::StorePool;
use cw_server::commands::{ingest, report, serve, status};
use cw_server::ingest::Ingestor;
use cw_server::query::QueryService;
use cw_server::{Cli, Commands, Config};

/// Load config and open the connection pool, ensuring the parent directory exists.
fn open_pool(config_path: Option<&Path>) -> Result<(StorePool, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let pool = StorePool::open(&config.database_path, &config.pool.to_pool_config())
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    Ok((pool, config))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let (pool, config) = open_pool(cli.config.as_deref())?;
    let mut stdout = io::stdout();

    match &cli.command {
        None | Some(Commands::Serve) => serve::run(&config, pool).await?,
        Some(Commands::Ingest { payload }) => {
            ingest::run(&mut stdout, &Ingestor::new(pool), payload).await?;
        }
        Some(Commands::Report { classroom, json }) => {
            report::run(&mut stdout, &QueryService::new(pool), classroom, *json).await?;
        }
        Some(Commands::Status) => {
            status::run(&mut stdout, &pool, &config.database_path).await?;
        }
    }

    Ok(())
}
