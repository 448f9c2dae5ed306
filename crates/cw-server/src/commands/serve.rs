//! Serve command: broker subscription plus HTTP API until interrupted.

use anyhow::{Context, Result};
use cw_db::StorePool;

use crate::Config;
use crate::http;
use crate::ingest::{self, Ingestor};
use crate::query::QueryService;

pub async fn run(config: &Config, pool: StorePool) -> Result<()> {
    let subscriber = if config.mqtt.enabled {
        let ingestor = Ingestor::new(pool.clone());
        Some(tokio::spawn(ingest::run_subscriber(
            config.mqtt.clone(),
            ingestor,
        )))
    } else {
        tracing::info!("MQTT ingestion disabled");
        None
    };

    let server = http::run(&config.http, QueryService::new(pool)).await?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("shutdown requested");

    if let Some(subscriber) = subscriber {
        subscriber.abort();
    }
    server.shutdown().await;

    Ok(())
}
