//! UniRig API Server

#![warn(missing_docs)]
#![warn(clippy::all)]

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use unirig_server::{wait_for_engine, ApiServer, AppState, HttpEngine, LogFormat, ServerConfig};
use unirig_workflow::EndpointRegistry;

const ENGINE_POLL_INTERVAL: Duration = Duration::from_secs(2);

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("unirig=info,tower_http=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();
    init_tracing(config.log_format);
    config.validate().context("invalid configuration")?;

    let registry = EndpointRegistry::standard().context("failed to build endpoint registry")?;
    let engine = HttpEngine::new(&config.engine_uri()?, config.engine_timeout());

    if config.wait_for_engine {
        tracing::info!(url = %config.engine_url, "waiting for engine");
        wait_for_engine(&engine, config.wait_timeout(), ENGINE_POLL_INTERVAL)
            .await
            .context("engine did not become ready")?;
        tracing::info!("engine ready");
    }

    let state = AppState::new(Arc::new(registry), Arc::new(engine));
    let server = ApiServer::new(&config, state)?;
    server.serve().await?;

    Ok(())
}
