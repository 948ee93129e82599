//! Batch gateway entrypoint.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use fanout_gateway::config::{load_config, GatewayConfig};
use fanout_gateway::error::GatewayError;
use fanout_gateway::http::HttpServer;
use fanout_gateway::lifecycle::{listen_for_signals, Shutdown};
use fanout_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "fanout-gateway", about = "Batch HTTP dispatch gateway", version)]
struct Cli {
    /// Path to the TOML configuration file. Defaults are used if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), GatewayError> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_logging(&config.observability);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_concurrency = config.dispatch.max_concurrency,
        per_item_timeout_ms = config.dispatch.per_item_timeout_ms,
        relay_enabled = config.relay.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => {
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    "Failed to parse metrics address"
                );
            }
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    listen_for_signals(&shutdown);

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
