//! CORS relay (v1)
//!
//! A forwarding proxy that lets browser code reach any HTTP(S) endpoint.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                    CORS RELAY                     │
//!   Client Request     │  ┌─────────┐   ┌──────────┐   ┌──────────────┐   │
//!   ───────────────────┼─▶│  http   │──▶│ routing  │──▶│  transform   │   │
//!                      │  │ server  │   │  target  │   │ headers/body │   │
//!                      │  └─────────┘   └──────────┘   └──────┬───────┘   │
//!                      │                                      ▼           │
//!   Client Response    │  ┌─────────┐                  ┌──────────────┐   │
//!   ◀──────────────────┼──│response │◀─────────────────│   upstream   │◀──┼── Target
//!                      │  │ + CORS  │                  │    client    │   │
//!                      │  └─────────┘                  └──────────────┘   │
//!                      │  config · observability · resilience · lifecycle │
//!                      └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use cors_relay::config::{parse_config, validate_config, ConfigError, ProxyConfig};
use cors_relay::lifecycle::{wait_for_signal, Shutdown};
use cors_relay::observability::{logging, metrics};
use cors_relay::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "cors-relay", version)]
#[command(about = "Forwarding proxy that adds permissive CORS headers", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides `listener.bind_address`
    #[arg(short, long)]
    bind: Option<String>,

    /// Proxy path prefix, overrides `routing.prefix`
    #[arg(short, long)]
    prefix: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => parse_config(path)?,
            None => ProxyConfig::default(),
        };
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(prefix) = self.prefix {
            config.routing.prefix = prefix;
        }
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}


#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "cors-relay starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        prefix = %config.routing.prefix,
        request_timeout_secs = config.timeouts.request_secs,
        max_redirects = config.upstream.max_redirects,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    let serving = tokio::spawn(server.run(listener, shutdown.subscribe()));

    shutdown.trigger_on(wait_for_signal()).await;
    serving.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
