//! synapse-lb: round-robin load balancer for inference servers.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────┐
//!                       │                   SYNAPSE-LB                     │
//!                       │                                                  │
//!     Client Request    │  ┌─────────┐    ┌──────────┐    ┌────────────┐   │
//!     ──────────────────┼─▶│  http   │───▶│ selector │───▶│  registry  │   │
//!                       │  │ server  │    │ (round   │    │  healthy   │   │
//!                       │  └────┬────┘    │  robin)  │    │  snapshot  │   │
//!                       │       │         └──────────┘    └─────▲──────┘   │
//!                       │       ▼                               │ replace  │
//!     Client Response   │  ┌─────────┐                    ┌─────┴──────┐   │
//!     ◀─────────────────┼──│  proxy  │◀──────────────────▶│   health   │   │
//!                       │  │ handler │      Backend       │  checker   │   │
//!                       │  └─────────┘      Servers       └────────────┘   │
//!                       └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use synapse_lb::config::{load_config, BackendConfig, ProxyConfig};
use synapse_lb::lifecycle::startup;
use synapse_lb::observability::logging;

#[derive(Parser)]
#[command(name = "synapse-lb")]
#[command(about = "Round-robin load balancer for inference servers", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Backend base URL; repeat to list several. Replaces configured backends.
    #[arg(long = "backend")]
    backends: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if !cli.backends.is_empty() {
        config.backends = cli.backends.into_iter().map(BackendConfig::new).collect();
    }

    logging::init(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "synapse-lb starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backends = config.backends.len(),
        health_interval_secs = config.health_check.interval_secs,
        probe_timeout_secs = config.health_check.timeout_secs,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
