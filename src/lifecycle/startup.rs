//! Startup orchestration.
//!
//! # Order
//! ```text
//! ProxyConfig
//!     → validate, build registry, checker, proxy (HttpServer::new)
//!     → metrics exporter (optional)
//!     → bind listeners
//!     → signal watcher
//!     → admin API (optional)
//!     → initial probe pass, then serve (HttpServer::run)
//! ```
//!
//! Any error before serving is fatal.

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::admin::{serve_admin, AdminState};
use crate::config::{ConfigError, ProxyConfig};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

async fn bind(address: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(address).await.map_err(|source| StartupError::Bind {
        address: address.to_string(),
        source,
    })
}

/// Run the load balancer until a termination signal arrives.
pub async fn run(config: ProxyConfig) -> Result<(), StartupError> {
    let server = HttpServer::new(config)?;
    let config = server.config();

    if config.backends.is_empty() {
        tracing::warn!("No backends configured; every request will get 503");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let admin_config = config.admin.clone();

    let listener = bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_watcher(shutdown.clone());

    let admin = if admin_config.enabled {
        let admin_listener = bind(&admin_config.bind_address).await?;
        let state = AdminState {
            registry: server.registry().clone(),
            api_key: Arc::from(admin_config.api_key.as_str()),
        };
        Some(tokio::spawn(serve_admin(admin_listener, state, shutdown.subscribe())))
    } else {
        None
    };

    server.run(listener, shutdown.subscribe()).await?;

    if let Some(admin) = admin {
        match admin.await {
            Ok(Err(e)) => tracing::error!(error = %e, "Admin API failed"),
            Err(e) => tracing::error!(error = %e, "Admin API task panicked"),
            Ok(Ok(())) => {}
        }
    }

    Ok(())
}
