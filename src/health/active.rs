//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every configured backend
//! - Record each outcome on the backend
//! - Publish the healthy set to the registry when membership changes

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use futures_util::future::join_all;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::health::state::ProbeOutcome;
use crate::load_balancer::{Backend, BackendRegistry};
use crate::observability::metrics;

/// Why a probe classified its backend as unhealthy.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection error: {0}")]
    Connect(#[from] hyper_util::client::legacy::Error),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("invalid probe request: {0}")]
    Request(#[from] axum::http::Error),
}

/// Probe cadence and deadline.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub interval: Duration,
    pub timeout: Duration,
    pub path: String,
}

pub struct HealthChecker {
    registry: Arc<BackendRegistry>,
    settings: ProbeSettings,
    client: Client<HttpConnector, Body>,
}

impl HealthChecker {
    pub fn new(registry: Arc<BackendRegistry>, settings: ProbeSettings) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            registry,
            settings,
            client,
        }
    }

    /// Run cycles until shutdown. The first cycle is scheduled one interval
    /// from now; startup is expected to have run one already.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval = ?self.settings.interval,
            timeout = ?self.settings.timeout,
            path = %self.settings.path,
            backends = self.registry.configured().len(),
            "Health monitor starting"
        );

        let interval = self.settings.interval;
        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe everything once and publish the result if membership changed.
    /// Returns true when a new healthy set was installed.
    pub async fn run_cycle(&self) -> bool {
        let healthy = self.check_all().await;
        let size = healthy.len();

        let changed = self.registry.differs_from_healthy(&healthy);
        if changed {
            let names: Vec<&str> = healthy.iter().map(|b| b.base()).collect();
            tracing::info!(healthy = ?names, "Healthy backends changed");
            self.registry.replace_healthy(healthy);
        }

        metrics::record_healthy_set(size, changed);
        changed
    }

    /// Probe every configured backend concurrently. Returns the healthy ones
    /// in configuration order.
    pub async fn check_all(&self) -> Vec<Arc<Backend>> {
        let probes = self.registry.configured().iter().map(|backend| async move {
            let outcome = match self.probe(backend).await {
                Ok(()) => ProbeOutcome::Healthy,
                Err(e) => {
                    tracing::warn!(backend = %backend.url, error = %e, "Health check failed");
                    ProbeOutcome::Unhealthy
                }
            };

            let previous = backend.record_probe(outcome);
            if previous != backend.health() {
                tracing::debug!(
                    backend = %backend.url,
                    from = ?previous,
                    to = ?backend.health(),
                    "Backend health transition"
                );
            }
            metrics::record_backend_health(backend.base(), outcome.is_healthy());

            outcome.is_healthy().then(|| backend.clone())
        });

        join_all(probes).await.into_iter().flatten().collect()
    }

    /// Single GET against `<base><path>`. Healthy iff the status is exactly 200.
    pub async fn probe(&self, backend: &Backend) -> Result<(), ProbeError> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(backend.endpoint(&self.settings.path))
            .header("user-agent", "synapse-lb-health-check")
            .body(Body::empty())?;

        let timeout = self.settings.timeout;
        match time::timeout(timeout, self.client.request(request)).await {
            Ok(Ok(response)) if response.status() == StatusCode::OK => Ok(()),
            Ok(Ok(response)) => Err(ProbeError::Status(response.status())),
            Ok(Err(e)) => Err(ProbeError::Connect(e)),
            Err(_) => Err(ProbeError::Timeout(timeout)),
        }
    }
}
