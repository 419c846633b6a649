//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the pass-through handler
//! - Wire up middleware (tracing, request ID)
//! - Run the initial health probe pass before accepting traffic
//! - Supervise the background health checker
//! - Serve until the shutdown signal, then drain

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::{on, MethodFilter},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{validate_config, ConfigError, ProxyConfig};
use crate::health::{HealthChecker, ProbeSettings};
use crate::http::proxy::ProxyHandler;
use crate::http::request::{UuidRequestId, X_REQUEST_ID};
use crate::load_balancer::{BackendRegistry, Selector};
use crate::resilience::TimeoutBudgets;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<ProxyHandler>,
}

/// HTTP server for the load balancer.
pub struct HttpServer {
    router: Router,
    registry: Arc<BackendRegistry>,
    checker: HealthChecker,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// The configuration is validated first; nothing is built from an
    /// invalid one.
    pub fn new(config: ProxyConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let registry = Arc::new(BackendRegistry::from_config(&config.backends)?);
        let budgets = TimeoutBudgets::from(&config);

        let checker = HealthChecker::new(
            registry.clone(),
            ProbeSettings {
                interval: budgets.check_interval,
                timeout: budgets.probe,
                path: config.health_check.path.clone(),
            },
        );

        let proxy = ProxyHandler::new(
            Selector::round_robin(registry.clone()),
            budgets.request,
            config.limits.max_body_bytes,
        );
        let router = Self::build_router(AppState {
            proxy: Arc::new(proxy),
        });

        Ok(Self {
            router,
            registry,
            checker,
            config,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let methods = MethodFilter::GET
            .or(MethodFilter::POST)
            .or(MethodFilter::PUT)
            .or(MethodFilter::DELETE);

        Router::new()
            .route("/", on(methods, proxy_handler))
            .route("/{*path}", on(methods, proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
            )
    }

    /// Shared handle to the backend registry.
    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.registry
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// One probe pass completes before the first connection is accepted, so
    /// the first request already sees real health data.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let checker_shutdown = shutdown.resubscribe();

        self.checker.run_cycle().await;
        let snapshot = self.registry.snapshot_healthy();
        let initial: Vec<&str> = snapshot.backends().iter().map(|b| b.base()).collect();
        tracing::info!(healthy = ?initial, "Initial healthy backends");

        let checker = tokio::spawn(self.checker.run(checker_shutdown));

        tracing::info!(address = %addr, "HTTP server starting");

        let served = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await;

        if served.is_err() {
            checker.abort();
        }
        let _ = checker.await;

        tracing::info!("HTTP server stopped");
        served
    }
}

/// Main proxy handler.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.proxy.handle(request).await
}
