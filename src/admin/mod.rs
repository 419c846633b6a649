//! Read-only admin API reporting backend health.
//!
//! Served on its own listener so it never collides with proxied paths.

pub mod auth;
pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::timeout::TimeoutLayer;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::load_balancer::BackendRegistry;

#[derive(Clone)]
pub struct AdminState {
    pub registry: Arc<BackendRegistry>,
    pub api_key: Arc<str>,
}

#[allow(deprecated)]
pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/backends", get(get_backends))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
        .with_state(state)
}

/// Serve the admin API until shutdown.
pub async fn serve_admin(
    listener: TcpListener,
    state: AdminState,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    tracing::info!(address = %listener.local_addr()?, "Admin API listening");

    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}
