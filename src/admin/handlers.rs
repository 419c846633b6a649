use std::time::UNIX_EPOCH;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::health::HealthState;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub configured: usize,
    pub healthy: usize,
    pub generation: u64,
}

#[derive(Debug, Serialize)]
pub struct BackendStatus {
    pub name: String,
    pub url: String,
    pub health: HealthState,
    pub in_rotation: bool,
    pub last_probed_ms: Option<u64>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let healthy = state.registry.snapshot_healthy().len();
    let configured = state.registry.configured().len();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: if healthy > 0 { "operational" } else { "degraded" },
        configured,
        healthy,
        generation: state.registry.generation(),
    })
}

pub async fn get_backends(State(state): State<AdminState>) -> Json<Vec<BackendStatus>> {
    let snapshot = state.registry.snapshot_healthy();

    let statuses = state
        .registry
        .configured()
        .iter()
        .map(|b| BackendStatus {
            name: b.name.clone(),
            url: b.url.to_string(),
            health: b.health(),
            in_rotation: snapshot.backends().iter().any(|h| h.url == b.url),
            last_probed_ms: b
                .last_probed()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as u64),
        })
        .collect();

    Json(statuses)
}
