//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single configured inference server
//! - Identify it by base URL
//! - Track health state and the time of the last probe

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use url::Url;

use crate::health::state::{HealthState, ProbeOutcome};

/// A single backend server.
#[derive(Debug)]
pub struct Backend {
    /// Human readable label used in logs and the admin API.
    pub name: String,
    /// Base URL; the backend's identity.
    pub url: Url,

    /// Current health state (0=Unknown, 1=Healthy, 2=Unhealthy).
    state: AtomicU8,
    /// Milliseconds since the Unix epoch of the last probe, 0 if never probed.
    last_probed_ms: AtomicU64,
}

impl Backend {
    /// Create a new backend in the `Unknown` state.
    pub fn new(name: impl Into<String>, url: Url) -> Self {
        Self {
            name: name.into(),
            url,
            state: AtomicU8::new(HealthState::Unknown as u8),
            last_probed_ms: AtomicU64::new(0),
        }
    }

    /// Parse `url` and name the backend after its authority.
    pub fn parse(url: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(url)?;
        let name = match (url.host_str(), url.port_or_known_default()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            _ => url.to_string(),
        };
        Ok(Self::new(name, url))
    }

    /// Base URL without a trailing slash.
    pub fn base(&self) -> &str {
        self.url.as_str().trim_end_matches('/')
    }

    /// Absolute URL for `path_and_query` on this backend.
    ///
    /// `path_and_query` is appended to the base, so a base with a path
    /// prefix (`http://node:8000/api`) keeps it.
    pub fn endpoint(&self, path_and_query: &str) -> String {
        if path_and_query.starts_with('/') {
            format!("{}{}", self.base(), path_and_query)
        } else {
            format!("{}/{}", self.base(), path_and_query)
        }
    }

    pub fn health(&self) -> HealthState {
        HealthState::from(self.state.load(Ordering::Acquire))
    }

    /// When this backend was last probed, if ever.
    pub fn last_probed(&self) -> Option<SystemTime> {
        match self.last_probed_ms.load(Ordering::Acquire) {
            0 => None,
            ms => Some(UNIX_EPOCH + Duration::from_millis(ms)),
        }
    }

    /// Apply a probe outcome. Returns the state before the update.
    pub fn record_probe(&self, outcome: ProbeOutcome) -> HealthState {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
            .max(1);
        self.last_probed_ms.store(now_ms, Ordering::Release);

        let previous = HealthState::from(self.state.load(Ordering::Acquire));
        let next = previous.after(outcome);
        self.state.store(next as u8, Ordering::Release);
        previous
    }
}
