//! Backend health state machine.
//!
//! # States
//! - Unknown: never probed
//! - Healthy: last probe answered 200
//! - Unhealthy: last probe failed (non-200, timeout, connection error)
//!
//! # State Transitions
//! ```text
//! Unknown   → Healthy | Unhealthy
//! Healthy   → Healthy | Unhealthy
//! Unhealthy → Healthy | Unhealthy
//! ```
//!
//! # Design Decisions
//! - Driven solely by the most recent probe outcome
//! - No thresholds: one failure demotes, one success promotes
//! - Nothing ever transitions back to Unknown

use serde::Serialize;

/// Health State enum.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Unknown = 0,
    Healthy = 1,
    Unhealthy = 2,
}

impl From<u8> for HealthState {
    fn from(val: u8) -> Self {
        match val {
            1 => HealthState::Healthy,
            2 => HealthState::Unhealthy,
            _ => HealthState::Unknown,
        }
    }
}

/// Result of a single probe against a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Healthy,
    Unhealthy,
}

impl ProbeOutcome {
    pub fn is_healthy(self) -> bool {
        self == ProbeOutcome::Healthy
    }
}

impl HealthState {
    /// State after observing `outcome`. The previous state is irrelevant.
    pub fn after(self, outcome: ProbeOutcome) -> HealthState {
        match outcome {
            ProbeOutcome::Healthy => HealthState::Healthy,
            ProbeOutcome::Unhealthy => HealthState::Unhealthy,
        }
    }
}
