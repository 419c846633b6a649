//! Timeout budgets.
//!
//! # Responsibilities
//! - Hold the three independent time budgets of the load balancer
//! - Convert configured seconds into `Duration`s once, at startup
//!
//! # Design Decisions
//! - Every external call has a deadline
//! - No budget is derived from another
//! - Timed-out proxy calls map to 502, timed-out probes to Unhealthy

use std::time::Duration;

use crate::config::ProxyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutBudgets {
    /// Deadline for a single health probe.
    pub probe: Duration,
    /// Start-to-start spacing of health check cycles.
    pub check_interval: Duration,
    /// End-to-end deadline for one proxied request.
    pub request: Duration,
}

impl Default for TimeoutBudgets {
    fn default() -> Self {
        Self {
            probe: Duration::from_secs(2),
            check_interval: Duration::from_secs(10),
            request: Duration::from_secs(120),
        }
    }
}

impl From<&ProxyConfig> for TimeoutBudgets {
    fn from(config: &ProxyConfig) -> Self {
        Self {
            probe: Duration::from_secs(config.health_check.timeout_secs),
            check_interval: Duration::from_secs(config.health_check.interval_secs),
            request: Duration::from_secs(config.timeouts.request_secs),
        }
    }
}
