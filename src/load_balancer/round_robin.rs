//! Round-robin load balancing strategy.

use std::sync::Arc;

use crate::load_balancer::{backend::Backend, registry::HealthySet, LoadBalancer};

/// Round-robin selector.
/// Stateless; the rotation counter belongs to the healthy set being walked.
#[derive(Debug, Default)]
pub struct RoundRobin;

impl RoundRobin {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for RoundRobin {
    fn next_server(&self, healthy: &HealthySet) -> Option<Arc<Backend>> {
        if healthy.is_empty() {
            return None;
        }

        let index = healthy.advance() % healthy.len();
        Some(healthy.backends()[index].clone())
    }
}
