//! Backend selection against the live registry.
//!
//! # Responsibilities
//! - Load the current healthy snapshot
//! - Delegate the pick to a `LoadBalancer` strategy
//!
//! Only the pick touches shared state; the caller does its I/O afterwards.
//! A replacement installed while a pick is running is seen by the next call.

use std::sync::Arc;

use crate::load_balancer::{
    backend::Backend, registry::BackendRegistry, round_robin::RoundRobin, LoadBalancer,
};

#[derive(Debug)]
pub struct Selector {
    registry: Arc<BackendRegistry>,
    balancer: Box<dyn LoadBalancer>,
}

impl Selector {
    pub fn new(registry: Arc<BackendRegistry>, balancer: Box<dyn LoadBalancer>) -> Self {
        Self { registry, balancer }
    }

    pub fn round_robin(registry: Arc<BackendRegistry>) -> Self {
        Self::new(registry, Box::new(RoundRobin::new()))
    }

    /// Next backend to receive traffic, or `None` when nothing is healthy.
    pub fn next(&self) -> Option<Arc<Backend>> {
        let snapshot = self.registry.snapshot_healthy();
        self.balancer.next_server(&snapshot)
    }
}
