//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! HealthChecker
//!     → registry.rs (replace healthy set, cursor reset)
//!
//! Proxy request
//!     → selector.rs (load healthy snapshot)
//!     → round_robin.rs (pick cursor mod len, advance)
//!     → backend.rs (base URL for the upstream request)
//! ```
//!
//! # Design Decisions
//! - Strategies are stateless; rotation state belongs to the healthy set
//! - Readers never block on the health checker's writes
//! - Unhealthy backends are never in the healthy set

use std::sync::Arc;

pub mod backend;
pub mod registry;
pub mod round_robin;
pub mod selector;

pub use backend::Backend;
pub use registry::{BackendRegistry, HealthySet};
pub use round_robin::RoundRobin;
pub use selector::Selector;

/// A backend selection strategy over a healthy set.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Pick the next backend, or `None` if the set is empty.
    fn next_server(&self, healthy: &HealthySet) -> Option<Arc<Backend>>;
}
