//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Health probe:   timeouts.rs (probe budget)   → Unhealthy on expiry
//! Proxy request:  timeouts.rs (request budget) → 502 on expiry
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - A failed proxy attempt is never retried against another backend

pub mod timeouts;

pub use timeouts::TimeoutBudgets;
