//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Startup: one awaited cycle before traffic
//!     Then a periodic timer
//!     → Probe each backend (GET /health, 200 = healthy)
//!     → Update state.rs per backend
//!     → Replace the registry's healthy set if membership changed
//! ```
//!
//! # Design Decisions
//! - Probe failures stay inside the checker; clients never see them
//! - One probe failing never affects the others or later cycles
//! - No hysteresis: the latest probe decides

pub mod active;
pub mod state;

pub use active::{HealthChecker, ProbeError, ProbeSettings};
pub use state::{HealthState, ProbeOutcome};
