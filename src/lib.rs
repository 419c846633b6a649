//! Round-robin HTTP load balancer for inference servers.
//!
//! Backends are probed on `/health`; only those answering 200 receive
//! traffic. Requests and responses are relayed in full, one attempt each.

pub mod admin;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod resilience;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
