//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → proxy.rs (select backend, forward, map failures)
//!     → request.rs (capture context, build upstream request)
//!     → response.rs (strip hop-by-hop headers, relay)
//!     → Send to client
//! ```

pub mod proxy;
pub mod request;
pub mod response;
pub mod server;

pub use proxy::{ProxyError, ProxyHandler};
pub use request::{RequestContext, UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
