//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (net::Listener)
//!     → middleware/ (telemetry, recovery, context, request ID, logging, debug)
//!     → routes.rs (/api/v1/canvas, /openapi.json)
//!     → api::Endpoints → handler
//!
//! Internal routes on the same server:
//!     /healthz   liveness, filtered out of the chain
//!     /debug/*   runtime debug endpoints, filtered out of the chain
//! ```

pub mod debug;
pub mod middleware;
pub mod routes;
pub mod server;

pub use middleware::{abort_connection, AbortHandler, X_REQUEST_ID};
pub use server::HttpServer;
