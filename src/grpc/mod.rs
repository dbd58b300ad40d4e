//! gRPC transport.
//!
//! # Data Flow
//! ```text
//! HTTP/2 connection (axum::serve)
//!     → middleware chain (health and reflection methods filtered)
//!     → tonic Routes: pikcel.v1.Api, grpc.health.v1.Health, reflection
//!     → service.rs (GrpcApi) → shared Api
//! ```

pub mod descriptor;
pub mod pb;
pub mod server;
pub mod service;

pub use server::GrpcServer;
pub use service::GrpcApi;
