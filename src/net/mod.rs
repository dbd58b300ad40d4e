//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! bind (startup, fatal on error)
//!     → listener.rs (bound TcpListener + drain handle)
//!     → serve: axum::serve with graceful shutdown on drain
//!     → shutdown: drain until deadline, then force close
//!
//! Listener States:
//!     Bound → Serving → Draining → Stopped
//! ```
//!
//! # Design Decisions
//! - Binding happens at construction so port errors surface before any server runs
//! - One listener per server; HTTP and gRPC routers are both served through axum

pub mod listener;

pub use listener::{Listener, ListenerError};
