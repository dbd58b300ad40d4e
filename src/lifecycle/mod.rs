//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (app):
//!     Validate config → Bind listeners → Register servers → Service::run
//!
//! Service::run (service.rs):
//!     Idle → Running: spawn one serve task per server
//!     Running → Draining: signal, caller cancellation, or a serve error
//!     Draining → Stopped: shut every server down against one fresh deadline
//!
//! Per server (shutdown.rs):
//!     begin drain → in-flight requests finish → stopped
//!     deadline passed → force close
//! ```
//!
//! # Design Decisions
//! - Run-phase errors are returned, shutdown-phase errors are only logged
//! - The drain deadline is fresh, so a cancelled run context never starves it
//! - The set of servers is fixed before `run` starts

pub mod server;
pub mod service;
pub mod shutdown;
pub mod signals;

pub use server::{Server, ServerError, ServerKind};
pub use service::{Service, ServiceError, ServiceState};
pub use shutdown::Drain;
