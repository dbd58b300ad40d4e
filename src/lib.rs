//! pikcel: canvas service scaffold.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌────────────────────────────────────────────────────┐
//!                 │                      Service                       │
//!                 │         Idle → Running → Draining → Stopped        │
//!                 │                                                    │
//!   :port ───────▶│  HttpServer  ──┐                                   │
//!                 │                ├─▶ middleware ─▶ Endpoints ─▶ Handler
//!   :port+1 ─────▶│  GrpcServer  ──┘   (telemetry, recovery, context,  │
//!                 │                     request ID, logging, debug)    │
//!                 │                                                    │
//!   :admin ──────▶│  AdminServer ─▶ /healthz (Checker over targets)    │
//!                 │                 /metrics, /debug/*                 │
//!                 └────────────────────────────────────────────────────┘
//! ```

pub mod admin;
pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod context;
pub mod grpc;
pub mod handler;
pub mod health;
pub mod http;
pub mod idgen;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod version;

pub use app::App;
pub use config::ServiceConfig;
pub use lifecycle::{Service, ServiceState};
