//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (tracing events, runtime debug toggle)
//!     → metrics.rs (counters, gauges, histograms)
//!     → tracing.rs (OpenTelemetry spans, W3C context propagation)
//!
//! telemetry.rs bundles the tracer provider and metrics recorder into one
//! explicitly constructed `Telemetry` value handed to every server.
//!
//! Consumers:
//!     → stdout (pretty on a terminal, JSON otherwise)
//!     → admin /metrics (Prometheus scrape)
//!     → OTLP collector (optional)
//! ```
//!
//! # Design Decisions
//! - No process-wide telemetry singleton; components receive `Telemetry`
//! - Request ID flows through every request span
//! - Exporting spans is optional; local spans always exist for log context

pub mod logging;
pub mod metrics;
pub mod telemetry;
pub mod tracing;

pub use logging::{LogHandle, LoggingError};
pub use telemetry::{Telemetry, TelemetryConfig, TelemetryError};
