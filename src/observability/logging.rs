//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global `tracing` subscriber
//! - Bridge spans to OpenTelemetry when a tracer is supplied
//! - Switch between info and debug verbosity at runtime
//!
//! # Design Decisions
//! - JSON output when stdout is not a terminal, pretty output otherwise
//! - `RUST_LOG` wins over the `--debug` default
//! - The toggle reloads the filter in place; no restart needed

use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use opentelemetry_sdk::trace::SdkTracer;
use thiserror::Error;
use tokio::time::Instant;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("install subscriber: {0}")]
    Init(#[from] TryInitError),

    #[error("reload log filter: {0}")]
    Reload(#[from] reload::Error),
}

/// Handle to the installed subscriber's verbosity.
#[derive(Clone)]
pub struct LogHandle {
    filter: Option<reload::Handle<EnvFilter, Registry>>,
    enabled: Arc<AtomicBool>,
    mode: bool,
    started: Instant,
}

impl std::fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogHandle")
            .field("debug_mode", &self.mode)
            .field("debug_enabled", &self.debug_enabled())
            .finish()
    }
}

fn directive(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

impl LogHandle {
    /// Install the global subscriber.
    pub fn init(debug: bool, tracer: Option<SdkTracer>) -> Result<Self, LoggingError> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(directive(debug)));
        let (filter, handle) = reload::Layer::new(filter);

        let terminal = std::io::stdout().is_terminal();
        let pretty = terminal.then(|| fmt::layer().pretty());
        let json = (!terminal).then(|| fmt::layer().json().with_current_span(true));
        let otel = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

        tracing_subscriber::registry()
            .with(filter)
            .with(pretty)
            .with(json)
            .with(otel)
            .try_init()?;

        Ok(Self {
            filter: Some(handle),
            enabled: Arc::new(AtomicBool::new(debug)),
            mode: debug,
            started: Instant::now(),
        })
    }

    /// A handle not attached to any subscriber.
    pub fn detached(debug: bool) -> Self {
        Self {
            filter: None,
            enabled: Arc::new(AtomicBool::new(debug)),
            mode: debug,
            started: Instant::now(),
        }
    }

    /// Time since logging was set up at startup.
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Whether the service was started with `--debug`.
    pub fn debug_mode(&self) -> bool {
        self.mode
    }

    /// Whether debug output is currently on.
    pub fn debug_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_debug(&self, on: bool) -> Result<(), LoggingError> {
        if let Some(handle) = &self.filter {
            handle.reload(EnvFilter::new(directive(on)))?;
        }
        self.enabled.store(on, Ordering::Relaxed);
        tracing::info!(debug = on, "Log level changed");
        Ok(())
    }
}
