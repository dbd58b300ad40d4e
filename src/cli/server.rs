//! `pikcel server`.

use std::error::Error;
use std::net::{IpAddr, Ipv4Addr};

use clap::Args;
use tokio_util::sync::CancellationToken;

use crate::app::App;
use crate::cli::Globals;
use crate::config::{self, ServiceConfig};
use crate::observability::{LogHandle, Telemetry, TelemetryConfig};

#[derive(Debug, Clone, Args)]
pub struct ServerCmd {
    /// HTTP port; gRPC listens on the next port up
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Admin (health, metrics, debug) port
    #[arg(long, env = "ADMIN_PORT", default_value_t = 9090)]
    pub admin_port: u16,

    /// Interface to bind
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Seconds to drain servers on shutdown
    #[arg(long, env = "SHUTDOWN_TIMEOUT_SECS", default_value_t = 30)]
    pub shutdown_timeout_secs: u64,

    /// OTLP/gRPC collector for spans
    #[arg(long = "otel-endpoint", env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otel_endpoint: Option<String>,
}

impl ServerCmd {
    pub fn config(&self, globals: &Globals) -> ServiceConfig {
        ServiceConfig {
            host: self.host,
            port: self.port,
            admin_port: self.admin_port,
            debug: globals.debug,
            shutdown_timeout_secs: self.shutdown_timeout_secs,
            telemetry: TelemetryConfig {
                otlp_endpoint: self.otel_endpoint.clone(),
                ..TelemetryConfig::default()
            },
            ..ServiceConfig::default()
        }
    }

    pub async fn run(&self, globals: &Globals) -> Result<(), Box<dyn Error>> {
        let config = self.config(globals);
        config::check(&config)?;

        let telemetry = Telemetry::init(&config.telemetry)?;
        let logs = LogHandle::init(config.debug, Some(telemetry.tracer()))?;

        tracing::info!(
            version = crate::version::VERSION,
            port = config.port,
            grpc_port = config.grpc_port(),
            admin_port = config.admin_port,
            debug = config.debug,
            "Configuration loaded"
        );

        let app = match App::build(&config, telemetry.clone(), logs).await {
            Ok(app) => app,
            Err(err) => {
                tracing::error!(error = %err, "Startup failed");
                if let Err(err) = telemetry.shutdown() {
                    tracing::warn!(error = %err, "Telemetry shutdown failed");
                }
                return Err(err.into());
            }
        };

        let result = app.run(CancellationToken::new()).await;

        if let Err(err) = telemetry.shutdown() {
            tracing::warn!(error = %err, "Telemetry shutdown failed");
        }
        match result {
            Ok(()) => {
                tracing::info!("Shutdown complete");
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, "Service failed");
                Err(err.into())
            }
        }
    }
}
