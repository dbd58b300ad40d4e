//! Configuration schema definitions.
//!
//! All types derive Serde traits so a resolved configuration can be logged
//! or dumped as JSON.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::observability::telemetry::TelemetryConfig;

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Name reported by the HTTP and gRPC servers.
    pub name: String,

    /// Interface all listeners bind to.
    pub host: IpAddr,

    /// HTTP API port. The gRPC server listens on `port + 1`.
    pub port: u16,

    /// Admin (health, debug, metrics) port.
    pub admin_port: u16,

    /// Verbose logging and the runtime log-level toggle.
    pub debug: bool,

    /// Deadline for draining every server once shutdown starts.
    pub shutdown_timeout_secs: u64,

    /// Per-request timeout on the HTTP API.
    pub request_timeout_secs: u64,

    pub telemetry: TelemetryConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "pikcel".to_string(),
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            admin_port: 9090,
            debug: false,
            shutdown_timeout_secs: 30,
            request_timeout_secs: 30,
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Port for the gRPC server. Port 0 stays ephemeral.
    pub fn grpc_port(&self) -> u16 {
        if self.port == 0 {
            0
        } else {
            self.port.saturating_add(1)
        }
    }

    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn grpc_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.grpc_port())
    }

    pub fn admin_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.admin_port)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
