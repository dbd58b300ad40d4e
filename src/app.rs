//! Service assembly.
//!
//! # Startup order
//! ```text
//! bind HTTP (port) → bind gRPC (port + 1) → bind admin (admin port)
//!     → Handler wrapped in Endpoints, mounted on HTTP and gRPC
//!     → admin aggregates health of handler, HTTP and gRPC
//!     → Service owns all three servers
//! ```
//!
//! Any bind failure aborts startup before a server runs.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::admin::AdminServer;
use crate::api::Endpoints;
use crate::config::ServiceConfig;
use crate::grpc::GrpcServer;
use crate::handler::Handler;
use crate::http::routes::api_router;
use crate::http::HttpServer;
use crate::lifecycle::{Server, ServerError, Service, ServiceError, ServiceState};
use crate::observability::{LogHandle, Telemetry};

pub struct App {
    service: Service,
    http_addr: SocketAddr,
    grpc_addr: SocketAddr,
    admin_addr: SocketAddr,
}

impl App {
    pub async fn build(
        config: &ServiceConfig,
        telemetry: Telemetry,
        logs: LogHandle,
    ) -> Result<Self, ServerError> {
        let handler = Handler::new();
        let api = Endpoints::wrap(Arc::new(handler.clone()), logs.clone());

        let mut http = HttpServer::bind(
            &config.name,
            config.http_addr(),
            telemetry.clone(),
            logs.clone(),
        )
        .await?
        .with_request_timeout(config.request_timeout());
        http.register_handler(api_router(api.clone()));

        let mut grpc = GrpcServer::bind(
            &config.name,
            config.grpc_addr(),
            telemetry.clone(),
            logs.clone(),
        )
        .await?;
        grpc.register_api(api).await;

        let mut admin = AdminServer::bind(config.admin_addr(), telemetry, logs).await?;
        admin.administer(&[&handler, &http, &grpc]);

        let http_addr = http.local_addr();
        let grpc_addr = grpc.local_addr();
        let admin_addr = admin.local_addr();

        let servers: Vec<Arc<dyn Server>> = vec![Arc::new(http), Arc::new(grpc), Arc::new(admin)];
        let service = Service::new(servers).with_shutdown_timeout(config.shutdown_timeout());

        Ok(Self {
            service,
            http_addr,
            grpc_addr,
            admin_addr,
        })
    }

    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    pub fn grpc_addr(&self) -> SocketAddr {
        self.grpc_addr
    }

    pub fn admin_addr(&self) -> SocketAddr {
        self.admin_addr
    }

    pub fn state(&self) -> watch::Receiver<ServiceState> {
        self.service.state()
    }

    /// Leave OS signals to the caller.
    pub fn without_signal_handling(mut self) -> Self {
        self.service = self.service.without_signal_handling();
        self
    }

    pub async fn run(self, cancel: CancellationToken) -> Result<(), ServiceError> {
        tracing::info!(
            http = %self.http_addr,
            grpc = %self.grpc_addr,
            admin = %self.admin_addr,
            "Service starting"
        );
        self.service.run(cancel).await
    }
}
