//! Admin server.
//!
//! # Routes
//! ```text
//! GET /healthz        aggregated health of every registered target
//! GET /metrics        Prometheus text exposition
//! GET /debug/vars     build and runtime information
//! GET /debug/settings runtime log level (debug mode only)
//! ```

pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::health::{Checker, HealthTarget};
use crate::http::middleware::{self, FaultResponder, Filter, MiddlewareState};
use crate::lifecycle::{Server, ServerError, ServerKind};
use crate::net::Listener;
use crate::observability::{LogHandle, Telemetry};

pub const ADMIN_SERVER_NAME: &str = "admin";

pub struct AdminServer {
    listener: Listener,
    checker: Checker,
    state: MiddlewareState,
}

impl AdminServer {
    pub async fn bind(
        addr: SocketAddr,
        telemetry: Telemetry,
        logs: LogHandle,
    ) -> Result<Self, ServerError> {
        let listener = Listener::bind(ADMIN_SERVER_NAME, ServerKind::Admin, addr).await?;
        Ok(Self {
            listener,
            checker: Checker::new(Vec::new()),
            state: MiddlewareState {
                server: Arc::from(ADMIN_SERVER_NAME),
                telemetry,
                logs,
                fault: FaultResponder::Http,
            },
        })
    }

    /// Aggregate the checks of every target into `/healthz`.
    pub fn administer(&mut self, targets: &[&dyn HealthTarget]) {
        self.checker = Checker::from_targets(targets);
        tracing::info!(
            checks = ?self.checker.names().collect::<Vec<_>>(),
            "Health checks registered"
        );
    }

    pub fn checker(&self) -> &Checker {
        &self.checker
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    pub fn router(&self) -> axum::Router {
        let router = handlers::admin_router(
            self.checker.clone(),
            self.state.telemetry.clone(),
            self.state.logs.clone(),
        );
        middleware::apply(
            router,
            self.state.clone(),
            Filter::new().paths(["/healthz", "/metrics"]).prefix("/debug/"),
        )
    }
}

#[async_trait]
impl Server for AdminServer {
    fn name(&self) -> &str {
        self.listener.name()
    }

    fn kind(&self) -> ServerKind {
        ServerKind::Admin
    }

    fn addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    async fn serve(&self) -> Result<(), ServerError> {
        self.listener.serve(self.router()).await
    }

    async fn shutdown(&self, deadline: Instant) -> Result<(), ServerError> {
        self.listener.shutdown(deadline).await
    }
}
