//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with application and internal routes
//! - Wire up the middleware chain and request timeout
//! - Serve on a pre-bound listener until drained
//! - Expose its own liveness check to the admin server

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::routing::get;
use axum::Router;
use tokio::time::Instant;
use tower_http::timeout::TimeoutLayer;

use crate::health::{http_check, HealthCheck, HealthTarget};
use crate::http::debug::debug_router;
use crate::http::middleware::{self, FaultResponder, Filter, MiddlewareState};
use crate::lifecycle::{Server, ServerError, ServerKind};
use crate::net::Listener;
use crate::observability::{LogHandle, Telemetry};

/// HTTP server for the API.
pub struct HttpServer {
    listener: Listener,
    handlers: Router,
    state: MiddlewareState,
    request_timeout: Duration,
}

impl HttpServer {
    pub async fn bind(
        name: &str,
        addr: SocketAddr,
        telemetry: Telemetry,
        logs: LogHandle,
    ) -> Result<Self, ServerError> {
        let listener = Listener::bind(name, ServerKind::Http, addr).await?;

        Ok(Self {
            listener,
            handlers: Router::new(),
            state: MiddlewareState {
                server: Arc::from(name),
                telemetry,
                logs,
                fault: FaultResponder::Http,
            },
            request_timeout: Duration::from_secs(30),
        })
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Mount application routes.
    pub fn register_handler(&mut self, routes: Router) {
        self.handlers = std::mem::take(&mut self.handlers).merge(routes);
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn router(&self) -> Router {
        let router = self
            .handlers
            .clone()
            .layer(TimeoutLayer::new(self.request_timeout))
            .route("/healthz", get(|| async { "OK" }))
            .merge(debug_router(self.state.logs.clone()));

        middleware::apply(
            router,
            self.state.clone(),
            Filter::new().path("/healthz").prefix("/debug/"),
        )
    }
}

#[async_trait]
impl Server for HttpServer {
    fn name(&self) -> &str {
        self.listener.name()
    }

    fn kind(&self) -> ServerKind {
        ServerKind::Http
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

impl HealthTarget for HttpServer {
    fn health_checks(&self) -> Vec<HealthCheck> {
        vec![http_check(self.name(), self.addr())]
    }
}
