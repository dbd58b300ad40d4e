//! gRPC server: application service, health, reflection.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;
use tonic::service::Routes;
use tonic_health::server::HealthReporter;
use tonic_health::ServingStatus;

use crate::api::SharedApi;
use crate::grpc::descriptor;
use crate::grpc::service::GrpcApi;
use crate::health::{grpc_check, HealthCheck, HealthTarget};
use crate::http::middleware::{self, FaultResponder, Filter, MiddlewareState};
use crate::lifecycle::{Server, ServerError, ServerKind};
use crate::net::Listener;
use crate::observability::{LogHandle, Telemetry};

/// Methods that only get panic recovery.
pub const EXCLUDED_METHODS: [&str; 4] = [
    "/grpc.health.v1.Health/Check",
    "/grpc.health.v1.Health/Watch",
    "/grpc.reflection.v1.ServerReflection/ServerReflectionInfo",
    "/grpc.reflection.v1alpha.ServerReflection/ServerReflectionInfo",
];

pub struct GrpcServer {
    listener: Listener,
    routes: Routes,
    health: HealthReporter,
    state: MiddlewareState,
}

impl GrpcServer {
    /// Bind and install the health and reflection services.
    pub async fn bind(
        name: &str,
        addr: SocketAddr,
        telemetry: Telemetry,
        logs: LogHandle,
    ) -> Result<Self, ServerError> {
        let listener = Listener::bind(name, ServerKind::Grpc, addr).await?;
        let (health, health_service) = tonic_health::server::health_reporter();

        let reflection_v1 = reflection().build_v1()?;
        let reflection_v1alpha = reflection().build_v1alpha()?;

        let routes = Routes::new(health_service)
            .add_service(reflection_v1)
            .add_service(reflection_v1alpha);

        let state = MiddlewareState {
            server: Arc::from(name),
            telemetry,
            logs,
            fault: FaultResponder::Grpc,
        };

        Ok(Self {
            listener,
            routes,
            health,
            state,
        })
    }

    /// Mount the `pikcel.v1.Api` service over `api`.
    pub async fn register_api(&mut self, api: SharedApi) {
        let service = GrpcApi::new(api, self.listener.name()).into_service();
        self.health
            .clone()
            .set_serving::<crate::grpc::pb::api_server::ApiServer<GrpcApi>>()
            .await;
        self.routes = std::mem::take(&mut self.routes).add_service(service);
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }
}

fn reflection() -> tonic_reflection::server::Builder<'static> {
    tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(tonic_health::pb::FILE_DESCRIPTOR_SET)
        .register_file_descriptor_set(descriptor::file_descriptor_set())
}

#[async_trait]
impl Server for GrpcServer {
    fn name(&self) -> &str {
        self.listener.name()
    }

    fn kind(&self) -> ServerKind {
        ServerKind::Grpc
    }

    fn addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    async fn serve(&self) -> Result<(), ServerError> {
        let router = self.routes.clone().prepare().into_axum_router();
        let router = middleware::apply(
            router,
            self.state.clone(),
            Filter::new().paths(EXCLUDED_METHODS),
        );
        self.listener.serve(router).await
    }

    async fn shutdown(&self, deadline: Instant) -> Result<(), ServerError> {
        if !self.listener.is_draining() {
            self.health
                .clone()
                .set_service_status("", ServingStatus::NotServing)
                .await;
        }
        self.listener.shutdown(deadline).await
    }
}

impl HealthTarget for GrpcServer {
    fn health_checks(&self) -> Vec<HealthCheck> {
        vec![grpc_check(self.name(), self.addr())]
    }
}
