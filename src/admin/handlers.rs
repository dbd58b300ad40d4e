use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::health::{Checker, HealthReport};
use crate::http::debug::debug_router;
use crate::observability::{LogHandle, Telemetry};

pub fn admin_router(checker: Checker, telemetry: Telemetry, logs: LogHandle) -> Router {
    Router::new()
        .route("/healthz", get(healthz).with_state(checker))
        .route("/metrics", get(metrics).with_state(telemetry))
        .merge(debug_router(logs))
}

pub async fn healthz(State(checker): State<Checker>) -> HealthReport {
    checker.check().await
}

pub async fn metrics(State(telemetry): State<Telemetry>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        telemetry.render_metrics(),
    )
}
