//! Outermost layer: request span, trace parent, request metrics.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::field::Empty;
use tracing::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::http::middleware::MiddlewareState;

pub async fn trace(State(state): State<MiddlewareState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let span = tracing::info_span!(
        "request",
        otel.name = %format!("{method} {path}"),
        otel.kind = "server",
        otel.status_code = Empty,
        server = %state.server,
        http.request.method = %method,
        url.path = %path,
        http.response.status_code = Empty,
        request_id = Empty,
        panic.recovered = Empty,
        panic.source = Empty,
    );
    let _ = span.set_parent(state.telemetry.extract_context(req.headers()));

    let started = Instant::now();
    let response = next.run(req).instrument(span.clone()).await;
    let status = response.status();

    span.record("http.response.status_code", status.as_u16());
    if status.is_server_error() {
        span.record("otel.status_code", "ERROR");
    }
    state
        .telemetry
        .record_request(&state.server, method.as_str(), status.as_u16(), started.elapsed());

    response
}
