//! Per-request log span.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::field::Empty;
use tracing::Instrument;

use crate::context::RequestContext;

pub async fn log(mut req: Request, next: Next) -> Response {
    let span = tracing::info_span!(
        "handle",
        request_id = Empty,
        method = %req.method(),
        path = %req.uri().path(),
    );
    if let Some(ctx) = req.extensions_mut().get_mut::<RequestContext>() {
        if let Some(id) = ctx.request_id() {
            span.record("request_id", tracing::field::display(id));
        }
        ctx.set_span(span.clone());
    }

    async move {
        let started = Instant::now();
        let response = next.run(req).await;
        tracing::info!(
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Request completed"
        );
        response
    }
    .instrument(span)
    .await
}
