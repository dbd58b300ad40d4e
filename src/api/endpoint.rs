//! Endpoint middleware around the `Api` implementation.
//!
//! # Order (outer → inner)
//! ```text
//! span       endpoint/api.<Method>
//! logging    call and outcome
//! debug      result payload while debug logging is on
//! errors     request ID attached, recorded on the span
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tracing::field::Empty;
use tracing::{Instrument, Span};

use crate::api::{Api, ApiError, Canvas, SharedApi, API_NAME};
use crate::context::RequestContext;
use crate::observability::LogHandle;

/// Wraps an [`Api`] with per-endpoint instrumentation.
pub struct Endpoints {
    inner: SharedApi,
    logs: LogHandle,
}

impl Endpoints {
    pub fn wrap(inner: SharedApi, logs: LogHandle) -> SharedApi {
        Arc::new(Self { inner, logs })
    }

    fn span(ctx: &RequestContext, method: &'static str) -> Span {
        let parent = if ctx.span().is_none() {
            Span::current()
        } else {
            ctx.span().clone()
        };
        tracing::info_span!(
            parent: &parent,
            "endpoint",
            otel.name = %format!("endpoint/{API_NAME}.{method}"),
            endpoint = method,
            request_id = Empty,
            error = Empty,
            err.name = Empty,
            otel.status_code = Empty,
        )
    }
}

/// Attach the request ID and record the error on the current span.
fn report(ctx: &RequestContext, err: ApiError) -> ApiError {
    let err = match ctx.request_id() {
        Some(id) if err.request_id().is_none() => err.with_request_id(id),
        _ => err,
    };

    let span = Span::current();
    span.record("error", tracing::field::display(&err));
    span.record("err.name", err.code().name());
    span.record("otel.status_code", "ERROR");

    if err.code().is_fault() {
        tracing::error!(err.name = err.code().name(), error = %err, "Endpoint failed");
    } else {
        tracing::warn!(err.name = err.code().name(), error = %err, "Endpoint rejected request");
    }
    err
}

#[async_trait]
impl Api for Endpoints {
    async fn canvas_get(&self, ctx: &RequestContext) -> Result<Canvas, ApiError> {
        let span = Self::span(ctx, "CanvasGet");
        if let Some(id) = ctx.request_id() {
            span.record("request_id", tracing::field::display(id));
        }

        async {
            tracing::debug!("Endpoint called");
            match self.inner.canvas_get(ctx).await {
                Ok(canvas) => {
                    if self.logs.debug_enabled() {
                        tracing::debug!(payload = ?canvas, "Endpoint result");
                    }
                    Ok(canvas)
                }
                Err(err) => Err(report(ctx, err)),
            }
        }
        .instrument(span)
        .await
    }
}
