//! Request ID assignment.
//!
//! # Design Decisions
//! - Always minted server-side; inbound `X-Request-Id` values are ignored
//! - Assigned once, before logging, so every log line carries it
//! - Echoed back in the `X-Request-Id` response header

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::Span;

use crate::context::{RequestContext, RequestId};

pub const X_REQUEST_ID: &str = "x-request-id";

pub async fn assign(mut req: Request, next: Next) -> Response {
    let id = match req.extensions_mut().get_mut::<RequestContext>() {
        Some(ctx) => ctx.assign_request_id(RequestId::new()),
        None => RequestId::new(),
    };
    Span::current().record("request_id", tracing::field::display(id));

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}
