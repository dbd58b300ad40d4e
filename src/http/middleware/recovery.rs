//! Panic recovery.
//!
//! A panic below this layer is counted, recorded on the request span and
//! turned into a generic fault. The one exception is [`AbortHandler`]: it is
//! re-raised so the connection task unwinds and hyper drops the connection
//! without writing a response.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures_util::FutureExt;
use tracing::Span;

use crate::http::middleware::MiddlewareState;

/// Panic payload meaning "the client went away, drop the connection".
#[derive(Debug, Clone, Copy)]
pub struct AbortHandler;

/// Abandon the current request and its connection.
pub fn abort_connection() -> ! {
    std::panic::panic_any(AbortHandler)
}

/// How a recovered panic is rendered for the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultResponder {
    Http,
    Grpc,
}

impl FaultResponder {
    pub fn respond(self) -> Response {
        match self {
            FaultResponder::Http => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            FaultResponder::Grpc => {
                tonic::Status::internal("internal server error").into_http::<Body>()
            }
        }
    }

    /// Tag identifying the failing route or RPC method.
    fn source(self, req: &Request) -> String {
        match self {
            FaultResponder::Http => format!("{} {}", req.method(), req.uri().path()),
            FaultResponder::Grpc => req.uri().path().trim_start_matches('/').to_string(),
        }
    }
}

pub async fn recover(
    State(state): State<MiddlewareState>,
    req: Request,
    next: Next,
) -> Response {
    let source = state.fault.source(&req);

    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            if payload.is::<AbortHandler>() {
                tracing::debug!(panic.source = %source, "Connection aborted");
                std::panic::resume_unwind(payload);
            }

            let span = Span::current();
            span.record("panic.recovered", true);
            span.record("panic.source", source.as_str());
            span.record("otel.status_code", "ERROR");

            tracing::error!(
                panic.source = %source,
                panic.message = panic_message(payload.as_ref()),
                "Recovered from panic"
            );
            state.telemetry.record_panic(&source);

            state.fault.respond()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
