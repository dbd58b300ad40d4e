//! Request middleware chain shared by the HTTP, gRPC and admin servers.
//!
//! # Order (outer → inner)
//! ```text
//! telemetry        span + W3C parent + request metrics
//! recovery         panic → generic fault, connection abort re-raised
//! request_context  RequestContext inserted into extensions
//! request_id       RequestId assigned, X-Request-Id response header
//! logging          per-request log span, completion line
//! debug            header dumps while debug logging is on
//! ```
//!
//! Paths matched by the [`Filter`] skip everything except recovery.

pub mod debug;
pub mod filter;
pub mod logging;
pub mod recovery;
pub mod request_context;
pub mod request_id;
pub mod telemetry;

use std::sync::Arc;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use tower::ServiceBuilder;

use crate::observability::{LogHandle, Telemetry};

pub use filter::{Filter, Filtered};
pub use recovery::{abort_connection, AbortHandler, FaultResponder};
pub use request_id::X_REQUEST_ID;

/// Everything the middleware needs, cloned per request.
#[derive(Debug, Clone)]
pub struct MiddlewareState {
    pub server: Arc<str>,
    pub telemetry: Telemetry,
    pub logs: LogHandle,
    pub fault: FaultResponder,
}

/// Wrap every route of `router` in the full chain.
pub fn apply(router: Router, state: MiddlewareState, filter: Filter) -> Router {
    let chain = ServiceBuilder::new()
        .layer(Filtered::new(
            from_fn_with_state(state.clone(), telemetry::trace),
            filter.clone(),
        ))
        .layer(from_fn_with_state(state.clone(), recovery::recover))
        .layer(Filtered::new(
            ServiceBuilder::new()
                .layer(from_fn_with_state(state.clone(), request_context::populate))
                .layer(from_fn(request_id::assign))
                .layer(from_fn(logging::log))
                .layer(from_fn_with_state(state, debug::hook))
                .into_inner(),
            filter,
        ));

    router.layer(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;
    use crate::observability::TelemetryConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Extension;
    use futures_util::FutureExt;
    use std::panic::AssertUnwindSafe;
    use tower::ServiceExt;

    fn state(fault: FaultResponder) -> MiddlewareState {
        MiddlewareState {
            server: "test".into(),
            telemetry: Telemetry::init(&TelemetryConfig::default()).unwrap(),
            logs: LogHandle::detached(false),
            fault,
        }
    }

    async fn boom() -> &'static str {
        panic!("secret database password leaked")
    }

    async fn abort() -> &'static str {
        abort_connection()
    }

    fn router(state: MiddlewareState) -> Router {
        let routes = Router::new()
            .route("/healthz", get(|| async { "ok" }))
            .route(
                "/whoami",
                get(|Extension(ctx): Extension<RequestContext>| async move {
                    ctx.request_id().map(|id| id.to_string()).unwrap_or_default()
                }),
            )
            .route("/boom", get(boom))
            .route("/abort", get(abort));
        apply(routes, state, Filter::new().path("/healthz"))
    }

    fn get_req(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn request_id_reaches_handler_and_response_header() {
        let response = router(state(FaultResponder::Http))
            .oneshot(get_req("/whoami"))
            .await
            .unwrap();

        let header = response.headers()[X_REQUEST_ID].to_str().unwrap().to_string();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(header.starts_with("req_"));
        assert_eq!(body, header.as_bytes());
    }

    #[tokio::test]
    async fn excluded_path_skips_chain() {
        let response = router(state(FaultResponder::Http))
            .oneshot(get_req("/healthz"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(X_REQUEST_ID).is_none());
    }

    #[tokio::test]
    async fn panic_becomes_generic_500_and_is_counted() {
        let state = state(FaultResponder::Http);
        let telemetry = state.telemetry.clone();
        let response = router(state).oneshot(get_req("/boom")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"internal server error");
        assert!(telemetry
            .render_metrics()
            .contains("panics_recovered_total{panic_source=\"GET /boom\"} 1"));
    }

    #[tokio::test]
    async fn grpc_panic_becomes_internal_status() {
        let state = state(FaultResponder::Grpc);
        let telemetry = state.telemetry.clone();
        let response = router(state).oneshot(get_req("/boom")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["grpc-status"], "13");
        assert_eq!(response.headers()["grpc-message"], "internal%20server%20error");
        assert!(telemetry
            .render_metrics()
            .contains("panics_recovered_total{panic_source=\"boom\"} 1"));
    }

    #[tokio::test]
    async fn connection_abort_is_re_raised() {
        let call = router(state(FaultResponder::Http)).oneshot(get_req("/abort"));
        let payload = AssertUnwindSafe(call).catch_unwind().await.unwrap_err();
        assert!(payload.is::<AbortHandler>());
    }
}
