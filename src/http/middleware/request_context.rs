//! Inserts the request-scoped [`RequestContext`].

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::context::{RequestContext, RequestInfo};
use crate::http::middleware::MiddlewareState;

pub async fn populate(
    State(state): State<MiddlewareState>,
    mut req: Request,
    next: Next,
) -> Response {
    let ctx = RequestContext::new(RequestInfo {
        server: state.server.clone(),
        method: req.method().clone(),
        path: req.uri().path().to_string(),
    });
    req.extensions_mut().insert(ctx);
    next.run(req).await
}
