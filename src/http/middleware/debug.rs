//! Header dumps, active only while debug logging is switched on.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::http::middleware::MiddlewareState;

pub async fn hook(State(state): State<MiddlewareState>, req: Request, next: Next) -> Response {
    if !state.logs.debug_enabled() {
        return next.run(req).await;
    }

    tracing::debug!(headers = ?req.headers(), "Request headers");
    let response = next.run(req).await;
    tracing::debug!(
        status = response.status().as_u16(),
        headers = ?response.headers(),
        "Response headers"
    );
    response
}
