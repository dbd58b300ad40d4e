//! Application routes.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};

use crate::api::{ApiError, Canvas, SharedApi, API_VERSION};
use crate::context::RequestContext;

pub const OPENAPI_DOCUMENT: &str = include_str!("../api/openapi.json");

pub fn api_router(api: SharedApi) -> Router {
    Router::new()
        .route(&format!("/api/{API_VERSION}/canvas"), get(canvas_get))
        .route("/openapi.json", get(openapi))
        .with_state(api)
}

async fn canvas_get(
    State(api): State<SharedApi>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Canvas>, ApiError> {
    api.canvas_get(&ctx).await.map(Json)
}

async fn openapi() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], OPENAPI_DOCUMENT)
}
