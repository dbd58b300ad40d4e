//! `/debug/*` endpoints, mounted on both the HTTP and admin servers.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::observability::LogHandle;
use crate::version;

#[derive(Debug, Serialize)]
pub struct DebugVars {
    pub version: &'static str,
    pub commit: &'static str,
    pub os: &'static str,
    pub arch: &'static str,
    pub uptime_secs: u64,
    pub runtime_workers: usize,
    pub debug_logs: bool,
}

#[derive(Debug, Deserialize)]
pub struct SettingsQuery {
    #[serde(rename = "debug-logs")]
    pub debug_logs: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Settings {
    #[serde(rename = "debug-logs")]
    pub debug_logs: bool,
}

/// Debug routes. `/debug/settings` exists only in debug mode.
pub fn debug_router(logs: LogHandle) -> Router {
    let mut router = Router::new().route("/vars", get(vars));
    if logs.debug_mode() {
        router = router.route("/settings", get(settings));
    }
    Router::new().nest("/debug", router.with_state(logs))
}

async fn vars(State(logs): State<LogHandle>) -> Json<DebugVars> {
    Json(DebugVars {
        version: version::VERSION,
        commit: version::COMMIT_SHA,
        os: version::TARGET_OS,
        arch: version::TARGET_ARCH,
        uptime_secs: logs.uptime().as_secs(),
        runtime_workers: tokio::runtime::Handle::current().metrics().num_workers(),
        debug_logs: logs.debug_enabled(),
    })
}

async fn settings(
    State(logs): State<LogHandle>,
    Query(query): Query<SettingsQuery>,
) -> Response {
    let on = match query.debug_logs.as_deref() {
        None => return Json(Settings { debug_logs: logs.debug_enabled() }).into_response(),
        Some("on") => true,
        Some("off") => false,
        Some(other) => {
            let message = format!("debug-logs must be \"on\" or \"off\", got {other:?}");
            return (StatusCode::BAD_REQUEST, message).into_response();
        }
    };

    if let Err(err) = logs.set_debug(on) {
        tracing::error!(error = %err, "Failed to change log level");
        return (StatusCode::INTERNAL_SERVER_ERROR, "failed to change log level").into_response();
    }
    Json(Settings { debug_logs: on }).into_response()
}
