//! End-to-end tests over real listeners.

use std::collections::HashSet;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use reqwest::StatusCode;
use tokio::time::{Duration, Instant};

use pikcel::grpc::pb::api_client::ApiClient;
use pikcel::grpc::pb::CanvasGetRequest;
use pikcel::http::{abort_connection, HttpServer, X_REQUEST_ID};
use pikcel::lifecycle::{Server, ServiceState};
use pikcel::observability::LogHandle;

mod common;

#[tokio::test]
async fn canvas_over_http_is_fresh_each_call() {
    let app = common::start_app().await;
    let client = reqwest::Client::new();

    let mut ids = HashSet::new();
    for _ in 0..2 {
        let response = client.get(app.http_url("/api/v1/canvas")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[X_REQUEST_ID]
            .to_str()
            .unwrap()
            .starts_with("req_"));

        let canvas: serde_json::Value = response.json().await.unwrap();
        assert_eq!(canvas["width"], 100);
        assert_eq!(canvas["height"], 100);
        let id = canvas["id"].as_str().unwrap().to_string();
        assert!(id.starts_with("cnv_"));
        ids.insert(id);
    }
    assert_eq!(ids.len(), 2);

    let (result, state) = app.stop().await;
    assert!(result.is_ok());
    assert_eq!(state, ServiceState::Stopped);
}

#[tokio::test]
async fn canvas_over_grpc() {
    let app = common::start_app().await;
    let mut client = ApiClient::new(app.grpc_channel().await);

    let first = client.canvas_get(CanvasGetRequest {}).await.unwrap();
    assert!(first
        .metadata()
        .get(X_REQUEST_ID)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("req_"));
    let first = first.into_inner();
    let second = client.canvas_get(CanvasGetRequest {}).await.unwrap().into_inner();

    assert!(first.id.starts_with("cnv_"));
    assert_ne!(first.id, second.id);
    assert_eq!((first.width, first.height), (100, 100));
    assert_eq!((second.width, second.height), (100, 100));

    assert!(app.stop().await.0.is_ok());
}

#[tokio::test]
async fn grpc_health_service_reports_serving() {
    use tonic_health::pb::health_check_response::ServingStatus;
    use tonic_health::pb::health_client::HealthClient;
    use tonic_health::pb::HealthCheckRequest;

    let app = common::start_app().await;
    let mut client = HealthClient::new(app.grpc_channel().await);

    let response = client
        .check(HealthCheckRequest {
            service: "pikcel.v1.Api".to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(response.status(), ServingStatus::Serving);

    assert!(app.stop().await.0.is_ok());
}

#[tokio::test]
async fn admin_aggregates_every_target() {
    let app = common::start_app().await;

    let response = reqwest::get(app.admin_url("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let report: serde_json::Value = response.json().await.unwrap();
    assert_eq!(report["status"], "up");
    for check in ["handler:api", "http:pikcel", "grpc:pikcel"] {
        assert_eq!(report["details"][check]["status"], "up", "{check}");
    }

    let http_healthz = reqwest::get(app.http_url("/healthz")).await.unwrap();
    assert_eq!(http_healthz.status(), StatusCode::OK);
    assert!(http_healthz.headers().get(X_REQUEST_ID).is_none());

    let canvas = reqwest::get(app.http_url("/api/v1/canvas")).await.unwrap();
    assert_eq!(canvas.status(), StatusCode::OK);

    let metrics = reqwest::get(app.admin_url("/metrics"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains("http_requests_total"));

    assert!(app.stop().await.0.is_ok());
}

#[tokio::test]
async fn stopped_service_refuses_connections() {
    let app = common::start_app().await;
    let http = app.http;

    let (result, state) = app.stop().await;
    assert!(result.is_ok());
    assert_eq!(state, ServiceState::Stopped);
    assert!(reqwest::get(format!("http://{http}/healthz")).await.is_err());
}

async fn faulty_server() -> Arc<HttpServer> {
    async fn boom() -> &'static str {
        panic!("connection string: postgres://admin:hunter2@db")
    }

    async fn abort() -> &'static str {
        abort_connection()
    }

    let mut server = HttpServer::bind(
        "faulty",
        "127.0.0.1:0".parse().unwrap(),
        common::telemetry(),
        LogHandle::detached(false),
    )
    .await
    .unwrap();
    server.register_handler(
        Router::new()
            .route("/boom", get(boom))
            .route("/abort", get(abort)),
    );

    let server = Arc::new(server);
    let serving = server.clone();
    tokio::spawn(async move { serving.serve().await });
    server
}

#[tokio::test]
async fn panics_never_leak_and_never_kill_the_server() {
    let server = faulty_server().await;
    let base = format!("http://{}", server.addr());

    let response = reqwest::get(format!("{base}/boom")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.text().await.unwrap();
    assert_eq!(body, "internal server error");
    assert!(!body.contains("hunter2"));

    let response = reqwest::get(format!("{base}/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    server
        .shutdown(Instant::now() + Duration::from_secs(5))
        .await
        .unwrap();
}

#[tokio::test]
async fn connection_abort_writes_no_response() {
    let server = faulty_server().await;

    let raw = common::raw_get(server.addr(), "/abort").await;
    assert!(raw.is_empty(), "unexpected response: {}", String::from_utf8_lossy(&raw));

    let raw = common::raw_get(server.addr(), "/healthz").await;
    assert!(raw.starts_with(b"HTTP/1.1 200"));

    server
        .shutdown(Instant::now() + Duration::from_secs(5))
        .await
        .unwrap();
}
