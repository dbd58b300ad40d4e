//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tonic::transport::Channel;

use pikcel::lifecycle::{ServiceError, ServiceState};
use pikcel::observability::{LogHandle, Telemetry, TelemetryConfig};
use pikcel::{App, ServiceConfig};

/// A running service on ephemeral loopback ports.
pub struct TestApp {
    pub http: SocketAddr,
    pub grpc: SocketAddr,
    pub admin: SocketAddr,
    pub telemetry: Telemetry,
    pub state: watch::Receiver<ServiceState>,
    cancel: CancellationToken,
    handle: JoinHandle<Result<(), ServiceError>>,
}

pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        admin_port: 0,
        shutdown_timeout_secs: 5,
        ..ServiceConfig::default()
    }
}

pub fn telemetry() -> Telemetry {
    Telemetry::init(&TelemetryConfig::default()).unwrap()
}

pub async fn start_app() -> TestApp {
    let telemetry = telemetry();
    let app = App::build(&test_config(), telemetry.clone(), LogHandle::detached(false))
        .await
        .unwrap()
        .without_signal_handling();

    let mut state = app.state();
    let (http, grpc, admin) = (app.http_addr(), app.grpc_addr(), app.admin_addr());
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(app.run(cancel.clone()));

    state
        .wait_for(|s| *s == ServiceState::Running)
        .await
        .unwrap();

    TestApp {
        http,
        grpc,
        admin,
        telemetry,
        state,
        cancel,
        handle,
    }
}

impl TestApp {
    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.http, path)
    }

    pub fn admin_url(&self, path: &str) -> String {
        format!("http://{}{}", self.admin, path)
    }

    pub fn grpc_url(&self) -> String {
        format!("http://{}", self.grpc)
    }

    pub async fn grpc_channel(&self) -> Channel {
        Channel::from_shared(self.grpc_url())
            .unwrap()
            .connect()
            .await
            .unwrap()
    }

    /// Cancel the service and wait for it to stop.
    pub async fn stop(self) -> (Result<(), ServiceError>, ServiceState) {
        self.cancel.cancel();
        let result = tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("service did not stop in time")
            .expect("service task panicked");
        let state = *self.state.borrow();
        (result, state)
    }
}

/// Send a bare HTTP/1.1 GET and return everything the server wrote back.
pub async fn raw_get(addr: SocketAddr, path: &str) -> Vec<u8> {
    let mut socket = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    socket.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    let _ = tokio::time::timeout(Duration::from_secs(5), socket.read_to_end(&mut response)).await;
    response
}
