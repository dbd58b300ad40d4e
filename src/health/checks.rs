//! Network health probes for the servers themselves.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use tonic::transport::Channel;
use tonic_health::pb::health_check_response::ServingStatus;
use tonic_health::pb::health_client::HealthClient;
use tonic_health::pb::HealthCheckRequest;

use crate::health::HealthCheck;

/// Wildcard binds are probed through loopback.
pub(crate) fn probe_addr(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => {
            SocketAddr::new(Ipv4Addr::LOCALHOST.into(), addr.port())
        }
        IpAddr::V6(ip) if ip.is_unspecified() => {
            SocketAddr::new(Ipv6Addr::LOCALHOST.into(), addr.port())
        }
        _ => addr,
    }
}

/// `http:<name>`: GET `/healthz`, failing on transport errors or 5xx.
pub fn http_check(name: &str, addr: SocketAddr) -> HealthCheck {
    let url = format!("http://{}/healthz", probe_addr(addr));
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap_or_default();

    HealthCheck::new(format!("http:{name}"), move || {
        let client = client.clone();
        let url = url.clone();
        async move {
            let response = client.get(&url).send().await.map_err(|e| e.to_string())?;
            if response.status().is_server_error() {
                return Err(format!("unhealthy status {}", response.status()));
            }
            Ok(())
        }
    })
}

/// `grpc:<name>`: `grpc.health.v1.Health/Check` for the whole server.
pub fn grpc_check(name: &str, addr: SocketAddr) -> HealthCheck {
    let uri = format!("http://{}", probe_addr(addr));

    HealthCheck::new(format!("grpc:{name}"), move || {
        let uri = uri.clone();
        async move {
            let channel = Channel::from_shared(uri)
                .map_err(|e| e.to_string())?
                .connect_timeout(Duration::from_secs(5))
                .timeout(Duration::from_secs(5))
                .connect()
                .await
                .map_err(|e| e.to_string())?;
            let mut client = HealthClient::new(channel);
            let response = client
                .check(HealthCheckRequest {
                    service: String::new(),
                })
                .await
                .map_err(|status| status.message().to_string())?;

            match response.into_inner().status() {
                ServingStatus::Serving => Ok(()),
                other => Err(format!("serving status {}", other.as_str_name())),
            }
        }
    })
}
