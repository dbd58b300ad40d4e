//! Explicit telemetry context.
//!
//! Built once at startup, cloned into every server and middleware, and shut
//! down by whoever built it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderMap;
use metrics_exporter_prometheus::{PrometheusHandle, PrometheusRecorder};
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::metrics as names;
use crate::observability::tracing::{tracer_provider, HeaderExtractor};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub service_version: String,
    /// OTLP/gRPC collector. Spans stay local when unset.
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "pikcel".to_string(),
            service_version: crate::version::VERSION.to_string(),
            otlp_endpoint: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("build OTLP exporter: {0}")]
    Exporter(#[from] opentelemetry_otlp::ExporterBuildError),

    #[error("shut down tracer provider: {0}")]
    Shutdown(#[from] opentelemetry_sdk::error::OTelSdkError),
}

/// Tracer provider, metrics recorder and propagator for one service.
#[derive(Clone)]
pub struct Telemetry {
    inner: Arc<Inner>,
}

struct Inner {
    service_name: String,
    provider: SdkTracerProvider,
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
    propagator: TraceContextPropagator,
}

impl fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Telemetry")
            .field("service_name", &self.inner.service_name)
            .finish_non_exhaustive()
    }
}

impl Telemetry {
    pub fn init(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        let provider = tracer_provider(config)?;
        let recorder = names::recorder();
        let handle = recorder.handle();

        let telemetry = Self {
            inner: Arc::new(Inner {
                service_name: config.service_name.clone(),
                provider,
                recorder,
                handle,
                propagator: TraceContextPropagator::new(),
            }),
        };

        telemetry.record(|| {
            names::describe();
            metrics::gauge!(names::UP).set(1.0);
        });

        Ok(telemetry)
    }

    /// Tracer for the `tracing-opentelemetry` layer.
    pub fn tracer(&self) -> SdkTracer {
        self.inner.provider.tracer(self.inner.service_name.clone())
    }

    /// Remote parent context carried in W3C `traceparent` headers.
    pub fn extract_context(&self, headers: &HeaderMap) -> opentelemetry::Context {
        self.inner.propagator.extract(&HeaderExtractor(headers))
    }

    /// Run `f` with this service's recorder as the metrics target.
    pub fn record<T>(&self, f: impl FnOnce() -> T) -> T {
        metrics::with_local_recorder(&self.inner.recorder, f)
    }

    pub fn record_request(&self, server: &str, method: &str, status: u16, elapsed: Duration) {
        let (server, method, status) = (server.to_string(), method.to_string(), status.to_string());
        self.record(|| {
            metrics::counter!(
                names::HTTP_REQUESTS_TOTAL,
                "server" => server.clone(),
                "method" => method.clone(),
                "status" => status.clone()
            )
            .increment(1);
            metrics::histogram!(
                names::HTTP_REQUEST_DURATION_SECONDS,
                "server" => server,
                "method" => method,
                "status" => status
            )
            .record(elapsed.as_secs_f64());
        });
    }

    pub fn record_panic(&self, source: &str) {
        let source = source.to_string();
        self.record(|| {
            metrics::counter!(names::PANICS_RECOVERED_TOTAL, "panic_source" => source).increment(1);
        });
    }

    /// Prometheus text exposition of every recorded metric.
    pub fn render_metrics(&self) -> String {
        self.inner.handle.render()
    }

    /// Flush and stop span export.
    pub fn shutdown(&self) -> Result<(), TelemetryError> {
        self.record(|| metrics::gauge!(names::UP).set(0.0));
        self.inner.provider.shutdown()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn metrics_stay_on_the_local_recorder() {
        let telemetry = Telemetry::init(&TelemetryConfig::default()).unwrap();
        telemetry.record_panic("api/v1/canvas");
        telemetry.record_request("pikcel", "GET", 200, Duration::from_millis(3));

        let rendered = telemetry.render_metrics();
        assert!(rendered.contains("panics_recovered_total{panic_source=\"api/v1/canvas\"} 1"));
        assert!(rendered.contains("http_requests_total"));
        assert!(rendered.contains("up 1"));

        let other = Telemetry::init(&TelemetryConfig::default()).unwrap();
        assert!(!other.render_metrics().contains("panics_recovered_total{"));
    }

    #[tokio::test]
    async fn extracts_w3c_parent() {
        use opentelemetry::trace::TraceContextExt;

        let telemetry = Telemetry::init(&TelemetryConfig::default()).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            "traceparent",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"
                .parse()
                .unwrap(),
        );

        let cx = telemetry.extract_context(&headers);
        let span = cx.span();
        assert_eq!(
            span.span_context().trace_id().to_string(),
            "4bf92f3577b34da6a3ce929d0e0e4736"
        );
    }
}
