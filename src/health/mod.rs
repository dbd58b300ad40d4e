//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Each HealthTarget (servers, handler) → Vec<HealthCheck>
//!     → Checker (flat, immutable)
//!
//! GET /healthz on the admin server:
//!     Checker::check → every check concurrently, each with a timeout
//!     → HealthReport (up iff every check passed)
//! ```
//!
//! # Design Decisions
//! - No background polling: checks run on each invocation
//! - A failed check names itself in the report
//! - Checks are registered once and never change afterwards

pub mod checks;

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::future::{join_all, BoxFuture};
use futures_util::FutureExt;
use serde::Serialize;

pub use checks::{grpc_check, http_check};

type CheckFn = dyn Fn() -> BoxFuture<'static, Result<(), String>> + Send + Sync;

/// A named health predicate.
#[derive(Clone)]
pub struct HealthCheck {
    name: String,
    check: Arc<CheckFn>,
}

impl HealthCheck {
    pub fn new<F, Fut>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(move || check().boxed()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, timeout: Duration) -> Result<(), String> {
        match tokio::time::timeout(timeout, (self.check)()).await {
            Ok(result) => result,
            Err(_) => Err(format!("timed out after {timeout:?}")),
        }
    }
}

impl fmt::Debug for HealthCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthCheck").field("name", &self.name).finish()
    }
}

/// Anything that exposes health checks.
pub trait HealthTarget {
    fn health_checks(&self) -> Vec<HealthCheck>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Up,
    Down,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckStatus {
    pub status: Status,
    /// Unix milliseconds when the check finished.
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: Status,
    pub details: BTreeMap<String, CheckStatus>,
}

impl HealthReport {
    pub fn is_up(&self) -> bool {
        self.status == Status::Up
    }
}

impl IntoResponse for HealthReport {
    fn into_response(self) -> Response {
        let code = if self.is_up() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        (code, Json(self)).into_response()
    }
}

/// Aggregates checks from every registered target.
#[derive(Debug, Clone)]
pub struct Checker {
    checks: Arc<[HealthCheck]>,
    timeout: Duration,
}

impl Checker {
    pub fn new(checks: Vec<HealthCheck>) -> Self {
        Self {
            checks: checks.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn from_targets(targets: &[&dyn HealthTarget]) -> Self {
        Self::new(targets.iter().flat_map(|t| t.health_checks()).collect())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.checks.iter().map(HealthCheck::name)
    }

    pub async fn check(&self) -> HealthReport {
        let results = join_all(self.checks.iter().map(|check| async move {
            let result = check.run(self.timeout).await;
            (check.name().to_string(), result)
        }))
        .await;

        let mut status = Status::Up;
        let mut details = BTreeMap::new();
        for (name, result) in results {
            let entry = match result {
                Ok(()) => CheckStatus {
                    status: Status::Up,
                    timestamp: now_ms(),
                    error: None,
                },
                Err(error) => {
                    tracing::warn!(check = %name, error = %error, "Health check failed");
                    status = Status::Down;
                    CheckStatus {
                        status: Status::Down,
                        timestamp: now_ms(),
                        error: Some(error),
                    }
                }
            };
            details.insert(name, entry);
        }

        HealthReport { status, details }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<(&'static str, bool)>);

    impl HealthTarget for Fixed {
        fn health_checks(&self) -> Vec<HealthCheck> {
            self.0
                .iter()
                .map(|&(name, ok)| {
                    HealthCheck::new(name, move || async move {
                        if ok {
                            Ok(())
                        } else {
                            Err("broken".to_string())
                        }
                    })
                })
                .collect()
        }
    }

    #[tokio::test]
    async fn up_when_every_check_passes() {
        let a = Fixed(vec![("a", true)]);
        let b = Fixed(vec![("b", true), ("c", true)]);
        let report = Checker::from_targets(&[&a, &b]).check().await;

        assert!(report.is_up());
        assert_eq!(report.details.len(), 3);
    }

    #[tokio::test]
    async fn one_failure_flips_aggregate_and_is_named() {
        let target = Fixed(vec![("db", true), ("cache", false)]);
        let report = Checker::from_targets(&[&target]).check().await;

        assert_eq!(report.status, Status::Down);
        assert_eq!(report.details["cache"].status, Status::Down);
        assert_eq!(report.details["cache"].error.as_deref(), Some("broken"));
        assert_eq!(report.details["db"].status, Status::Up);
    }

    #[tokio::test]
    async fn no_checks_is_up() {
        assert!(Checker::new(Vec::new()).check().await.is_up());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_check_times_out() {
        let slow = HealthCheck::new("slow", || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        });
        let report = Checker::new(vec![slow])
            .with_timeout(Duration::from_secs(1))
            .check()
            .await;

        assert!(!report.is_up());
        assert!(report.details["slow"]
            .error
            .as_deref()
            .unwrap()
            .starts_with("timed out"));
    }

    #[tokio::test]
    async fn report_json_shape() {
        let failing = HealthCheck::new("http:pikcel", || async { Err("refused".to_string()) });
        let response = Checker::new(vec![failing]).check().await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "down");
        assert_eq!(json["details"]["http:pikcel"]["status"], "down");
        assert_eq!(json["details"]["http:pikcel"]["error"], "refused");
        assert!(json["details"]["http:pikcel"]["timestamp"].is_u64());
    }
}
