//! Multi-server orchestration.
//!
//! # Responsibilities
//! - Run every registered server concurrently
//! - Turn the first serve failure into a group-wide drain
//! - Shut every server down concurrently against one deadline
//! - Report run-phase failures and log shutdown-phase failures
//!
//! # Design Decisions
//! - One cancellation token is the only shutdown trigger (signal, caller, error)
//! - A slow server's shutdown never blocks the others
//! - Serve tasks still running after the deadline are aborted

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::lifecycle::server::{Server, ServerError, ServerKind};
use crate::lifecycle::signals;

/// Where the orchestrator is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Idle,
    Running,
    Draining,
    Stopped,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            ServiceState::Idle => "idle",
            ServiceState::Running => "running",
            ServiceState::Draining => "draining",
            ServiceState::Stopped => "stopped",
        };
        f.write_str(state)
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{kind} server {server} failed: {source}")]
    Server {
        server: String,
        kind: ServerKind,
        #[source]
        source: ServerError,
    },

    #[error("server {server} panicked")]
    Panicked { server: String },
}

/// Owns a fixed set of servers and runs them as one unit.
pub struct Service {
    servers: Vec<Arc<dyn Server>>,
    shutdown_timeout: Duration,
    trap_signals: bool,
    state: watch::Sender<ServiceState>,
}

impl Service {
    pub fn new(servers: Vec<Arc<dyn Server>>) -> Self {
        let (state, _) = watch::channel(ServiceState::Idle);
        Self {
            servers,
            shutdown_timeout: Duration::from_secs(30),
            trap_signals: true,
            state,
        }
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Only the caller's token triggers shutdown.
    pub fn without_signal_handling(mut self) -> Self {
        self.trap_signals = false;
        self
    }

    /// Observe state transitions.
    pub fn state(&self) -> watch::Receiver<ServiceState> {
        self.state.subscribe()
    }

    pub fn servers(&self) -> &[Arc<dyn Server>] {
        &self.servers
    }

    /// Run until `cancel` fires, a termination signal arrives, or a server fails.
    ///
    /// Returns the first run-phase error. Shutdown errors are logged only.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), ServiceError> {
        let cancel = cancel.child_token();
        // Releases the signal watcher however `run` returns.
        let _cancel_on_return = cancel.clone().drop_guard();
        let first_error = Mutex::new(None);

        if self.trap_signals {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = signals::shutdown_signal() => cancel.cancel(),
                    _ = cancel.cancelled() => {}
                }
            });
        }

        self.state.send_replace(ServiceState::Running);

        let mut serving = JoinSet::new();
        let mut names = HashMap::new();
        for server in &self.servers {
            let server = server.clone();
            let cancel = cancel.clone();
            let name = server.name().to_string();
            let handle = serving.spawn(async move {
                info!(
                    server = server.name(),
                    kind = %server.kind(),
                    address = %server.addr(),
                    "Server starting"
                );
                let result = server.serve().await;
                if let Err(err) = &result {
                    error!(server = server.name(), error = %err, "Server failed");
                    cancel.cancel();
                }
                result.map_err(|source| ServiceError::Server {
                    server: server.name().to_string(),
                    kind: server.kind(),
                    source,
                })
            });
            names.insert(handle.id(), name);
        }

        let record = |err: ServiceError| {
            let mut slot = first_error.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                *slot = Some(err);
            }
        };
        let settle = |joined: Result<Result<(), ServiceError>, JoinError>| match joined {
            Ok(Ok(())) => {}
            Ok(Err(err)) => record(err),
            Err(err) if err.is_panic() => {
                let server = names.get(&err.id()).cloned().unwrap_or_default();
                error!(server = %server, "Server task panicked");
                record(ServiceError::Panicked { server });
                cancel.cancel();
            }
            Err(_) => {}
        };

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                joined = serving.join_next() => match joined {
                    Some(joined) => settle(joined),
                    None => break,
                },
            }
        }

        self.state.send_replace(ServiceState::Draining);
        let deadline = Instant::now() + self.shutdown_timeout;
        info!(timeout = ?self.shutdown_timeout, "Draining servers");

        let mut stopping = JoinSet::new();
        for server in &self.servers {
            let server = server.clone();
            stopping.spawn(async move {
                match timeout_at(deadline, server.shutdown(deadline)).await {
                    Ok(Ok(())) => info!(server = server.name(), "Server shut down"),
                    Ok(Err(err)) => {
                        error!(server = server.name(), error = %err, "Server shutdown failed")
                    }
                    Err(_) => error!(server = server.name(), "Server shutdown exceeded deadline"),
                }
            });
        }
        while let Some(joined) = stopping.join_next().await {
            if let Err(err) = joined {
                error!(error = %err, "Shutdown task failed");
            }
        }

        let drained = timeout_at(deadline, async {
            while let Some(joined) = serving.join_next().await {
                settle(joined);
            }
        })
        .await;
        if drained.is_err() {
            warn!(remaining = serving.len(), "Serve tasks outlived the deadline, aborting");
            serving.abort_all();
            while serving.join_next().await.is_some() {}
        }

        self.state.send_replace(ServiceState::Stopped);
        info!("Service stopped");

        match first_error.into_inner().unwrap_or_else(PoisonError::into_inner) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Copy)]
    enum Behavior {
        Clean,
        Exit,
        FailServe,
        SlowShutdown,
        PanicServe,
    }

    struct MockServer {
        name: &'static str,
        behavior: Behavior,
        stop: CancellationToken,
        shutdowns: AtomicUsize,
    }

    impl MockServer {
        fn new(name: &'static str, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                name,
                behavior,
                stop: CancellationToken::new(),
                shutdowns: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Server for MockServer {
        fn name(&self) -> &str {
            self.name
        }

        fn kind(&self) -> ServerKind {
            ServerKind::Http
        }

        fn addr(&self) -> SocketAddr {
            SocketAddr::from(([127, 0, 0, 1], 0))
        }

        async fn serve(&self) -> Result<(), ServerError> {
            match self.behavior {
                Behavior::FailServe => Err(ServerError::Serve {
                    name: self.name.to_string(),
                    kind: ServerKind::Http,
                    source: std::io::Error::other("listener closed"),
                }),
                Behavior::PanicServe => panic!("serve blew up"),
                Behavior::Exit => Ok(()),
                _ => {
                    self.stop.cancelled().await;
                    Ok(())
                }
            }
        }

        async fn shutdown(&self, _deadline: Instant) -> Result<(), ServerError> {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
            if let Behavior::SlowShutdown = self.behavior {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            self.stop.cancel();
            Ok(())
        }
    }

    fn service(servers: &[Arc<MockServer>]) -> Service {
        let servers = servers
            .iter()
            .map(|s| s.clone() as Arc<dyn Server>)
            .collect();
        Service::new(servers)
            .with_shutdown_timeout(Duration::from_millis(200))
            .without_signal_handling()
    }

    #[tokio::test]
    async fn cancel_drains_every_server() {
        let a = MockServer::new("a", Behavior::Clean);
        let b = MockServer::new("b", Behavior::Clean);
        let service = service(&[a.clone(), b.clone()]);
        let mut state = service.state();
        assert_eq!(*state.borrow(), ServiceState::Idle);

        let cancel = CancellationToken::new();
        let run = tokio::spawn(service.run(cancel.clone()));

        state
            .wait_for(|s| *s == ServiceState::Running)
            .await
            .unwrap();
        cancel.cancel();

        assert!(run.await.unwrap().is_ok());
        assert_eq!(a.shutdowns.load(Ordering::SeqCst), 1);
        assert_eq!(b.shutdowns.load(Ordering::SeqCst), 1);
        assert_eq!(*state.borrow(), ServiceState::Stopped);
    }

    #[tokio::test]
    async fn servers_exiting_on_their_own_leave_no_tasks_behind() {
        let a = MockServer::new("a", Behavior::Exit);
        let b = MockServer::new("b", Behavior::Exit);
        let servers = vec![a.clone() as Arc<dyn Server>, b.clone() as Arc<dyn Server>];
        let service = Service::new(servers).with_shutdown_timeout(Duration::from_millis(200));
        let state = service.state();

        assert!(service.run(CancellationToken::new()).await.is_ok());
        assert_eq!(*state.borrow(), ServiceState::Stopped);

        let runtime = tokio::runtime::Handle::current();
        tokio::time::timeout(Duration::from_secs(1), async {
            while runtime.metrics().num_alive_tasks() > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("signal watcher outlived the service");
    }

    #[tokio::test]
    async fn serve_error_cancels_group_and_is_returned() {
        let bad = MockServer::new("bad", Behavior::FailServe);
        let good = MockServer::new("good", Behavior::Clean);
        let service = service(&[bad.clone(), good.clone()]);

        let err = service.run(CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, ServiceError::Server { ref server, .. } if server == "bad"));
        assert_eq!(good.shutdowns.load(Ordering::SeqCst), 1);
        assert_eq!(bad.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_shutdown_is_logged_not_returned() {
        let slow = MockServer::new("slow", Behavior::SlowShutdown);
        let fast = MockServer::new("fast", Behavior::Clean);
        let service = service(&[slow.clone(), fast.clone()]);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let started = std::time::Instant::now();
        let result = service.run(cancel).await;

        assert!(result.is_ok());
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(fast.stop.is_cancelled());
        assert!(!slow.stop.is_cancelled());
    }

    #[tokio::test]
    async fn panicking_server_becomes_an_error() {
        let boom = MockServer::new("boom", Behavior::PanicServe);
        let other = MockServer::new("other", Behavior::Clean);
        let service = service(&[boom, other.clone()]);

        let err = service.run(CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, ServiceError::Panicked { ref server } if server == "boom"));
        assert_eq!(other.shutdowns.load(Ordering::SeqCst), 1);
    }
}
