//! TCP listener with graceful drain.
//!
//! # Responsibilities
//! - Bind to the configured address at construction
//! - Serve an axum `Router` (plain HTTP or tonic routes) until drained
//! - Force-close in-flight connections once the drain deadline passes

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as AutoBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use hyper_util::service::TowerToHyperService;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::time::Instant;
use tokio_util::task::TaskTracker;

use crate::lifecycle::{Drain, ServerError, ServerKind};

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read local address: {0}")]
    LocalAddr(#[source] std::io::Error),
}

/// A bound listener that can be served once and drained.
pub struct Listener {
    name: Arc<str>,
    kind: ServerKind,
    local_addr: SocketAddr,
    inner: Mutex<Option<TcpListener>>,
    drain: Drain,
}

impl Listener {
    pub async fn bind(
        name: impl Into<Arc<str>>,
        kind: ServerKind,
        addr: SocketAddr,
    ) -> Result<Self, ListenerError> {
        let name = name.into();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ListenerError::Bind { addr, source })?;
        let local_addr = listener.local_addr().map_err(ListenerError::LocalAddr)?;

        tracing::info!(server = %name, kind = %kind, address = %local_addr, "Listener bound");

        Ok(Self {
            name,
            kind,
            local_addr,
            inner: Mutex::new(Some(listener)),
            drain: Drain::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ServerKind {
        self.kind
    }

    /// The address actually bound, with ephemeral ports resolved.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_draining(&self) -> bool {
        self.drain.is_draining()
    }

    fn take(&self) -> Option<TcpListener> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Serve `router` until drained.
    ///
    /// Every connection is tracked. A graceful drain waits for in-flight
    /// requests to finish, and the forced deadline drops whatever is left.
    pub async fn serve(&self, router: Router) -> Result<(), ServerError> {
        let Some(listener) = self.take() else {
            if self.drain.is_draining() {
                return Ok(());
            }
            return Err(ServerError::AlreadyServing(self.name.to_string()));
        };

        let builder = AutoBuilder::new(TokioExecutor::new());
        let graceful = GracefulShutdown::new();
        let connections = TaskTracker::new();
        let draining = self.drain.signal();
        tokio::pin!(draining);

        let result = loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (socket, remote_addr) = match accepted {
                        Ok(conn) => conn,
                        Err(err) if is_connection_error(&err) => {
                            tracing::debug!(server = %self.name, error = %err, "Accept failed");
                            continue;
                        }
                        Err(source) => break Err(source),
                    };
                    if let Err(err) = socket.set_nodelay(true) {
                        tracing::warn!(
                            server = %self.name,
                            error = %err,
                            "Failed to set TCP_NODELAY"
                        );
                    }

                    let service = TowerToHyperService::new(router.clone());
                    let conn = builder
                        .serve_connection_with_upgrades(TokioIo::new(socket), service)
                        .into_owned();
                    let conn = graceful.watch(conn);
                    let forced = self.drain.forced();
                    let name = self.name.clone();

                    connections.spawn(async move {
                        tokio::select! {
                            result = conn => {
                                if let Err(err) = result {
                                    tracing::debug!(
                                        server = %name,
                                        peer = %remote_addr,
                                        error = %err,
                                        "Connection closed"
                                    );
                                }
                            }
                            _ = forced => {
                                tracing::debug!(
                                    server = %name,
                                    peer = %remote_addr,
                                    "Connection dropped at drain deadline"
                                );
                            }
                        }
                    });
                }
                _ = &mut draining => break Ok(()),
            }
        };

        drop(listener);
        connections.close();

        tokio::select! {
            _ = graceful.shutdown() => {}
            _ = self.drain.forced() => {
                tracing::warn!(server = %self.name, "Drain deadline passed, dropping connections");
            }
        }
        connections.wait().await;
        self.drain.mark_stopped();

        result.map_err(|source| ServerError::Serve {
            name: self.name.to_string(),
            kind: self.kind,
            source,
        })
    }

    /// Drain in-flight requests until `deadline`, then force close.
    pub async fn shutdown(&self, deadline: Instant) -> Result<(), ServerError> {
        self.drain.begin();
        if let Some(unused) = self.take() {
            // Never served: closing the socket is the whole shutdown.
            drop(unused);
            self.drain.mark_stopped();
        }

        self.drain
            .drain(deadline)
            .await
            .map_err(|_| ServerError::DrainTimeout(self.name.to_string()))
    }
}

/// Errors that only affect the connection being accepted.
fn is_connection_error(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::ConnectionReset
    )
}
