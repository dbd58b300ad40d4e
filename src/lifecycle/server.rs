//! The server abstraction shared by the HTTP, gRPC and admin listeners.

use std::fmt;
use std::net::SocketAddr;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;

use crate::net::ListenerError;

/// What a server speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerKind {
    Http,
    Grpc,
    Admin,
}

impl ServerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerKind::Http => "http",
            ServerKind::Grpc => "grpc",
            ServerKind::Admin => "admin",
        }
    }
}

impl fmt::Display for ServerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("{kind} server {name}: {source}")]
    Serve {
        name: String,
        kind: ServerKind,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} server is already serving")]
    AlreadyServing(String),

    #[error("{0} server did not drain before the deadline")]
    DrainTimeout(String),

    #[error("build reflection service: {0}")]
    Reflection(#[from] tonic_reflection::server::Error),
}

/// A named network listener owned by the [`Service`](crate::lifecycle::Service).
///
/// `serve` runs until the listener is closed and returns `Ok` when that was
/// intentional. `shutdown` drains within `deadline`, forces the listener
/// closed when the deadline passes, and is safe to call more than once.
#[async_trait]
pub trait Server: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> ServerKind;

    fn addr(&self) -> SocketAddr;

    async fn serve(&self) -> Result<(), ServerError>;

    async fn shutdown(&self, deadline: Instant) -> Result<(), ServerError>;
}
