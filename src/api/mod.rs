//! The `api` service definition.
//!
//! # Data Flow
//! ```text
//! HTTP GET /api/v1/canvas ─┐
//!                          ├─→ Endpoints (span, logs, error reporting)
//! gRPC Api/CanvasGet ──────┘      → Handler (business logic)
//! ```
//!
//! Both transports call the same [`Api`] trait object; each transport
//! adapter maps `ApiError` onto its own wire status.

pub mod endpoint;
pub mod error;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::RequestContext;
use crate::idgen::{self, Id};

pub use endpoint::Endpoints;
pub use error::{ApiError, ErrorBody, ErrorCode};

pub const API_NAME: &str = "api";
pub const API_VERSION: &str = "v1";

pub type CanvasId = Id<idgen::Canvas>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    pub id: CanvasId,
    pub width: i32,
    pub height: i32,
}

#[async_trait]
pub trait Api: Send + Sync {
    async fn canvas_get(&self, ctx: &RequestContext) -> Result<Canvas, ApiError>;
}

pub type SharedApi = Arc<dyn Api>;
