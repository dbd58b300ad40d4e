//! The canvas handler.

use async_trait::async_trait;

use crate::api::{Api, ApiError, Canvas, CanvasId};
use crate::context::RequestContext;
use crate::health::{HealthCheck, HealthTarget};

pub const DEFAULT_WIDTH: i32 = 100;
pub const DEFAULT_HEIGHT: i32 = 100;

#[derive(Debug, Clone, Default)]
pub struct Handler;

impl Handler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Api for Handler {
    async fn canvas_get(&self, _ctx: &RequestContext) -> Result<Canvas, ApiError> {
        Ok(Canvas {
            id: CanvasId::new(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        })
    }
}

impl HealthTarget for Handler {
    fn health_checks(&self) -> Vec<HealthCheck> {
        vec![HealthCheck::new("handler:api", || async { Ok(()) })]
    }
}
