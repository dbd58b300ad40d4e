//! gRPC adapter over the shared [`Api`](crate::api::Api).

use tonic::{Request, Response, Status};

use crate::api::SharedApi;
use crate::context::RequestContext;
use crate::grpc::pb::{self, CanvasGetRequest, CanvasGetResponse};

#[derive(Clone)]
pub struct GrpcApi {
    api: SharedApi,
    server: String,
}

impl GrpcApi {
    pub fn new(api: SharedApi, server: impl Into<String>) -> Self {
        Self {
            api,
            server: server.into(),
        }
    }

    pub fn into_service(self) -> pb::api_server::ApiServer<Self> {
        pb::api_server::ApiServer::new(self)
    }

    fn context<T>(&self, request: &Request<T>) -> RequestContext {
        request
            .extensions()
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(|| RequestContext::detached(&self.server))
    }
}

#[tonic::async_trait]
impl pb::api_server::Api for GrpcApi {
    async fn canvas_get(
        &self,
        request: Request<CanvasGetRequest>,
    ) -> Result<Response<CanvasGetResponse>, Status> {
        let ctx = self.context(&request);
        let canvas = self.api.canvas_get(&ctx).await?;
        Ok(Response::new(canvas.into()))
    }
}
