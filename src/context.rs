//! Request-scoped context.
//!
//! Every inbound request gets one [`RequestContext`], built by the
//! middleware chain and stored in the request's extensions. Handlers and
//! endpoint middleware receive it by parameter.

use std::sync::Arc;

use axum::http::Method;
use tracing::Span;

use crate::idgen::{self, Id};

pub type RequestId = Id<idgen::Request>;

/// Static facts about a request, fixed once routing starts.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    /// Server that accepted the request.
    pub server: Arc<str>,
    pub method: Method,
    /// Path for HTTP, `/package.Service/Method` for gRPC.
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    info: Arc<RequestInfo>,
    request_id: Option<RequestId>,
    span: Span,
}

impl RequestContext {
    pub fn new(info: RequestInfo) -> Self {
        Self {
            info: Arc::new(info),
            request_id: None,
            span: Span::none(),
        }
    }

    /// Context for work that did not arrive over a listener.
    pub fn detached(server: &str) -> Self {
        let mut ctx = Self::new(RequestInfo {
            server: server.into(),
            method: Method::GET,
            path: String::new(),
        });
        ctx.assign_request_id(RequestId::new());
        ctx
    }

    pub fn info(&self) -> &RequestInfo {
        &self.info
    }

    pub fn request_id(&self) -> Option<RequestId> {
        self.request_id
    }

    /// The request's logging span, or a disabled span before logging runs.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Set the request ID. Later calls keep the first ID.
    pub fn assign_request_id(&mut self, id: RequestId) -> RequestId {
        *self.request_id.get_or_insert(id)
    }

    pub(crate) fn set_span(&mut self, span: Span) {
        self.span = span;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_is_assigned_once() {
        let mut ctx = RequestContext::new(RequestInfo {
            server: "pikcel".into(),
            method: Method::GET,
            path: "/api/v1/canvas".into(),
        });
        assert!(ctx.request_id().is_none());

        let first = ctx.assign_request_id(RequestId::new());
        let second = ctx.assign_request_id(RequestId::new());
        assert_eq!(first, second);
        assert_eq!(ctx.request_id(), Some(first));
    }
}
