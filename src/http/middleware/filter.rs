//! Path filter for skipping middleware on internal endpoints.

use std::collections::HashSet;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::Request;
use futures_util::future::Either;
use tower::{Layer, Service};

/// Paths (HTTP) or full method names (gRPC) that bypass a layer.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    exact: Arc<HashSet<String>>,
    prefixes: Arc<Vec<String>>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.exact).insert(path.into());
        self
    }

    pub fn paths<I, P>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        paths.into_iter().fold(self, Filter::path)
    }

    /// Exclude every path under `prefix`.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.prefixes).push(prefix.into());
        self
    }

    pub fn excludes(&self, path: &str) -> bool {
        self.exact.contains(path) || self.prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

/// Applies `layer` only to requests the filter does not exclude.
#[derive(Debug, Clone)]
pub struct Filtered<L> {
    layer: L,
    filter: Filter,
}

impl<L> Filtered<L> {
    pub fn new(layer: L, filter: Filter) -> Self {
        Self { layer, filter }
    }
}

impl<L, S> Layer<S> for Filtered<L>
where
    L: Layer<S>,
    S: Clone,
{
    type Service = FilteredService<L::Service, S>;

    fn layer(&self, inner: S) -> Self::Service {
        FilteredService {
            wrapped: self.layer.layer(inner.clone()),
            bypass: inner,
            filter: self.filter.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilteredService<W, S> {
    wrapped: W,
    bypass: S,
    filter: Filter,
}

impl<W, S, B> Service<Request<B>> for FilteredService<W, S>
where
    W: Service<Request<B>>,
    S: Service<Request<B>, Response = W::Response, Error = W::Error>,
{
    type Response = W::Response;
    type Error = W::Error;
    type Future = Either<W::Future, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        match self.wrapped.poll_ready(cx) {
            Poll::Ready(Ok(())) => self.bypass.poll_ready(cx),
            other => other,
        }
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        if self.filter.excludes(req.uri().path()) {
            Either::Right(self.bypass.call(req))
        } else {
            Either::Left(self.wrapped.call(req))
        }
    }
}
