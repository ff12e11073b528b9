//! Response body buffering and replay.
//!
//! Rendering a response body for a log line must not drain the body the caller is going to read.
//! The logging service therefore only accepts responses whose body implements [`ReplayableBody`],
//! and this module provides [`BufferResponseLayer`] to turn any streaming transport into one that
//! yields fully buffered `Response<Bytes>` values.

use bytes::Bytes;
use http::{Request, Response};
use http_body_util::BodyExt;
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tower::{Layer, Service};
use tracing::error;

use crate::error::{BoxError, Error, Result};

/// A response body that can be read by reference, any number of times.
///
/// The logging service calls [`replay`](ReplayableBody::replay) while the response is still owned
/// by the exchange, so implementations must leave the body intact for the caller.
pub trait ReplayableBody {
    /// Whether the body content may be rendered at all.
    ///
    /// Stand-in bodies used by test doubles return `false`; their responses are then logged with
    /// length and content type only.
    fn can_replay(&self) -> bool {
        true
    }

    /// Returns the full body content without consuming it.
    fn replay(&self) -> Result<Bytes>;
}

impl ReplayableBody for Bytes {
    fn replay(&self) -> Result<Bytes> {
        Ok(self.clone())
    }
}

impl ReplayableBody for Vec<u8> {
    fn replay(&self) -> Result<Bytes> {
        Ok(Bytes::copy_from_slice(self))
    }
}

impl ReplayableBody for String {
    fn replay(&self) -> Result<Bytes> {
        Ok(Bytes::copy_from_slice(self.as_bytes()))
    }
}

/// Layer that buffers response bodies of the wrapped transport into [`Bytes`].
///
/// Install it below [`ClientLoggingLayer`](crate::ClientLoggingLayer) so that the logging service
/// sees replayable responses, or use [`ClientLoggingLayer::buffered`](crate::ClientLoggingLayer::buffered).
#[derive(Debug, Clone, Copy, Default)]
pub struct BufferResponseLayer;

impl BufferResponseLayer {
    /// Creates the layer; it has no configuration.
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for BufferResponseLayer {
    type Service = BufferResponse<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BufferResponse { inner }
    }
}

/// Service that collects the whole response body before handing the response back.
#[derive(Debug, Clone)]
pub struct BufferResponse<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for BufferResponse<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Error: Into<BoxError>,
    S::Future: Send + 'static,
    ResBody: http_body::Body + Send + 'static,
    ResBody::Data: Send,
    ResBody::Error: Into<BoxError>,
{
    type Response = Response<Bytes>;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let future = self.inner.call(request);

        Box::pin(async move {
            let response = future.await.map_err(Into::into)?;
            let (parts, body) = response.into_parts();

            let collected = body.collect().await.map_err(|e| {
                let e: BoxError = e.into();
                error!(error = %e, "Failed to buffer response body");
                Error::Buffer(e)
            })?;

            Ok(Response::from_parts(parts, collected.to_bytes()))
        })
    }
}
