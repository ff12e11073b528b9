//! # rest-tracing
//!
//! A Tower middleware that logs outgoing HTTP client requests and the responses they receive,
//! without changing either of them.
//!
//! ## Features
//!
//! - **Two channels**: sent requests and received responses are logged on separate `tracing`
//!   targets ([`SENT_TARGET`], [`RECEIVED_TARGET`]) so each can be enabled on its own
//! - **Per-request overrides**: an `X-Log-Request` or `X-Log-Response` request header set to
//!   `true` logs that direction at INFO even when DEBUG is off; `false` suppresses it
//! - **Safe bodies**: only textual bodies are rendered, decoded with their declared charset;
//!   everything else is summarized by length and content type
//! - **Header exclusion**: configured headers (credentials, cookies) never reach the logs
//!
//! Logging at DEBUG is switched on like any other target, for example with
//! `RUST_LOG=rest_tracing::sent=debug,rest_tracing::received=debug`.
//!
//! ## Quick Start
//!
//! ```rust
//! use bytes::Bytes;
//! use http::{Request, Response};
//! use rest_tracing::{ClientLoggingConfig, ClientLoggingLayer};
//! use tower::{service_fn, ServiceBuilder, ServiceExt};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! // Any transport that executes a request, here one that answers every call itself
//! let transport = service_fn(|_request: Request<Bytes>| async {
//!     Ok::<_, std::convert::Infallible>(Response::new(Bytes::from_static(b"pong")))
//! });
//!
//! let config = ClientLoggingConfig {
//!     exclude_headers: vec!["Authorization".to_string()],
//!     ..Default::default()
//! };
//! let client = ServiceBuilder::new()
//!     .layer(ClientLoggingLayer::new(config))
//!     .service(transport);
//!
//! let request = Request::get("http://svc/ping")
//!     .header("X-Log-Response", "true")
//!     .body(Bytes::new())?;
//! let response = client.oneshot(request).await?;
//! assert_eq!(response.body(), "pong");
//! # Ok(())
//! # }
//! ```
//!
//! ## Buffering
//!
//! The logging service reads response bodies by reference, so the transport must hand back
//! buffered responses (any body implementing [`ReplayableBody`]). Transports with streaming
//! bodies can be wrapped with [`BufferResponseLayer`], or use [`ClientLoggingLayer::buffered`]
//! which installs both layers in the right order.

use bytes::Bytes;
use http::{HeaderName, Request, Response};
use serde::Deserialize;
use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tower::{layer::util::Stack, Layer, Service};
use tracing::{debug, Level};

pub mod body_wrapper;
pub use body_wrapper::{BufferResponse, BufferResponseLayer, ReplayableBody};

pub mod channel;
pub use channel::{LogChannel, TracingChannel, RECEIVED_TARGET, SENT_TARGET};

pub mod error;
pub use error::{BoxError, Error};

pub mod render;

pub mod types;
pub use types::{EnabledLevels, ExcludedHeaders, LogDecision, LogOverride, RequestSummary};

/// Request header forcing (`true`) or suppressing (`false`) logging of the request itself.
pub const LOG_REQUEST_HEADER: &str = "x-log-request";
/// Request header forcing (`true`) or suppressing (`false`) logging of the response.
pub const LOG_RESPONSE_HEADER: &str = "x-log-response";

/// Configuration of the client logging middleware.
///
/// Deserializes from the same shape as the `client.logging` properties, e.g. from JSON:
///
/// ```rust
/// use rest_tracing::ClientLoggingConfig;
///
/// let config: ClientLoggingConfig =
///     serde_json::from_str(r#"{ "exclude-headers": ["Authorization", "Cookie"] }"#).unwrap();
/// assert!(config.enabled);
/// assert_eq!(config.exclude_headers.len(), 2);
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientLoggingConfig {
    /// Whether to install request/response logging at all
    pub enabled: bool,
    /// Headers that are left out of logged requests and responses (case-insensitive)
    #[serde(alias = "exclude-headers", alias = "excludeHeaders")]
    pub exclude_headers: Vec<String>,
}

impl Default for ClientLoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            exclude_headers: Vec::new(),
        }
    }
}

/// Decides whether to log each direction of an exchange, renders and emits the lines.
///
/// Shared by all clones of a [`ClientLoggingService`]; holds only immutable state.
pub struct ClientLogger {
    request_channel: Arc<dyn LogChannel>,
    response_channel: Arc<dyn LogChannel>,
    excluded: ExcludedHeaders,
}

impl ClientLogger {
    /// Logger writing to the [`TracingChannel`]s.
    pub fn new(excluded: ExcludedHeaders) -> Self {
        Self::with_channels(excluded, TracingChannel::Sent, TracingChannel::Received)
    }

    /// Logger writing to custom channels.
    pub fn with_channels(
        excluded: ExcludedHeaders,
        request_channel: impl LogChannel,
        response_channel: impl LogChannel,
    ) -> Self {
        Self {
            request_channel: Arc::new(request_channel),
            response_channel: Arc::new(response_channel),
            excluded,
        }
    }

    #[cfg(test)]
    pub(crate) fn excluded_headers(&self) -> &ExcludedHeaders {
        &self.excluded
    }

    /// Logs a request about to be sent, if its channel and override headers call for it.
    pub fn log_request(&self, request: &Request<Bytes>) {
        let log_override = LogOverride::from_headers(
            request.headers(),
            &HeaderName::from_static(LOG_REQUEST_HEADER),
        );
        let decision =
            LogDecision::decide(EnabledLevels::of(&*self.request_channel), log_override);

        if let Some(level) = decision.level() {
            let line = render::render_request(
                request.method(),
                request.uri(),
                request.headers(),
                request.body(),
                &self.excluded,
            );
            self.request_channel.log(level, &line);
        }
    }

    /// Logs a received response, if its channel and the request's override header call for it.
    ///
    /// A body that cannot be replayed produces a warning instead of the response line.
    pub fn log_response<B>(&self, request: &RequestSummary, response: &Response<B>)
    where
        B: ReplayableBody,
    {
        let decision = LogDecision::decide(
            EnabledLevels::of(&*self.response_channel),
            request.log_response,
        );
        let Some(level) = decision.level() else {
            return;
        };

        match render::render_response(
            &request.method,
            &request.uri,
            response.status(),
            response.headers(),
            response.body(),
            &self.excluded,
        ) {
            Ok(line) => self.response_channel.log(level, &line),
            Err(e) => self.response_channel.log(
                Level::WARN,
                &format!(
                    "Failed to log response for {} request to {}: {e}",
                    request.method, request.uri
                ),
            ),
        }
    }

    /// Captures what response logging needs before the request is handed to the transport.
    pub fn summarize(request: &Request<Bytes>) -> RequestSummary {
        RequestSummary {
            method: request.method().clone(),
            uri: request.uri().clone(),
            log_response: LogOverride::from_headers(
                request.headers(),
                &HeaderName::from_static(LOG_RESPONSE_HEADER),
            ),
        }
    }
}

impl fmt::Debug for ClientLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientLogger")
            .field("excluded", &self.excluded)
            .finish_non_exhaustive()
    }
}

/// Tower layer for the client logging middleware.
///
/// Wraps a transport service executing `Request<Bytes>` and yielding `Response<B>` with
/// `B: ReplayableBody`.
///
/// # Examples
///
/// ```rust
/// use rest_tracing::{ClientLoggingConfig, ClientLoggingLayer};
///
/// // Disabled layers install a pass-through service
/// let layer = ClientLoggingLayer::new(ClientLoggingConfig {
///     enabled: false,
///     ..Default::default()
/// });
/// assert!(!layer.is_enabled());
/// ```
#[derive(Clone, Debug)]
pub struct ClientLoggingLayer {
    logger: Option<Arc<ClientLogger>>,
}

impl ClientLoggingLayer {
    /// Layer logging to the [`TracingChannel`]s.
    pub fn new(config: ClientLoggingConfig) -> Self {
        Self::with_channels(config, TracingChannel::Sent, TracingChannel::Received)
    }

    /// Layer logging to custom channels.
    pub fn with_channels(
        config: ClientLoggingConfig,
        request_channel: impl LogChannel,
        response_channel: impl LogChannel,
    ) -> Self {
        if !config.enabled {
            debug!("Client request/response logging disabled");
            return Self { logger: None };
        }

        let excluded = ExcludedHeaders::new(&config.exclude_headers);
        debug!(
            excluded_headers = excluded.len(),
            "Client request/response logging enabled"
        );
        Self {
            logger: Some(Arc::new(ClientLogger::with_channels(
                excluded,
                request_channel,
                response_channel,
            ))),
        }
    }

    /// Logging on top of response buffering, for transports with streaming bodies.
    pub fn buffered(config: ClientLoggingConfig) -> Stack<BufferResponseLayer, Self> {
        Stack::new(BufferResponseLayer::new(), Self::new(config))
    }

    /// Whether services built by this layer log anything; `false` means pass-through.
    pub fn is_enabled(&self) -> bool {
        self.logger.is_some()
    }
}

impl<S> Layer<S> for ClientLoggingLayer {
    type Service = ClientLoggingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ClientLoggingService {
            inner,
            logger: self.logger.clone(),
        }
    }
}

/// Tower service implementation for the client logging middleware.
///
/// Request logging happens before the inner service is called, response logging after it
/// resolves and before the response is returned. Errors of the inner service are returned as-is
/// and never logged here.
///
/// Users typically don't interact with this type directly - it's created by
/// [`ClientLoggingLayer`].
#[derive(Clone, Debug)]
pub struct ClientLoggingService<S> {
    inner: S,
    logger: Option<Arc<ClientLogger>>,
}

impl<S, B> Service<Request<Bytes>> for ClientLoggingService<S>
where
    S: Service<Request<Bytes>, Response = Response<B>>,
    S::Error: Send + 'static,
    S::Future: Send + 'static,
    B: ReplayableBody + Send + 'static,
{
    type Response = Response<B>;
    type Error = S::Error;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let Some(logger) = self.logger.clone() else {
            return Box::pin(self.inner.call(request));
        };

        logger.log_request(&request);
        let summary = ClientLogger::summarize(&request);
        let future = self.inner.call(request);

        Box::pin(async move {
            let response = future.await?;
            logger.log_response(&summary, &response);
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Channel with fixed levels that records every line.
    #[derive(Clone, Default)]
    struct RecordingChannel {
        max_level: Option<Level>,
        lines: Arc<Mutex<Vec<(Level, String)>>>,
    }

    impl RecordingChannel {
        fn at(level: Level) -> Self {
            Self {
                max_level: Some(level),
                ..Default::default()
            }
        }

        fn lines(&self) -> Vec<(Level, String)> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl LogChannel for RecordingChannel {
        fn is_enabled(&self, level: Level) -> bool {
            self.max_level.is_some_and(|max| level <= max)
        }

        fn log(&self, level: Level, message: &str) {
            self.lines.lock().unwrap().push((level, message.to_string()));
        }
    }

    struct Unreadable;

    impl ReplayableBody for Unreadable {
        fn replay(&self) -> error::Result<Bytes> {
            Err(Error::BodyRead("socket closed".into()))
        }
    }

    fn logger(sent: &RecordingChannel, received: &RecordingChannel) -> ClientLogger {
        ClientLogger::with_channels(
            ExcludedHeaders::new(["authorization"]),
            sent.clone(),
            received.clone(),
        )
    }

    fn request(headers: &[(&'static str, &'static str)]) -> Request<Bytes> {
        let mut builder = Request::get("http://svc/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Bytes::new()).unwrap()
    }

    #[test]
    fn test_request_logged_at_debug() {
        let sent = RecordingChannel::at(Level::DEBUG);
        let received = RecordingChannel::default();

        logger(&sent, &received).log_request(&request(&[("authorization", "secret")]));

        assert_eq!(
            sent.lines(),
            vec![(
                Level::DEBUG,
                "Sending method=GET request to url=http://svc/json".to_string()
            )]
        );
    }

    #[test]
    fn test_request_forced_at_info() {
        let sent = RecordingChannel::at(Level::INFO);
        let received = RecordingChannel::default();

        logger(&sent, &received).log_request(&request(&[("x-log-request", "true")]));

        let lines = sent.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, Level::INFO);
    }

    #[test]
    fn test_request_suppressed_at_debug() {
        let sent = RecordingChannel::at(Level::DEBUG);
        let received = RecordingChannel::default();

        logger(&sent, &received).log_request(&request(&[("x-log-request", "false")]));

        assert!(sent.lines().is_empty());
    }

    #[test]
    fn test_request_not_logged_at_info_without_override() {
        let sent = RecordingChannel::at(Level::INFO);
        let received = RecordingChannel::default();

        logger(&sent, &received).log_request(&request(&[]));

        assert!(sent.lines().is_empty());
    }

    #[test]
    fn test_response_override_is_independent() {
        let sent = RecordingChannel::at(Level::INFO);
        let received = RecordingChannel::at(Level::INFO);
        let logger = logger(&sent, &received);
        let request = request(&[("x-log-response", "TRUE")]);

        logger.log_request(&request);
        let response = Response::new(Bytes::new());
        logger.log_response(&ClientLogger::summarize(&request), &response);

        assert!(sent.lines().is_empty());
        let lines = received.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, Level::INFO);
        assert!(lines[0]
            .1
            .starts_with("Received status=\"200 OK\" response for method=GET"));
    }

    #[test]
    fn test_response_read_failure_becomes_warning() {
        let sent = RecordingChannel::default();
        let received = RecordingChannel::at(Level::DEBUG);
        let logger = logger(&sent, &received);
        let request = request(&[]);

        let response = Response::builder()
            .header("content-type", "text/plain")
            .body(Unreadable)
            .unwrap();
        logger.log_response(&ClientLogger::summarize(&request), &response);

        let lines = received.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, Level::WARN);
        assert_eq!(
            lines[0].1,
            "Failed to log response for GET request to http://svc/json: \
             failed to read response body: socket closed"
        );
    }

    #[test]
    fn test_config_defaults() {
        let config = ClientLoggingConfig::default();
        assert!(config.enabled);
        assert!(config.exclude_headers.is_empty());

        let config: ClientLoggingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ClientLoggingConfig::default());
    }

    #[test]
    fn test_config_field_names() {
        let config: ClientLoggingConfig =
            serde_json::from_str(r#"{ "enabled": false, "excludeHeaders": ["Cookie"] }"#).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.exclude_headers, vec!["Cookie".to_string()]);

        let config: ClientLoggingConfig =
            serde_json::from_str(r#"{ "exclude_headers": ["Cookie"] }"#).unwrap();
        assert_eq!(config.exclude_headers, vec!["Cookie".to_string()]);
    }

    #[test]
    fn test_layer_excludes_configured_headers() {
        let layer = ClientLoggingLayer::new(ClientLoggingConfig {
            enabled: true,
            exclude_headers: vec!["Authorization".to_string()],
        });

        let logger = layer.logger.as_ref().unwrap();
        assert!(logger.excluded_headers().contains("authorization"));
    }
}
