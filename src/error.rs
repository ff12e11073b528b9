//! Error types for response rendering and buffering.

/// Boxed error used for failures coming from the transport or a body implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while reading or buffering a response body.
///
/// Neither variant ever reaches the caller of a logging service: a failed body read is turned
/// into a warning line, and buffering failures are reported by [`BufferResponse`] as the
/// transport error they are.
///
/// [`BufferResponse`]: crate::body_wrapper::BufferResponse
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read response body: {0}")]
    BodyRead(#[source] BoxError),
    #[error("failed to buffer response body: {0}")]
    Buffer(#[source] BoxError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
