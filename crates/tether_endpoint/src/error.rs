//! Error types for endpoint building, decoding and execution.

use std::borrow::Cow;

/// A boxed, thread-safe error used for opaque causes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error produced by an endpoint or one of its transforms.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// A field required to build the request was absent.
    #[error("missing required field: {0}")]
    MissingField(Cow<'static, str>),

    /// The input could not be mapped to a valid request.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The response could not be decoded into the endpoint output.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Any other failure raised by user code.
    #[error(transparent)]
    Other(BoxError),
}

impl EndpointError {
    /// Creates a [`MissingField`](Self::MissingField).
    pub fn missing_field(field: impl Into<Cow<'static, str>>) -> Self {
        Self::MissingField(field.into())
    }

    /// Creates an [`InvalidInput`](Self::InvalidInput).
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Creates an [`InvalidResponse`](Self::InvalidResponse).
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Wraps an arbitrary error as [`Other`](Self::Other).
    pub fn other(err: impl Into<BoxError>) -> Self {
        Self::Other(err.into())
    }
}

/// Failure of a single endpoint run.
///
/// Interfaces convert this into their own error family through
/// `From<RunError>`; see [`Interface::Error`](crate::Interface::Error).
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The task was started before it received its input.
    #[error("task started without input")]
    MissingInput,

    /// The endpoint (or a build transform) could not produce a request.
    #[error("failed to build request: {0}")]
    BuildRequestFailed(#[source] EndpointError),

    /// The session failed to execute the request.
    #[error("transport failed: {0}")]
    TransportFailed(#[source] BoxError),

    /// The endpoint (or a decode transform) could not decode the response.
    #[error("failed to decode output: {0}")]
    DecodeFailed(#[source] EndpointError),

    /// A resource write was rejected by its set endpoint.
    #[error("set failed: {0}")]
    SetFailed(#[source] BoxError),

    /// A resource could not run its endpoints, e.g. because it is not bound
    /// to a live repository.
    #[error("resource unavailable: {0}")]
    Unavailable(#[source] BoxError),

    /// The task was cancelled before it produced a result.
    #[error("task cancelled")]
    Cancelled,

    /// No Tokio runtime was available to drive the task.
    #[error("no tokio runtime available to drive the task")]
    NoRuntime,
}

impl RunError {
    /// Wraps a session failure as [`TransportFailed`](Self::TransportFailed).
    pub fn transport(err: impl Into<BoxError>) -> Self {
        Self::TransportFailed(err.into())
    }

    /// Returns `true` for [`Cancelled`](Self::Cancelled).
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_message() {
        let err = EndpointError::missing_field("id");
        assert_eq!(err.to_string(), "missing required field: id");
    }

    #[test]
    fn run_error_keeps_endpoint_cause_as_source() {
        let err = RunError::DecodeFailed(EndpointError::invalid_response("truncated"));
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("invalid response: truncated"));
    }

    #[test]
    fn transport_wraps_any_error() {
        let io = std::io::Error::other("connection reset");
        let err = RunError::transport(io);
        assert!(matches!(err, RunError::TransportFailed(_)));
        assert_eq!(err.to_string(), "transport failed: connection reset");
    }

    #[test]
    fn unavailable_is_not_a_transport_failure() {
        let err = RunError::Unavailable("resource `profile` is detached".into());
        assert!(!matches!(err, RunError::TransportFailed(_)));
        assert_eq!(
            err.to_string(),
            "resource unavailable: resource `profile` is detached"
        );
    }
}
