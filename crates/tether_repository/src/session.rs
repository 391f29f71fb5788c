//! The [`Session`] trait for request executors.

use async_trait::async_trait;
use tether_endpoint::Request;

use crate::cancellables::Cancellables;

/// Executes requests on behalf of a repository.
///
/// Sessions own the actual transport: connection pooling, retries, timeouts
/// and TLS all live behind this trait. A timeout is simply reported as an
/// error and surfaces to callers as a transport failure.
///
/// # Example
///
/// ```ignore
/// #[async_trait]
/// impl Session for HttpSession {
///     type Request = HttpRequest;
///     type Error = HttpError;
///
///     async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
///         // ...
///     }
///
///     fn cancellables(&self) -> &Cancellables {
///         &self.cancellables
///     }
/// }
/// ```
#[async_trait]
pub trait Session: Send + Sync + 'static {
    /// The request type this session executes.
    type Request: Request;

    /// Transport-level failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Executes `request`, returning its raw response.
    ///
    /// # Errors
    ///
    /// Returns a [`Session::Error`] if the request could not be completed.
    async fn execute(
        &self,
        request: &Self::Request,
    ) -> Result<<Self::Request as Request>::Response, Self::Error>;

    /// Returns the set of in-flight handles of this session.
    ///
    /// Repositories register every task they start here as well as in their
    /// own set, so tearing down a session's owner cancels outstanding work.
    fn cancellables(&self) -> &Cancellables;
}
