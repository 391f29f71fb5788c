//! The [`Endpoint`] trait and the contexts passed to it.

use crate::error::EndpointError;
use crate::interface::{Interface, RequestOf, ResponseOf};

/// Context available while building a request.
///
/// Created fresh for every invocation and never retained past the call.
pub struct BuildRequestContext<'a, Root, Options> {
    /// The interface the endpoint belongs to.
    pub root: &'a Root,
    /// Per-call options.
    pub options: &'a Options,
}

impl<'a, Root, Options> BuildRequestContext<'a, Root, Options> {
    /// Creates a new build context.
    #[must_use]
    pub fn new(root: &'a Root, options: &'a Options) -> Self {
        Self { root, options }
    }
}

/// Context available while decoding a response.
///
/// Carries everything the build step saw plus the request that was sent.
pub struct DecodeOutputContext<'a, Root: Interface, Input, Options> {
    /// The interface the endpoint belongs to.
    pub root: &'a Root,
    /// The input the request was built from.
    pub input: &'a Input,
    /// Per-call options.
    pub options: &'a Options,
    /// The request that produced the response being decoded.
    pub request: &'a RequestOf<Root>,
}

/// A typed description of one remote operation.
///
/// An endpoint turns an `Input` into a request of its [`Root`](Endpoint::Root)
/// interface, and turns the raw response back into an `Output`. Both steps are
/// pure with respect to their context and may fail with an [`EndpointError`].
///
/// Endpoints are cheap to clone: repositories clone them into the task that
/// drives a run, so implementors holding state should keep it behind an `Arc`.
pub trait Endpoint: Clone + Send + Sync + 'static {
    /// The interface this endpoint is declared on.
    type Root: Interface;
    /// Value the request is built from.
    type Input: Send + Sync + 'static;
    /// Value the response is decoded into.
    type Output: Send + 'static;
    /// Per-call options; `()` for endpoints without any.
    type Options: Send + Sync + 'static;

    /// Builds the request for `input`.
    ///
    /// # Errors
    ///
    /// Returns an [`EndpointError`] if the input cannot be mapped to a valid request.
    fn build_request(
        &self,
        input: &Self::Input,
        context: &BuildRequestContext<'_, Self::Root, Self::Options>,
    ) -> Result<RequestOf<Self::Root>, EndpointError>;

    /// Decodes the raw response into the endpoint output.
    ///
    /// # Errors
    ///
    /// Returns an [`EndpointError`] if the response cannot be parsed.
    fn decode_output(
        &self,
        response: ResponseOf<Self::Root>,
        context: &DecodeOutputContext<'_, Self::Root, Self::Input, Self::Options>,
    ) -> Result<Self::Output, EndpointError>;

    /// Returns the endpoint's name for tracing.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }
}
