//! Closure-backed endpoints.

use std::borrow::Cow;
use std::sync::Arc;

use core::fmt;

use crate::endpoint::{BuildRequestContext, DecodeOutputContext, Endpoint};
use crate::error::EndpointError;
use crate::interface::{Interface, RequestOf, ResponseOf};
use crate::mutable::{MutableEndpoint, TransformChain, TransformContext};

type BuildFn<Root, Input, Options> = dyn Fn(&Input, &BuildRequestContext<'_, Root, Options>) -> Result<RequestOf<Root>, EndpointError>
    + Send
    + Sync;

type DecodeFn<Root, Input, Output, Options> = dyn Fn(
        ResponseOf<Root>,
        &DecodeOutputContext<'_, Root, Input, Options>,
    ) -> Result<Output, EndpointError>
    + Send
    + Sync;

/// An [`Endpoint`] defined by a pair of closures.
///
/// This is the usual way to declare endpoints as named fields of an
/// [`Interface`]. Every `FnEndpoint` carries a [`TransformChain`], so it is also
/// a [`MutableEndpoint`]. Clones share both the closures and the chain.
///
/// # Example
///
/// ```ignore
/// let get_user = FnEndpoint::<UserApi, UserId, User>::new(
///     "get_user",
///     |id, _ctx| Ok(HttpRequest::get(format!("/users/{id}"))),
///     |response: HttpResponse, _ctx| response.json(),
/// );
/// ```
pub struct FnEndpoint<Root: Interface, Input, Output, Options = ()> {
    name: Cow<'static, str>,
    build: Arc<BuildFn<Root, Input, Options>>,
    decode: Arc<DecodeFn<Root, Input, Output, Options>>,
    transforms: TransformChain<Root, Input, Output, Options>,
}

impl<Root: Interface, Input, Output, Options> FnEndpoint<Root, Input, Output, Options> {
    /// Creates an endpoint from its build and decode functions.
    pub fn new<B, D>(name: impl Into<Cow<'static, str>>, build: B, decode: D) -> Self
    where
        B: Fn(&Input, &BuildRequestContext<'_, Root, Options>) -> Result<RequestOf<Root>, EndpointError>
            + Send
            + Sync
            + 'static,
        D: Fn(
                ResponseOf<Root>,
                &DecodeOutputContext<'_, Root, Input, Options>,
            ) -> Result<Output, EndpointError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            build: Arc::new(build),
            decode: Arc::new(decode),
            transforms: TransformChain::new(),
        }
    }
}

impl<Root: Interface, Input, Output, Options> Clone for FnEndpoint<Root, Input, Output, Options> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            build: Arc::clone(&self.build),
            decode: Arc::clone(&self.decode),
            transforms: self.transforms.clone(),
        }
    }
}

impl<Root: Interface, Input, Output, Options> fmt::Debug for FnEndpoint<Root, Input, Output, Options> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnEndpoint")
            .field("name", &self.name)
            .field("transforms", &self.transforms)
            .finish_non_exhaustive()
    }
}

impl<Root, Input, Output, Options> Endpoint for FnEndpoint<Root, Input, Output, Options>
where
    Root: Interface,
    Input: Send + Sync + 'static,
    Output: Send + 'static,
    Options: Send + Sync + 'static,
{
    type Root = Root;
    type Input = Input;
    type Output = Output;
    type Options = Options;

    fn build_request(
        &self,
        input: &Input,
        context: &BuildRequestContext<'_, Root, Options>,
    ) -> Result<RequestOf<Root>, EndpointError> {
        let request = (self.build)(input, context)?;
        let transform_context = TransformContext::new(context.root, input, context.options);
        self.transforms
            .apply_build_request(request, &transform_context)
    }

    fn decode_output(
        &self,
        response: ResponseOf<Root>,
        context: &DecodeOutputContext<'_, Root, Input, Options>,
    ) -> Result<Output, EndpointError> {
        let output = (self.decode)(response, context)?;
        let transform_context = TransformContext::new(context.root, context.input, context.options);
        self.transforms
            .apply_decode_output(output, &transform_context)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<Root, Input, Output, Options> MutableEndpoint for FnEndpoint<Root, Input, Output, Options>
where
    Root: Interface,
    Input: Send + Sync + 'static,
    Output: Send + 'static,
    Options: Send + Sync + 'static,
{
    fn transforms(&self) -> &TransformChain<Root, Input, Output, Options> {
        &self.transforms
    }
}
