//! Appendable transform chains for endpoints.
//!
//! A [`MutableEndpoint`] owns a [`TransformChain`]: an ordered list of
//! [`Transform`] records registered at configuration time. Build transforms
//! rewrite the freshly built request, decode transforms rewrite the decoded
//! output. Both kinds run strictly in registration order, each one receiving
//! the previous one's result, and the first failure aborts the chain.
//!
//! # Example
//!
//! ```ignore
//! api.get_user.add_build_request_transform("auth", |mut request, _ctx| {
//!     request.headers.push(("authorization".into(), token.clone()));
//!     Ok(request)
//! });
//! ```
//!
//! Transforms may have side effects (injecting credentials, counting calls),
//! but a request can be rebuilt on retry, so those effects must be idempotent.

use std::borrow::Cow;
use std::sync::Arc;

use core::fmt;
use parking_lot::RwLock;

use crate::endpoint::Endpoint;
use crate::error::EndpointError;
use crate::interface::{Interface, RequestOf};

/// Context handed to every transform.
pub struct TransformContext<'a, Root, Input, Options> {
    /// The interface the endpoint belongs to.
    pub root: &'a Root,
    /// The input of the current run.
    pub input: &'a Input,
    /// Per-call options of the current run.
    pub options: &'a Options,
}

impl<'a, Root, Input, Options> TransformContext<'a, Root, Input, Options> {
    /// Creates a new transform context.
    #[must_use]
    pub fn new(root: &'a Root, input: &'a Input, options: &'a Options) -> Self {
        Self {
            root,
            input,
            options,
        }
    }
}

type BuildRequestFn<Root, Input, Options> = dyn Fn(
        RequestOf<Root>,
        &TransformContext<'_, Root, Input, Options>,
    ) -> Result<RequestOf<Root>, EndpointError>
    + Send
    + Sync;

type DecodeOutputFn<Root, Input, Output, Options> = dyn Fn(Output, &TransformContext<'_, Root, Input, Options>) -> Result<Output, EndpointError>
    + Send
    + Sync;

/// A single registered transform.
pub enum Transform<Root: Interface, Input, Output, Options> {
    /// Rewrites the request after the endpoint built it.
    BuildRequest {
        /// Name used in tracing output.
        label: Cow<'static, str>,
        /// The transform function.
        apply: Box<BuildRequestFn<Root, Input, Options>>,
    },
    /// Rewrites the output after the endpoint decoded it.
    DecodeOutput {
        /// Name used in tracing output.
        label: Cow<'static, str>,
        /// The transform function.
        apply: Box<DecodeOutputFn<Root, Input, Output, Options>>,
    },
}

impl<Root: Interface, Input, Output, Options> Transform<Root, Input, Output, Options> {
    /// Returns the transform's label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Transform::BuildRequest { label, .. } | Transform::DecodeOutput { label, .. } => label,
        }
    }
}

/// Ordered, shared list of transforms owned by an endpoint.
///
/// Cloning a chain shares it: transforms appended through any clone are seen
/// by all of them. There is no removal operation.
pub struct TransformChain<Root: Interface, Input, Output, Options> {
    transforms: Arc<RwLock<Vec<Arc<Transform<Root, Input, Output, Options>>>>>,
}

impl<Root: Interface, Input, Output, Options> Clone for TransformChain<Root, Input, Output, Options> {
    fn clone(&self) -> Self {
        Self {
            transforms: Arc::clone(&self.transforms),
        }
    }
}

impl<Root: Interface, Input, Output, Options> Default for TransformChain<Root, Input, Output, Options> {
    fn default() -> Self {
        Self {
            transforms: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl<Root: Interface, Input, Output, Options> fmt::Debug for TransformChain<Root, Input, Output, Options> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformChain")
            .field("transforms", &self.labels())
            .finish()
    }
}

impl<Root: Interface, Input, Output, Options> TransformChain<Root, Input, Output, Options> {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transform.
    pub fn push(&self, transform: Transform<Root, Input, Output, Options>) {
        self.transforms.write().push(Arc::new(transform));
    }

    /// Appends a build-request transform.
    pub fn push_build_request<F>(&self, label: impl Into<Cow<'static, str>>, apply: F)
    where
        F: Fn(
                RequestOf<Root>,
                &TransformContext<'_, Root, Input, Options>,
            ) -> Result<RequestOf<Root>, EndpointError>
            + Send
            + Sync
            + 'static,
    {
        self.push(Transform::BuildRequest {
            label: label.into(),
            apply: Box::new(apply),
        });
    }

    /// Appends a decode-output transform.
    pub fn push_decode_output<F>(&self, label: impl Into<Cow<'static, str>>, apply: F)
    where
        F: Fn(Output, &TransformContext<'_, Root, Input, Options>) -> Result<Output, EndpointError>
            + Send
            + Sync
            + 'static,
    {
        self.push(Transform::DecodeOutput {
            label: label.into(),
            apply: Box::new(apply),
        });
    }

    /// Returns the number of registered transforms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.transforms.read().len()
    }

    /// Returns `true` if no transform is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.read().is_empty()
    }

    /// Returns the labels of all transforms in registration order.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.transforms
            .read()
            .iter()
            .map(|transform| transform.label().to_string())
            .collect()
    }

    /// Runs every build transform over `request`, in registration order.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a transform; later transforms do not run.
    pub fn apply_build_request(
        &self,
        request: RequestOf<Root>,
        context: &TransformContext<'_, Root, Input, Options>,
    ) -> Result<RequestOf<Root>, EndpointError> {
        self.snapshot()
            .iter()
            .try_fold(request, |request, transform| match &**transform {
                Transform::BuildRequest { label, apply } => {
                    tracing::trace!(transform = %label, "applying build transform");
                    apply(request, context)
                }
                Transform::DecodeOutput { .. } => Ok(request),
            })
    }

    /// Runs every decode transform over `output`, in registration order.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a transform; later transforms do not run.
    pub fn apply_decode_output(
        &self,
        output: Output,
        context: &TransformContext<'_, Root, Input, Options>,
    ) -> Result<Output, EndpointError> {
        self.snapshot()
            .iter()
            .try_fold(output, |output, transform| match &**transform {
                Transform::DecodeOutput { label, apply } => {
                    tracing::trace!(transform = %label, "applying decode transform");
                    apply(output, context)
                }
                Transform::BuildRequest { .. } => Ok(output),
            })
    }

    // Transforms run outside the lock so they may register further transforms.
    fn snapshot(&self) -> Vec<Arc<Transform<Root, Input, Output, Options>>> {
        self.transforms.read().clone()
    }
}

/// An endpoint whose build and decode steps can be extended after construction.
pub trait MutableEndpoint: Endpoint {
    /// Returns the endpoint's transform chain.
    fn transforms(&self) -> &TransformChain<Self::Root, Self::Input, Self::Output, Self::Options>;

    /// Registers a transform applied to every request this endpoint builds.
    fn add_build_request_transform<F>(&self, label: impl Into<Cow<'static, str>>, transform: F)
    where
        F: Fn(
                RequestOf<Self::Root>,
                &TransformContext<'_, Self::Root, Self::Input, Self::Options>,
            ) -> Result<RequestOf<Self::Root>, EndpointError>
            + Send
            + Sync
            + 'static,
    {
        self.transforms().push_build_request(label, transform);
    }

    /// Registers a transform applied to every output this endpoint decodes.
    fn add_decode_output_transform<F>(&self, label: impl Into<Cow<'static, str>>, transform: F)
    where
        F: Fn(
                Self::Output,
                &TransformContext<'_, Self::Root, Self::Input, Self::Options>,
            ) -> Result<Self::Output, EndpointError>
            + Send
            + Sync
            + 'static,
    {
        self.transforms().push_decode_output(label, transform);
    }
}
