//! Interfaces and the request type family they share.
//!
//! An [`Interface`] is a catalog of endpoints that agree on one [`Request`]
//! type and one error type. Interfaces are plain values, built once at startup,
//! and identify themselves through [`Interface::id`] so that repositories can
//! detect when the backend behind them has been swapped.

use core::fmt::Debug;

use crate::error::RunError;

/// A request that a session knows how to execute.
///
/// The associated [`Response`](Request::Response) is what the session hands
/// back on transport success, before any endpoint decoding takes place.
pub trait Request: Send + Sync + 'static {
    /// The raw response produced by executing this request.
    type Response: Send + 'static;
}

/// A named collection of endpoints sharing one request/error family.
///
/// # Identity
///
/// [`id`](Interface::id) returns a token describing *which* backend this
/// interface value talks to. Resources record the token when they fetch and
/// refresh themselves when a repository later reports a different one.
///
/// # Errors
///
/// Every failure produced while running an endpoint of this interface is
/// converted into [`Interface::Error`] through its `From<RunError>`
/// implementation, so callers observe a single error family per interface.
/// Interfaces without a richer error type can simply use [`RunError`].
pub trait Interface: Send + Sync + 'static {
    /// The request type every endpoint of this interface builds.
    type Request: Request;

    /// The error family surfaced to callers.
    type Error: From<RunError> + std::error::Error + Send + Sync + 'static;

    /// Identity token of this interface value.
    type Id: Clone + PartialEq + Debug + Send + Sync + 'static;

    /// Returns the identity token of this interface value.
    fn id(&self) -> Self::Id;
}

/// The request type of an interface.
pub type RequestOf<I> = <I as Interface>::Request;

/// The raw response type of an interface.
pub type ResponseOf<I> = <<I as Interface>::Request as Request>::Response;
