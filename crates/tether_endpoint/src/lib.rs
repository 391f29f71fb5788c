//! Typed endpoint descriptions for Tether (Layer 1).
//!
//! `tether_endpoint` describes *what* a remote operation looks like, without
//! knowing how requests travel:
//!
//! - [`interface`] - [`Interface`] catalogs and the [`Request`] type family
//! - [`endpoint`] - The [`Endpoint`] trait and its per-call contexts
//! - [`mutable`] - Appendable build/decode transform chains
//! - [`FnEndpoint`] - A closure-backed endpoint with a transform chain
//! - [`error`] - Endpoint and pipeline error taxonomy
//! - [`pagination`] - The paginated-response contract
//!
//! # Architecture
//!
//! - **Layer 1** (`tether_endpoint`): endpoint metadata (this crate)
//! - **Layer 2** (`tether_repository`): sessions, tasks, repositories
//! - **Layer 3** (`tether_resource`, `tether_http`): reactive resources, transports
//!
//! # Example
//!
//! ```
//! use tether_endpoint::{EndpointError, FnEndpoint, Interface, Request, RunError};
//!
//! struct Get(String);
//! impl Request for Get {
//!     type Response = String;
//! }
//!
//! #[derive(Clone)]
//! struct EchoApi {
//!     echo: FnEndpoint<EchoApi, String, usize>,
//! }
//!
//! impl Interface for EchoApi {
//!     type Request = Get;
//!     type Error = RunError;
//!     type Id = &'static str;
//!
//!     fn id(&self) -> Self::Id {
//!         "echo"
//!     }
//! }
//!
//! let api = EchoApi {
//!     echo: FnEndpoint::new(
//!         "echo",
//!         |input: &String, _ctx| Ok(Get(input.clone())),
//!         |response: String, _ctx| {
//!             if response.is_empty() {
//!                 Err(EndpointError::invalid_response("empty body"))
//!             } else {
//!                 Ok(response.len())
//!             }
//!         },
//!     ),
//! };
//! # let _ = api;
//! ```

pub mod endpoint;
pub mod error;
mod fn_endpoint;
pub mod interface;
pub mod mutable;
pub mod pagination;

pub use endpoint::{BuildRequestContext, DecodeOutputContext, Endpoint};
pub use error::{BoxError, EndpointError, RunError};
pub use fn_endpoint::FnEndpoint;
pub use interface::{Interface, Request, RequestOf, ResponseOf};
pub use mutable::{MutableEndpoint, Transform, TransformChain, TransformContext};
pub use pagination::{PaginatedResponse, PartialList};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::endpoint::*;
    pub use crate::error::*;
    pub use crate::fn_endpoint::FnEndpoint;
    pub use crate::interface::*;
    pub use crate::mutable::*;
    pub use crate::pagination::*;
}
