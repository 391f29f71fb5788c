//! HTTP transport for Tether, backed by `reqwest`.
//!
//! - [`HttpRequest`] / [`HttpResponse`] - the request family HTTP interfaces share
//! - [`HttpSession`] - a [`Session`](tether_repository::Session) executing requests with `reqwest`
//! - [`SessionConfig`] - base URL, timeout and default headers
//! - [`get_json`] / [`send_json`] / [`bearer_auth`] - endpoint helpers
//!
//! Non-2xx statuses are transport failures ([`HttpError::Status`]), so a `404`
//! surfaces to callers as [`RunError::TransportFailed`](tether_endpoint::RunError::TransportFailed).
//!
//! # Example
//!
//! ```ignore
//! struct UserApi {
//!     get_user: FnEndpoint<UserApi, u64, User>,
//! }
//!
//! let api = UserApi {
//!     get_user: get_json("get_user", |id: &u64| format!("/users/{id}")),
//! };
//! let session = HttpSession::new(SessionConfig::new("https://api.example.com"))?;
//! let repository = RepositoryCore::new(api, session);
//! let user = repository.call(|api| &api.get_user, 42).await?;
//! ```

pub mod config;
pub mod endpoint;
pub mod error;
pub mod request;
pub mod session;

pub use config::SessionConfig;
pub use endpoint::{bearer_auth, get_json, send_json};
pub use error::HttpError;
pub use request::{HttpRequest, HttpResponse};
pub use reqwest::Method;
pub use session::HttpSession;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::config::*;
    pub use crate::endpoint::*;
    pub use crate::error::*;
    pub use crate::request::*;
    pub use crate::session::*;
    pub use reqwest::Method;
}
