//! Reactive, dependency-aware resources for Tether (Layer 3).
//!
//! A [`ResourceAccessor`] caches the last value fetched through a repository
//! endpoint and keeps it fresh:
//!
//! - it refuses to fetch while any of its [`Dependency`] predicates is unmet,
//!   and to send a write while any of its set dependencies is unmet,
//! - it re-fetches on the repository's change broadcast while its
//!   `needs_get_call` flag is set, or when the repository's interface identity
//!   changed since the last successful fetch,
//! - a failed fetch keeps the stale value, a failed write rolls back to the
//!   last confirmed value,
//! - a fetch that finishes after a newer local write keeps the write cached.
//!
//! Accessors live as ordinary fields of a repository and are bound to it once,
//! right after the repository is shared:
//!
//! ```ignore
//! let repository = Arc::new(DirectoryRepository::new(session));
//! repository.profile.bind(&repository);
//! repository.settings.bind(&repository);
//! ```
//!
//! - [`resource`] - The [`Resource`] and [`RepositoryResource`] traits
//! - [`accessor`] - [`ResourceAccessor`] and its builder
//! - [`call`] - [`GetCall`] / [`SetCall`] endpoint coordinators
//! - [`dependency`] - [`Dependency`] predicates
//! - [`any`] - Type-erased resources
//! - [`error`] - [`ResourceError`]

pub mod accessor;
pub mod any;
pub mod call;
pub mod dependency;
pub mod error;
pub mod resource;

pub use accessor::{ResourceAccessor, ResourceAccessorBuilder};
pub use any::{AnyRepositoryResource, AnyResource, IntoAnyResource};
pub use call::{GetCall, SetCall};
pub use dependency::Dependency;
pub use error::ResourceError;
pub use resource::{Fetch, RepositoryResource, Resource, ResourceStatus};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::accessor::*;
    pub use crate::any::*;
    pub use crate::call::*;
    pub use crate::dependency::*;
    pub use crate::error::*;
    pub use crate::resource::*;
}
