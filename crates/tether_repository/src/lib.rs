//! Sessions, cancellable tasks and repositories for Tether (Layer 2).
//!
//! A [`Repository`] couples one [`Interface`](tether_endpoint::Interface) with
//! one [`Session`] and runs endpoints through a uniform pipeline:
//!
//! ```text
//! run(endpoint, input, options)
//!   -> build request (endpoint + build transforms)   // fails fast, nothing sent
//!   -> session.execute(request)                       // registered as cancellable
//!   -> decode output (endpoint + decode transforms)
//!   -> exactly one Ok(output) or Err(error)
//! ```
//!
//! - [`session`] - The [`Session`] transport contract
//! - [`task`] - One-shot cancellable [`Task`]s and [`PendingTask`]s
//! - [`cancellables`] - Bulk-cancellable handle sets
//! - [`change`] - Payload-free change broadcast
//! - [`repository`] - The [`Repository`] trait and [`RepositoryCore`]
//! - [`any`] - Type-erased [`AnyRepository`]
//!
//! Tasks are driven by the ambient Tokio runtime; the crate never spawns
//! threads of its own.

pub mod any;
pub mod cancellables;
pub mod change;
pub mod repository;
pub mod session;
pub mod task;

pub use any::{AnyRepository, IntoAnyRepository};
pub use cancellables::Cancellables;
pub use change::{ChangeNotifier, Subscription};
pub use repository::{Dispatch, ErrorOf, Repository, RepositoryCore, RunEndpointFunction};
pub use session::Session;
pub use task::{PendingTask, Task, TaskHandle, TaskId, TaskStatus};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::any::*;
    pub use crate::cancellables::*;
    pub use crate::change::*;
    pub use crate::repository::*;
    pub use crate::session::*;
    pub use crate::task::*;
}
