//! The [`Resource`] and [`RepositoryResource`] traits.

use std::sync::Arc;

use tether_repository::{ChangeNotifier, Repository, Task};

/// Observable state of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceStatus {
    /// No value and no fetch in flight.
    Idle,
    /// A fetch is in flight. Any earlier value is still readable.
    Fetching,
    /// A value is cached.
    Holding,
    /// The last fetch failed. Any earlier value is still readable.
    Failed,
}

/// Outcome of asking a resource to fetch.
#[derive(Debug)]
pub enum Fetch<V, E> {
    /// A get call was started.
    Started(Task<V, E>),
    /// A get call is already in flight; no second one was started.
    InFlight,
    /// A dependency is unmet; nothing was sent.
    Blocked,
    /// The resource is not bound to a live repository.
    Detached,
}

impl<V, E> Fetch<V, E> {
    /// Returns `true` for [`Started`](Self::Started).
    #[must_use]
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started(_))
    }

    /// Returns the started task, if any.
    pub fn into_task(self) -> Option<Task<V, E>> {
        match self {
            Self::Started(task) => Some(task),
            Self::InFlight | Self::Blocked | Self::Detached => None,
        }
    }
}

/// A cached, observable value backed by remote endpoints.
pub trait Resource: Send + Sync + 'static {
    /// The cached value.
    type Value: Clone + Send + Sync + 'static;
    /// The error family of the backing endpoints.
    type Error: Send + 'static;

    /// Returns the resource's name for tracing.
    fn name(&self) -> &str;

    /// Returns a copy of the cached value.
    fn latest_value(&self) -> Option<Self::Value>;

    /// Returns `true` if a value is cached.
    fn has_value(&self) -> bool {
        self.latest_value().is_some()
    }

    /// Returns the current status.
    fn status(&self) -> ResourceStatus;

    /// Returns `true` while the resource still wants a get call.
    fn needs_get_call(&self) -> bool;

    /// Starts a get call unless one is in flight or a dependency is unmet.
    fn fetch(&self) -> Fetch<Self::Value, Self::Error>;

    /// Writes `value` to the cache and, if configured, to the backend.
    fn set(&self, value: Self::Value) -> Task<(), Self::Error>;

    /// Returns the broadcast fired whenever the cached value changes.
    fn changes(&self) -> &ChangeNotifier;
}

/// A resource that lives on a [`Repository`].
pub trait RepositoryResource: Resource {
    /// The owning repository type.
    type Repository: Repository;

    /// Binds the resource to `repository`.
    ///
    /// Returns `true` if the resource is bound to `repository` afterwards.
    fn bind(&self, repository: &Arc<Self::Repository>) -> bool;

    /// Returns the owning repository if it is still alive.
    fn repository(&self) -> Option<Arc<Self::Repository>>;

    /// Returns `true` while the owning repository is alive.
    fn is_bound(&self) -> bool {
        self.repository().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_endpoint::RunError;

    #[test]
    fn only_started_fetch_yields_a_task() {
        let started: Fetch<u8, RunError> = Fetch::Started(Task::ready(Ok(1)));
        assert!(started.is_started());
        assert!(started.into_task().is_some());

        for skipped in [Fetch::<u8, RunError>::InFlight, Fetch::Blocked, Fetch::Detached] {
            assert!(!skipped.is_started());
            assert!(skipped.into_task().is_none());
        }
    }
}
