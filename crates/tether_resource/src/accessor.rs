//! [`ResourceAccessor`]: the cached, dependency-aware resource.

use std::borrow::Cow;
use std::sync::{Arc, Weak};

use core::fmt;

use parking_lot::Mutex;
use tether_endpoint::{Interface, RunError};
use tether_repository::{ChangeNotifier, ErrorOf, Repository, Subscription, Task};

use crate::any::AnyRepositoryResource;
use crate::call::{GetCall, SetCall};
use crate::dependency::Dependency;
use crate::error::ResourceError;
use crate::resource::{Fetch, RepositoryResource, Resource, ResourceStatus};

type RootId<R> = <<R as Repository>::Interface as Interface>::Id;

struct AccessorState<R: Repository, V> {
    latest: Option<V>,
    confirmed: Option<V>,
    confirmed_generation: u64,
    write_generation: u64,
    status: ResourceStatus,
    needs_get_call: bool,
    in_flight: bool,
    last_error: Option<String>,
    last_root_id: Option<RootId<R>>,
    repository: Option<Weak<R>>,
    subscriptions: Vec<Subscription>,
}

struct AccessorInner<R: Repository, V> {
    name: Cow<'static, str>,
    get: GetCall<R, V>,
    set: Option<SetCall<R, V>>,
    dependencies: Vec<Dependency<R>>,
    set_dependencies: Vec<Dependency<R>>,
    changes: ChangeNotifier,
    state: Mutex<AccessorState<R, V>>,
}

/// A cached value fetched through a repository endpoint.
///
/// Cloning shares the cache. See the [crate docs](crate) for the refresh rules.
pub struct ResourceAccessor<R: Repository, V> {
    inner: Arc<AccessorInner<R, V>>,
}

impl<R: Repository, V> Clone for ResourceAccessor<R, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Repository, V> fmt::Debug for ResourceAccessor<R, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ResourceAccessor")
            .field("name", &self.inner.name)
            .field("status", &state.status)
            .field("needs_get_call", &state.needs_get_call)
            .field("has_value", &state.latest.is_some())
            .field("dependencies", &self.inner.dependencies.len())
            .field("set_dependencies", &self.inner.set_dependencies.len())
            .field("bound", &!state.subscriptions.is_empty())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ResourceAccessor`].
pub struct ResourceAccessorBuilder<R: Repository, V> {
    name: Cow<'static, str>,
    get: GetCall<R, V>,
    set: Option<SetCall<R, V>>,
    dependencies: Vec<Dependency<R>>,
    set_dependencies: Vec<Dependency<R>>,
}

impl<R: Repository, V: Clone + Send + Sync + 'static> ResourceAccessorBuilder<R, V> {
    /// Adds a dependency. All dependencies must hold before a fetch starts.
    #[must_use]
    pub fn depends_on(mut self, dependency: Dependency<R>) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Adds a dependency that must hold before a write is sent through the
    /// setter.
    #[must_use]
    pub fn set_depends_on(mut self, dependency: Dependency<R>) -> Self {
        self.set_dependencies.push(dependency);
        self
    }

    /// Sends writes through `set`.
    #[must_use]
    pub fn setter(mut self, set: SetCall<R, V>) -> Self {
        self.set = Some(set);
        self
    }

    /// Builds the accessor.
    #[must_use]
    pub fn build(self) -> ResourceAccessor<R, V> {
        ResourceAccessor {
            inner: Arc::new(AccessorInner {
                name: self.name,
                get: self.get,
                set: self.set,
                dependencies: self.dependencies,
                set_dependencies: self.set_dependencies,
                changes: ChangeNotifier::new(),
                state: Mutex::new(AccessorState {
                    latest: None,
                    confirmed: None,
                    confirmed_generation: 0,
                    write_generation: 0,
                    status: ResourceStatus::Idle,
                    needs_get_call: true,
                    in_flight: false,
                    last_error: None,
                    last_root_id: None,
                    repository: None,
                    subscriptions: Vec::new(),
                }),
            }),
        }
    }
}

impl<R: Repository, V: Clone + Send + Sync + 'static> ResourceAccessor<R, V> {
    /// Creates an accessor without dependencies or setter.
    pub fn new(name: impl Into<Cow<'static, str>>, get: GetCall<R, V>) -> Self {
        Self::builder(name, get).build()
    }

    /// Starts building an accessor.
    pub fn builder(name: impl Into<Cow<'static, str>>, get: GetCall<R, V>) -> ResourceAccessorBuilder<R, V> {
        ResourceAccessorBuilder {
            name: name.into(),
            get,
            set: None,
            dependencies: Vec::new(),
            set_dependencies: Vec::new(),
        }
    }

    /// Returns the accessor's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Binds the accessor to `repository`.
    ///
    /// Binding subscribes to the repository's change broadcast, forwards the
    /// accessor's own changes into it and records the interface identity.
    /// Binding again to the same repository is a no-op; binding to a
    /// different live repository is refused and returns `false`.
    pub fn bind(&self, repository: &Arc<R>) -> bool {
        let mut state = self.inner.state.lock();
        if let Some(existing) = state.repository.as_ref().and_then(Weak::upgrade) {
            if Arc::ptr_eq(&existing, repository) {
                return true;
            }
            tracing::warn!(resource = %self.inner.name, "already bound to another repository; bind refused");
            return false;
        }

        let accessor = Arc::downgrade(&self.inner);
        let owner = Arc::downgrade(repository);
        let refresh = repository.changes().subscribe(move || {
            let (Some(inner), Some(repository)) = (accessor.upgrade(), owner.upgrade()) else {
                return;
            };
            ResourceAccessor { inner }.refresh_on_change(&repository);
        });
        let forward = self.inner.changes.forward_to(repository.changes());

        state.repository = Some(Arc::downgrade(repository));
        state.subscriptions = vec![refresh, forward];
        state.last_root_id = Some(repository.interface().id());
        tracing::debug!(resource = %self.inner.name, "bound to repository");
        true
    }

    /// Returns the owning repository if it is still alive.
    #[must_use]
    pub fn repository(&self) -> Option<Arc<R>> {
        self.inner.state.lock().repository.as_ref().and_then(Weak::upgrade)
    }

    /// Returns a copy of the cached value.
    #[must_use]
    pub fn latest_value(&self) -> Option<V> {
        self.inner.state.lock().latest.clone()
    }

    /// Returns `true` if a value is cached.
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.inner.state.lock().latest.is_some()
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> ResourceStatus {
        self.inner.state.lock().status
    }

    /// Returns `true` while the accessor still wants a get call.
    #[must_use]
    pub fn needs_get_call(&self) -> bool {
        self.inner.state.lock().needs_get_call
    }

    /// Returns the message of the last failed fetch, cleared on success.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.inner.state.lock().last_error.clone()
    }

    /// Returns the broadcast fired whenever the cached value changes.
    #[must_use]
    pub fn changes(&self) -> &ChangeNotifier {
        &self.inner.changes
    }

    /// Returns `true` if every dependency holds against the bound repository.
    #[must_use]
    pub fn dependencies_met(&self) -> bool {
        self.repository()
            .is_some_and(|repository| self.dependencies_hold(&repository))
    }

    /// Starts a get call through the bound repository.
    ///
    /// Returns [`Fetch::Blocked`] while a dependency is unmet, leaving
    /// `needs_get_call` set, and [`Fetch::InFlight`] while an earlier get call
    /// has not finished.
    pub fn fetch(&self) -> Fetch<V, ErrorOf<R>> {
        let Some(repository) = self.repository() else {
            tracing::debug!(resource = %self.inner.name, "fetch skipped: not bound");
            return Fetch::Detached;
        };
        self.fetch_from(&repository)
    }

    /// Writes `value`.
    ///
    /// The cache is updated and a change fires immediately. With a setter
    /// configured the write is then sent; if it fails the cache rolls back to
    /// the last confirmed value (unless a newer write happened meanwhile) and
    /// the task fails with [`RunError::SetFailed`].
    ///
    /// A write whose set dependencies are unmet is refused before it touches
    /// the cache, failing with [`ResourceError::SetBlocked`]. A setter that
    /// cannot build its input rolls the write back and fails with
    /// [`RunError::MissingInput`].
    pub fn set(&self, value: V) -> Task<(), ErrorOf<R>> {
        let repository = self.repository();
        if self.inner.set.is_some()
            && let Some(repository) = &repository
            && let Some(dependency) = self
                .inner
                .set_dependencies
                .iter()
                .find(|dependency| !dependency.is_available(repository))
        {
            tracing::debug!(resource = %self.inner.name, dependency = %dependency.label(), "set refused: dependency unmet");
            let err = ResourceError::set_blocked(self.inner.name.as_ref(), dependency.label());
            return Task::ready(Err(RunError::SetFailed(Box::new(err)).into()));
        }

        let generation = {
            let mut state = self.inner.state.lock();
            state.write_generation += 1;
            state.latest = Some(value.clone());
            if state.status != ResourceStatus::Fetching {
                state.status = ResourceStatus::Holding;
            }
            state.write_generation
        };
        self.inner.changes.notify();

        let Some(set) = self.inner.set.clone() else {
            self.confirm(generation, value);
            return Task::ready(Ok(()));
        };
        let Some(repository) = repository else {
            self.roll_back(generation);
            let err = ResourceError::detached(self.inner.name.as_ref());
            return Task::ready(Err(RunError::SetFailed(Box::new(err)).into()));
        };
        let Some(write) = set.dispatch(&repository, &value) else {
            tracing::debug!(resource = %self.inner.name, "set refused: no input yet");
            self.roll_back(generation);
            return Task::ready(Err(RunError::MissingInput.into()));
        };
        let mut guard = SetGuard {
            accessor: self.clone(),
            generation,
            settled: false,
        };
        repository.spawn(async move {
            let result = write.await;
            guard.settled = true;
            match result {
                Ok(()) => {
                    guard.accessor.confirm(guard.generation, value);
                    Ok(())
                }
                Err(err) => {
                    tracing::warn!(resource = %guard.accessor.inner.name, error = %err, "set failed; rolling back");
                    guard.accessor.roll_back(guard.generation);
                    Err(RunError::SetFailed(Box::new(err)).into())
                }
            }
        })
    }

    /// Drops the cached value and marks the accessor for a new get call.
    ///
    /// The change this fires reaches the bound repository, so a bound accessor
    /// whose dependencies hold starts that get call right away. Pending writes
    /// no longer roll back or confirm into the cache.
    pub fn clear(&self) {
        {
            let mut state = self.inner.state.lock();
            state.write_generation += 1;
            state.latest = None;
            state.confirmed = None;
            state.confirmed_generation = state.write_generation;
            state.needs_get_call = true;
            if !state.in_flight {
                state.status = ResourceStatus::Idle;
            }
        }
        self.inner.changes.notify();
    }

    /// Marks the accessor for a new get call on the next change signal,
    /// keeping the cached value.
    pub fn invalidate(&self) {
        self.inner.state.lock().needs_get_call = true;
    }

    /// Erases the accessor's type.
    #[must_use]
    pub fn to_any(&self) -> AnyRepositoryResource<R, V> {
        AnyRepositoryResource::new(self.clone())
    }

    fn dependencies_hold(&self, repository: &R) -> bool {
        self.inner
            .dependencies
            .iter()
            .all(|dependency| dependency.is_available(repository))
    }

    fn fetch_from(&self, repository: &R) -> Fetch<V, ErrorOf<R>> {
        if !self.dependencies_hold(repository) {
            self.inner.state.lock().needs_get_call = true;
            tracing::debug!(resource = %self.inner.name, "fetch blocked: dependency unmet");
            return Fetch::Blocked;
        }

        let (previous, generation) = {
            let mut state = self.inner.state.lock();
            if state.in_flight {
                return Fetch::InFlight;
            }
            state.in_flight = true;
            let previous = core::mem::replace(&mut state.status, ResourceStatus::Fetching);
            (previous, state.write_generation)
        };
        let mut guard = FetchGuard {
            accessor: self.clone(),
            previous,
            settled: false,
        };

        let Some(read) = self.inner.get.dispatch(repository) else {
            self.inner.state.lock().needs_get_call = true;
            drop(guard);
            tracing::debug!(resource = %self.inner.name, "fetch blocked: no input yet");
            return Fetch::Blocked;
        };

        let root_id = repository.interface().id();
        tracing::debug!(resource = %self.inner.name, "fetch started");
        Fetch::Started(repository.spawn(async move {
            let result = read.await;
            guard.settled = true;
            guard.accessor.settle_fetch(result, generation, root_id)
        }))
    }

    // `generation` is the write generation seen when the get call started.
    fn settle_fetch(
        &self,
        result: Result<V, ErrorOf<R>>,
        generation: u64,
        root_id: RootId<R>,
    ) -> Result<V, ErrorOf<R>> {
        match result {
            Ok(value) => {
                {
                    let mut state = self.inner.state.lock();
                    state.in_flight = false;
                    if state.write_generation == generation || state.latest.is_none() {
                        state.latest = Some(value.clone());
                        state.confirmed = Some(value.clone());
                        state.confirmed_generation = state.write_generation;
                    } else if state.confirmed_generation <= generation {
                        // A local write is newer than this read: keep it cached,
                        // but roll back to what the server returned if it fails.
                        tracing::debug!(resource = %self.inner.name, "fetch overtaken by a local write");
                        state.confirmed = Some(value.clone());
                        state.confirmed_generation = generation;
                    }
                    state.status = ResourceStatus::Holding;
                    state.needs_get_call = false;
                    state.last_error = None;
                    state.last_root_id = Some(root_id);
                }
                tracing::debug!(resource = %self.inner.name, "fetch succeeded");
                self.inner.changes.notify();
                Ok(value)
            }
            Err(err) => {
                {
                    let mut state = self.inner.state.lock();
                    state.in_flight = false;
                    state.status = ResourceStatus::Failed;
                    state.needs_get_call = true;
                    state.last_error = Some(err.to_string());
                }
                tracing::warn!(resource = %self.inner.name, error = %err, "fetch failed; keeping cached value");
                Err(err)
            }
        }
    }

    fn refresh_on_change(&self, repository: &R) {
        let current = repository.interface().id();
        let refresh = {
            let mut state = self.inner.state.lock();
            if state.last_root_id.as_ref().is_some_and(|id| *id != current) {
                tracing::debug!(resource = %self.inner.name, "interface identity changed");
                state.needs_get_call = true;
            }
            state.needs_get_call && !state.in_flight
        };
        if refresh {
            // The task runs detached; its outcome lands in the cache.
            let _ = self.fetch_from(repository);
        }
    }

    fn confirm(&self, generation: u64, value: V) {
        let mut state = self.inner.state.lock();
        if generation == state.write_generation {
            state.latest = Some(value.clone());
        }
        if generation >= state.confirmed_generation {
            state.confirmed = Some(value);
            state.confirmed_generation = generation;
        }
    }

    fn roll_back(&self, generation: u64) {
        let rolled_back = {
            let mut state = self.inner.state.lock();
            if state.write_generation != generation {
                false
            } else {
                state.latest = state.confirmed.clone();
                if state.latest.is_none() && state.status == ResourceStatus::Holding {
                    state.status = ResourceStatus::Idle;
                }
                true
            }
        };
        if rolled_back {
            tracing::debug!(resource = %self.inner.name, "cache rolled back to last confirmed value");
            self.inner.changes.notify();
        }
    }
}

// Restores the pre-fetch status if a fetch future is dropped before it settles.
struct FetchGuard<R: Repository, V> {
    accessor: ResourceAccessor<R, V>,
    previous: ResourceStatus,
    settled: bool,
}

impl<R: Repository, V> Drop for FetchGuard<R, V> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self.accessor.inner.state.lock();
        state.in_flight = false;
        if state.status == ResourceStatus::Fetching {
            state.status = self.previous;
        }
    }
}

// Rolls an optimistic write back if its set future is dropped before it settles.
struct SetGuard<R: Repository, V: Clone + Send + Sync + 'static> {
    accessor: ResourceAccessor<R, V>,
    generation: u64,
    settled: bool,
}

impl<R: Repository, V: Clone + Send + Sync + 'static> Drop for SetGuard<R, V> {
    fn drop(&mut self) {
        if !self.settled {
            self.accessor.roll_back(self.generation);
        }
    }
}

impl<R: Repository, V: Clone + Send + Sync + 'static> Resource for ResourceAccessor<R, V> {
    type Value = V;
    type Error = ErrorOf<R>;

    fn name(&self) -> &str {
        ResourceAccessor::name(self)
    }

    fn latest_value(&self) -> Option<V> {
        ResourceAccessor::latest_value(self)
    }

    fn has_value(&self) -> bool {
        ResourceAccessor::has_value(self)
    }

    fn status(&self) -> ResourceStatus {
        ResourceAccessor::status(self)
    }

    fn needs_get_call(&self) -> bool {
        ResourceAccessor::needs_get_call(self)
    }

    fn fetch(&self) -> Fetch<V, ErrorOf<R>> {
        ResourceAccessor::fetch(self)
    }

    fn set(&self, value: V) -> Task<(), ErrorOf<R>> {
        ResourceAccessor::set(self, value)
    }

    fn changes(&self) -> &ChangeNotifier {
        ResourceAccessor::changes(self)
    }
}

impl<R: Repository, V: Clone + Send + Sync + 'static> RepositoryResource for ResourceAccessor<R, V> {
    type Repository = R;

    fn bind(&self, repository: &Arc<R>) -> bool {
        ResourceAccessor::bind(self, repository)
    }

    fn repository(&self) -> Option<Arc<R>> {
        ResourceAccessor::repository(self)
    }
}
