//! The [`Repository`] trait, its execution pipeline and [`RepositoryCore`].

use std::sync::Arc;

use core::fmt;
use core::future::Future;

use futures::future::{self, BoxFuture};
use parking_lot::RwLock;
use tether_endpoint::{
    BuildRequestContext, DecodeOutputContext, Endpoint, Interface, RequestOf, RunError,
};

use crate::cancellables::Cancellables;
use crate::change::ChangeNotifier;
use crate::session::Session;
use crate::task::{PendingTask, Task};

/// A request already built and waiting to be dispatched and decoded.
pub type Dispatch<T, E> = BoxFuture<'static, Result<T, E>>;

/// The error family of a repository's interface.
pub type ErrorOf<R> = <<R as Repository>::Interface as Interface>::Error;

/// Builds the request synchronously and returns the dispatch → decode future.
pub(crate) fn prepare<I, S, E>(
    interface: Arc<I>,
    session: Arc<S>,
    endpoint: &E,
    input: E::Input,
    options: E::Options,
) -> Result<Dispatch<E::Output, I::Error>, I::Error>
where
    I: Interface,
    S: Session<Request = I::Request>,
    E: Endpoint<Root = I>,
{
    let request = endpoint
        .build_request(&input, &BuildRequestContext::new(&*interface, &options))
        .map_err(|err| {
            tracing::warn!(endpoint = endpoint.name(), error = %err, "failed to build request");
            I::Error::from(RunError::BuildRequestFailed(err))
        })?;

    let endpoint = endpoint.clone();
    Ok(Box::pin(async move {
        tracing::debug!(endpoint = endpoint.name(), "dispatching request");
        let response = session.execute(&request).await.map_err(|err| {
            tracing::warn!(endpoint = endpoint.name(), error = %err, "transport failed");
            I::Error::from(RunError::transport(err))
        })?;

        let context = DecodeOutputContext {
            root: &*interface,
            input: &input,
            options: &options,
            request: &request,
        };
        let output = endpoint.decode_output(response, &context).map_err(|err| {
            tracing::warn!(endpoint = endpoint.name(), error = %err, "failed to decode output");
            I::Error::from(RunError::DecodeFailed(err))
        })?;
        tracing::debug!(endpoint = endpoint.name(), "request completed");
        Ok(output)
    }))
}

/// Couples one [`Interface`] with one [`Session`] and runs endpoints.
///
/// Implementors provide the four accessors; every running operation is a
/// provided method. Tasks started through a repository are registered in both
/// its own [`Cancellables`] and the session's, so tearing either down cancels
/// outstanding work.
///
/// Most repositories embed a [`RepositoryCore`] and delegate to it:
///
/// ```ignore
/// struct DirectoryRepository {
///     core: RepositoryCore<DirectoryApi, HttpSession>,
///     profile: ResourceAccessor<Self, Profile>,
/// }
///
/// impl Repository for DirectoryRepository {
///     type Interface = DirectoryApi;
///     type Session = HttpSession;
///
///     fn interface(&self) -> Arc<DirectoryApi> { self.core.interface() }
///     fn session(&self) -> Arc<HttpSession> { self.core.session() }
///     fn changes(&self) -> &ChangeNotifier { self.core.changes() }
///     fn cancellables(&self) -> &Cancellables { self.core.cancellables() }
/// }
/// ```
pub trait Repository: Send + Sync + 'static {
    /// The endpoint catalog.
    type Interface: Interface;
    /// The transport executing the catalog's requests.
    type Session: Session<Request = RequestOf<Self::Interface>>;

    /// Returns the current interface value.
    fn interface(&self) -> Arc<Self::Interface>;

    /// Returns the session.
    fn session(&self) -> Arc<Self::Session>;

    /// Returns the "did change" broadcast of this repository.
    fn changes(&self) -> &ChangeNotifier;

    /// Returns the set of tasks this repository started and that are still running.
    fn cancellables(&self) -> &Cancellables;

    /// Builds the request for `input` and returns the remaining pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::BuildRequestFailed`] (converted into the interface's
    /// error) if the request cannot be built. Nothing is sent in that case.
    fn prepare<E>(
        &self,
        endpoint: &E,
        input: E::Input,
        options: E::Options,
    ) -> Result<Dispatch<E::Output, ErrorOf<Self>>, ErrorOf<Self>>
    where
        E: Endpoint<Root = Self::Interface>,
    {
        prepare(self.interface(), self.session(), endpoint, input, options)
    }

    /// Runs `endpoint` on the caller's task, without spawning or registering it.
    fn execute<E>(
        &self,
        endpoint: &E,
        input: E::Input,
        options: E::Options,
    ) -> Dispatch<E::Output, ErrorOf<Self>>
    where
        E: Endpoint<Root = Self::Interface>,
    {
        match self.prepare(endpoint, input, options) {
            Ok(dispatch) => dispatch,
            Err(err) => Box::pin(future::ready(Err(err))),
        }
    }

    /// Spawns `future` as a task registered with this repository and its session.
    fn spawn<T, F>(&self, future: F) -> Task<T, ErrorOf<Self>>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, ErrorOf<Self>>> + Send + 'static,
    {
        let session = self.session();
        Task::spawn(future, &[self.cancellables(), session.cancellables()])
    }

    /// Runs `endpoint` with `input` and `options` as a cancellable task.
    ///
    /// The request is built before this returns; a build failure yields an
    /// already-failed task and nothing is sent.
    fn run<E>(
        &self,
        endpoint: &E,
        input: E::Input,
        options: E::Options,
    ) -> Task<E::Output, ErrorOf<Self>>
    where
        E: Endpoint<Root = Self::Interface>,
    {
        match self.prepare(endpoint, input, options) {
            Ok(dispatch) => self.spawn(dispatch),
            Err(err) => Task::ready(Err(err)),
        }
    }

    /// Returns a [`PendingTask`] for `endpoint` that starts once it has input.
    fn task<E>(&self, endpoint: &E) -> PendingTask<Self::Interface, Self::Session, E>
    where
        E: Endpoint<Root = Self::Interface>,
    {
        let session = self.session();
        let registries = [self.cancellables().clone(), session.cancellables().clone()];
        PendingTask::new(self.interface(), session, registries, endpoint.clone())
    }

    /// Runs the endpoint `locate` picks from the current interface.
    fn call<E, L>(&self, locate: L, input: E::Input) -> Task<E::Output, ErrorOf<Self>>
    where
        E: Endpoint<Root = Self::Interface, Options = ()>,
        L: FnOnce(&Self::Interface) -> &E,
    {
        let interface = self.interface();
        self.run(locate(&*interface), input, ())
    }

    /// Runs an endpoint built on demand, e.g. from a static catalog.
    fn call_static<E, M>(&self, make: M, input: E::Input) -> Task<E::Output, ErrorOf<Self>>
    where
        E: Endpoint<Root = Self::Interface, Options = ()>,
        M: FnOnce() -> E,
    {
        self.run(&make(), input, ())
    }

    /// Captures the endpoint `locate` picks as a reusable callable.
    fn endpoint<E, L>(&self, locate: L) -> RunEndpointFunction<'_, Self, E>
    where
        Self: Sized,
        E: Endpoint<Root = Self::Interface, Options = ()>,
        L: FnOnce(&Self::Interface) -> &E,
    {
        let interface = self.interface();
        RunEndpointFunction {
            repository: self,
            endpoint: locate(&*interface).clone(),
        }
    }
}

/// A captured endpoint bound to a repository.
///
/// Returned by [`Repository::endpoint`]; each call starts a new task.
pub struct RunEndpointFunction<'r, R: Repository, E> {
    repository: &'r R,
    endpoint: E,
}

impl<'r, R, E> RunEndpointFunction<'r, R, E>
where
    R: Repository,
    E: Endpoint<Root = R::Interface, Options = ()>,
{
    /// Runs the endpoint with `input`.
    pub fn call(&self, input: E::Input) -> Task<E::Output, ErrorOf<R>> {
        self.repository.run(&self.endpoint, input, ())
    }

    /// Runs the endpoint with the default input.
    pub fn call_default(&self) -> Task<E::Output, ErrorOf<R>>
    where
        E::Input: Default,
    {
        self.call(E::Input::default())
    }

    /// Returns the captured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }
}

/// Ready-made repository state: a swappable interface, a session, a change
/// broadcast and a cancellable set.
///
/// Dropping the core cancels every task still registered with it.
pub struct RepositoryCore<I, S> {
    interface: RwLock<Arc<I>>,
    session: Arc<S>,
    changes: ChangeNotifier,
    cancellables: Cancellables,
}

impl<I: Interface, S: Session> fmt::Debug for RepositoryCore<I, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryCore")
            .field("interface", &self.interface.read().id())
            .field("in_flight", &self.cancellables.len())
            .finish_non_exhaustive()
    }
}

impl<I: Interface, S: Session<Request = I::Request>> RepositoryCore<I, S> {
    /// Creates a core owning `interface` and `session`.
    pub fn new(interface: I, session: S) -> Self {
        Self::with_shared_session(interface, Arc::new(session))
    }

    /// Creates a core whose session is shared with other repositories.
    pub fn with_shared_session(interface: I, session: Arc<S>) -> Self {
        Self {
            interface: RwLock::new(Arc::new(interface)),
            session,
            changes: ChangeNotifier::new(),
            cancellables: Cancellables::new(),
        }
    }

    /// Returns the current interface value.
    #[must_use]
    pub fn interface(&self) -> Arc<I> {
        Arc::clone(&self.interface.read())
    }

    /// Returns the session.
    #[must_use]
    pub fn session(&self) -> Arc<S> {
        Arc::clone(&self.session)
    }

    /// Returns the change broadcast.
    #[must_use]
    pub fn changes(&self) -> &ChangeNotifier {
        &self.changes
    }

    /// Returns the set of in-flight tasks.
    #[must_use]
    pub fn cancellables(&self) -> &Cancellables {
        &self.cancellables
    }

    /// Swaps the interface and fires the change broadcast.
    ///
    /// Tasks already running keep the interface they started with.
    pub fn set_interface(&self, interface: I) {
        let to = interface.id();
        let previous = core::mem::replace(&mut *self.interface.write(), Arc::new(interface));
        tracing::debug!(from = ?previous.id(), to = ?to, "repository interface replaced");
        self.changes.notify();
    }

    /// Cancels every task still registered with this core.
    pub fn teardown(&self) -> usize {
        self.cancellables.cancel_all()
    }
}

impl<I, S> Drop for RepositoryCore<I, S> {
    fn drop(&mut self) {
        let cancelled = self.cancellables.cancel_all();
        if cancelled > 0 {
            tracing::debug!(cancelled, "repository dropped with tasks in flight");
        }
    }
}

impl<I, S> Repository for RepositoryCore<I, S>
where
    I: Interface,
    S: Session<Request = I::Request>,
{
    type Interface = I;
    type Session = S;

    fn interface(&self) -> Arc<I> {
        RepositoryCore::interface(self)
    }

    fn session(&self) -> Arc<S> {
        RepositoryCore::session(self)
    }

    fn changes(&self) -> &ChangeNotifier {
        RepositoryCore::changes(self)
    }

    fn cancellables(&self) -> &Cancellables {
        RepositoryCore::cancellables(self)
    }
}
