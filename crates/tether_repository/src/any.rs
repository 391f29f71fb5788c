//! Type-erased repositories.

use std::sync::Arc;

use core::fmt;

use tether_endpoint::Interface;

use crate::cancellables::Cancellables;
use crate::change::ChangeNotifier;
use crate::repository::Repository;
use crate::session::Session;

/// A repository with its concrete type erased.
///
/// Keeps the wrapped repository alive and shares its change broadcast and
/// cancellable set, so anything running through the erased value behaves
/// exactly as if it ran through the original.
pub struct AnyRepository<I, S> {
    interface: Arc<dyn Fn() -> Arc<I> + Send + Sync>,
    session: Arc<dyn Fn() -> Arc<S> + Send + Sync>,
    changes: ChangeNotifier,
    cancellables: Cancellables,
}

impl<I, S> Clone for AnyRepository<I, S> {
    fn clone(&self) -> Self {
        Self {
            interface: Arc::clone(&self.interface),
            session: Arc::clone(&self.session),
            changes: self.changes.clone(),
            cancellables: self.cancellables.clone(),
        }
    }
}

impl<I: Interface, S> fmt::Debug for AnyRepository<I, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyRepository")
            .field("interface", &(self.interface)().id())
            .field("in_flight", &self.cancellables.len())
            .finish_non_exhaustive()
    }
}

impl<I, S> AnyRepository<I, S>
where
    I: Interface,
    S: Session<Request = I::Request>,
{
    /// Erases `repository`.
    pub fn new<R>(repository: Arc<R>) -> Self
    where
        R: Repository<Interface = I, Session = S>,
    {
        let changes = repository.changes().clone();
        let cancellables = repository.cancellables().clone();
        let for_session = Arc::clone(&repository);
        Self {
            interface: Arc::new(move || repository.interface()),
            session: Arc::new(move || for_session.session()),
            changes,
            cancellables,
        }
    }
}

impl<I, S> Repository for AnyRepository<I, S>
where
    I: Interface,
    S: Session<Request = I::Request>,
{
    type Interface = I;
    type Session = S;

    fn interface(&self) -> Arc<I> {
        (self.interface)()
    }

    fn session(&self) -> Arc<S> {
        (self.session)()
    }

    fn changes(&self) -> &ChangeNotifier {
        &self.changes
    }

    fn cancellables(&self) -> &Cancellables {
        &self.cancellables
    }
}

/// Converts a shared repository into an [`AnyRepository`].
pub trait IntoAnyRepository: Repository + Sized {
    /// Erases the repository's concrete type.
    fn into_any_repository(self: Arc<Self>) -> AnyRepository<Self::Interface, Self::Session> {
        AnyRepository::new(self)
    }
}

impl<R: Repository> IntoAnyRepository for R {}
