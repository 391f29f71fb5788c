//! Type-erased resources.

use std::sync::Arc;

use core::fmt;

use tether_repository::{ChangeNotifier, ErrorOf, Repository, Task};

use crate::resource::{Fetch, RepositoryResource, Resource, ResourceStatus};

/// Any [`Resource`] with a given value and error type.
pub struct AnyResource<V, E> {
    inner: Arc<dyn Resource<Value = V, Error = E>>,
}

impl<V, E> Clone for AnyResource<V, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V, E> fmt::Debug for AnyResource<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyResource")
            .field("name", &self.inner.name())
            .field("status", &self.inner.status())
            .finish()
    }
}

impl<V, E> AnyResource<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    /// Erases `resource`.
    pub fn new<T>(resource: T) -> Self
    where
        T: Resource<Value = V, Error = E>,
    {
        Self {
            inner: Arc::new(resource),
        }
    }
}

impl<V, E> Resource for AnyResource<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    type Value = V;
    type Error = E;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn latest_value(&self) -> Option<V> {
        self.inner.latest_value()
    }

    fn has_value(&self) -> bool {
        self.inner.has_value()
    }

    fn status(&self) -> ResourceStatus {
        self.inner.status()
    }

    fn needs_get_call(&self) -> bool {
        self.inner.needs_get_call()
    }

    fn fetch(&self) -> Fetch<V, E> {
        self.inner.fetch()
    }

    fn set(&self, value: V) -> Task<(), E> {
        self.inner.set(value)
    }

    fn changes(&self) -> &ChangeNotifier {
        self.inner.changes()
    }
}

type DynRepositoryResource<R, V> =
    dyn RepositoryResource<Repository = R, Value = V, Error = ErrorOf<R>>;

/// Any [`RepositoryResource`] living on repository type `R`.
///
/// The owning repository is still only held weakly by the wrapped resource.
pub struct AnyRepositoryResource<R: Repository, V> {
    inner: Arc<DynRepositoryResource<R, V>>,
}

impl<R: Repository, V> Clone for AnyRepositoryResource<R, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, V> fmt::Debug for AnyRepositoryResource<R, V>
where
    R: Repository,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyRepositoryResource")
            .field("name", &self.inner.name())
            .field("status", &self.inner.status())
            .field("bound", &self.inner.is_bound())
            .finish()
    }
}

impl<R, V> AnyRepositoryResource<R, V>
where
    R: Repository,
    V: Clone + Send + Sync + 'static,
{
    /// Erases `resource`.
    pub fn new<T>(resource: T) -> Self
    where
        T: RepositoryResource<Repository = R, Value = V, Error = ErrorOf<R>>,
    {
        Self {
            inner: Arc::new(resource),
        }
    }
}

impl<R, V> Resource for AnyRepositoryResource<R, V>
where
    R: Repository,
    V: Clone + Send + Sync + 'static,
{
    type Value = V;
    type Error = ErrorOf<R>;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn latest_value(&self) -> Option<V> {
        self.inner.latest_value()
    }

    fn has_value(&self) -> bool {
        self.inner.has_value()
    }

    fn status(&self) -> ResourceStatus {
        self.inner.status()
    }

    fn needs_get_call(&self) -> bool {
        self.inner.needs_get_call()
    }

    fn fetch(&self) -> Fetch<V, ErrorOf<R>> {
        self.inner.fetch()
    }

    fn set(&self, value: V) -> Task<(), ErrorOf<R>> {
        self.inner.set(value)
    }

    fn changes(&self) -> &ChangeNotifier {
        self.inner.changes()
    }
}

impl<R, V> RepositoryResource for AnyRepositoryResource<R, V>
where
    R: Repository,
    V: Clone + Send + Sync + 'static,
{
    type Repository = R;

    fn bind(&self, repository: &Arc<R>) -> bool {
        self.inner.bind(repository)
    }

    fn repository(&self) -> Option<Arc<R>> {
        self.inner.repository()
    }
}

/// Conversions into erased resources.
pub trait IntoAnyResource: Resource + Sized {
    /// Erases the resource's concrete type.
    fn into_any_resource(self) -> AnyResource<Self::Value, Self::Error> {
        AnyResource::new(self)
    }
}

impl<T: Resource> IntoAnyResource for T {}
