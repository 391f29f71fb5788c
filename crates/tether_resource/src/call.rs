//! Get and set coordinators.
//!
//! A [`GetCall`] knows how to turn the current repository state into a
//! running get pipeline; a [`SetCall`] does the same for writes. Both locate
//! their endpoint on the repository's *current* interface every time, so an
//! interface swap takes effect on the next call.

use std::sync::Arc;

use core::fmt;

use futures::TryFutureExt;
use tether_endpoint::Endpoint;
use tether_repository::{Dispatch, ErrorOf, Repository};

type GetFn<R, V> = dyn Fn(&R) -> Option<Dispatch<V, ErrorOf<R>>> + Send + Sync;
type SetFn<R, V> = dyn Fn(&R, &V) -> Option<Dispatch<(), ErrorOf<R>>> + Send + Sync;

/// Produces the get pipeline of a resource.
pub struct GetCall<R: Repository, V> {
    dispatch: Arc<GetFn<R, V>>,
}

impl<R: Repository, V> Clone for GetCall<R, V> {
    fn clone(&self) -> Self {
        Self {
            dispatch: Arc::clone(&self.dispatch),
        }
    }
}

impl<R: Repository, V> fmt::Debug for GetCall<R, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GetCall").finish_non_exhaustive()
    }
}

impl<R: Repository, V: Send + 'static> GetCall<R, V> {
    /// Gets through the endpoint `locate` picks, with its default input.
    pub fn new<E, L>(locate: L) -> Self
    where
        E: Endpoint<Root = R::Interface, Output = V, Options = ()>,
        E::Input: Default,
        L: Fn(&R::Interface) -> &E + Send + Sync + 'static,
    {
        Self::from_parts(locate, |_| Some((E::Input::default(), ())))
    }

    /// Gets through the endpoint `locate` picks, always with `input`.
    pub fn with_input<E, L>(locate: L, input: E::Input) -> Self
    where
        E: Endpoint<Root = R::Interface, Output = V, Options = ()>,
        E::Input: Clone,
        L: Fn(&R::Interface) -> &E + Send + Sync + 'static,
    {
        Self::from_parts(locate, move |_| Some((input.clone(), ())))
    }

    /// Gets through the endpoint `locate` picks, with input derived from the
    /// repository.
    ///
    /// `make_input` returning `None` skips the fetch as if a dependency were
    /// unmet.
    pub fn from_parts<E, L, M>(locate: L, make_input: M) -> Self
    where
        E: Endpoint<Root = R::Interface, Output = V>,
        L: Fn(&R::Interface) -> &E + Send + Sync + 'static,
        M: Fn(&R) -> Option<(E::Input, E::Options)> + Send + Sync + 'static,
    {
        Self {
            dispatch: Arc::new(move |repository: &R| {
                let (input, options) = make_input(repository)?;
                let interface = repository.interface();
                Some(repository.execute(locate(&*interface), input, options))
            }),
        }
    }

    /// Maps the fetched output into another value.
    pub fn map<U, F>(self, f: F) -> GetCall<R, U>
    where
        U: Send + 'static,
        F: Fn(V) -> U + Send + Sync + 'static,
    {
        let dispatch = self.dispatch;
        let f = Arc::new(f);
        GetCall {
            dispatch: Arc::new(move |repository: &R| {
                let next = dispatch(repository)?;
                let f = Arc::clone(&f);
                let mapped: Dispatch<U, ErrorOf<R>> = Box::pin(next.map_ok(move |value| f(value)));
                Some(mapped)
            }),
        }
    }

    /// Builds the get pipeline, or `None` if no input is available yet.
    pub fn dispatch(&self, repository: &R) -> Option<Dispatch<V, ErrorOf<R>>> {
        (self.dispatch)(repository)
    }
}

/// Produces the set pipeline of a resource.
pub struct SetCall<R: Repository, V> {
    dispatch: Arc<SetFn<R, V>>,
}

impl<R: Repository, V> Clone for SetCall<R, V> {
    fn clone(&self) -> Self {
        Self {
            dispatch: Arc::clone(&self.dispatch),
        }
    }
}

impl<R: Repository, V> fmt::Debug for SetCall<R, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetCall").finish_non_exhaustive()
    }
}

impl<R: Repository, V: 'static> SetCall<R, V> {
    /// Writes through the endpoint `locate` picks, using the value as input.
    ///
    /// The endpoint's output is discarded.
    pub fn new<E, L>(locate: L) -> Self
    where
        V: Clone + Send + Sync,
        E: Endpoint<Root = R::Interface, Input = V, Options = ()>,
        L: Fn(&R::Interface) -> &E + Send + Sync + 'static,
    {
        Self::from_parts(locate, |_, value: &V| Some((value.clone(), ())))
    }

    /// Writes through the endpoint `locate` picks, with input derived from
    /// the repository and the value.
    ///
    /// `make_input` returning `None` refuses the write.
    pub fn from_parts<E, L, M>(locate: L, make_input: M) -> Self
    where
        E: Endpoint<Root = R::Interface>,
        L: Fn(&R::Interface) -> &E + Send + Sync + 'static,
        M: Fn(&R, &V) -> Option<(E::Input, E::Options)> + Send + Sync + 'static,
    {
        Self {
            dispatch: Arc::new(move |repository: &R, value: &V| {
                let (input, options) = make_input(repository, value)?;
                let interface = repository.interface();
                let write: Dispatch<(), ErrorOf<R>> = Box::pin(
                    repository
                        .execute(locate(&*interface), input, options)
                        .map_ok(|_| ()),
                );
                Some(write)
            }),
        }
    }

    /// Builds the set pipeline for `value`, or `None` if no input is
    /// available.
    pub fn dispatch(&self, repository: &R, value: &V) -> Option<Dispatch<(), ErrorOf<R>>> {
        (self.dispatch)(repository, value)
    }
}
