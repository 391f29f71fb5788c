//! Dependency predicates gating resource fetches.

use std::borrow::Cow;
use std::sync::Arc;

use core::fmt;

use crate::resource::Resource;

/// A predicate over the owning repository that must hold before a resource
/// may fetch.
///
/// Predicates are evaluated on every fetch attempt and never cached.
pub struct Dependency<R> {
    label: Cow<'static, str>,
    probe: Arc<dyn Fn(&R) -> bool + Send + Sync>,
}

impl<R> Clone for Dependency<R> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            probe: Arc::clone(&self.probe),
        }
    }
}

impl<R> fmt::Debug for Dependency<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl<R> Dependency<R> {
    /// Holds while the sibling resource `locate` picks has a value.
    pub fn on<A, L>(locate: L) -> Self
    where
        A: Resource,
        L: Fn(&R) -> &A + Send + Sync + 'static,
    {
        Self {
            label: Cow::Borrowed(core::any::type_name::<A>()),
            probe: Arc::new(move |repository: &R| locate(repository).has_value()),
        }
    }

    /// Holds while `predicate` returns `true`.
    pub fn when<P>(label: impl Into<Cow<'static, str>>, predicate: P) -> Self
    where
        P: Fn(&R) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            probe: Arc::new(predicate),
        }
    }

    /// Returns the dependency's label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Evaluates the predicate against `repository`.
    #[must_use]
    pub fn is_available(&self, repository: &R) -> bool {
        (self.probe)(repository)
    }
}
