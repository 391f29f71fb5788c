//! Sets of cancellable task handles.

use std::sync::Arc;

use core::fmt;
use hashbrown::HashMap;
use parking_lot::Mutex;

use crate::task::{TaskHandle, TaskId};

/// A shared set of in-flight task handles.
///
/// Handles remove themselves once their task finishes, so the set only ever
/// holds outstanding work. Cloning shares the underlying set.
#[derive(Clone, Default)]
pub struct Cancellables {
    handles: Arc<Mutex<HashMap<TaskId, TaskHandle>>>,
}

impl fmt::Debug for Cancellables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cancellables")
            .field("in_flight", &self.len())
            .finish()
    }
}

impl Cancellables {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handle.
    pub fn insert(&self, handle: TaskHandle) {
        self.handles.lock().insert(handle.id().clone(), handle);
    }

    /// Removes a handle without cancelling it.
    pub fn remove(&self, id: &TaskId) -> Option<TaskHandle> {
        self.handles.lock().remove(id)
    }

    /// Returns `true` if a handle with this id is registered.
    #[must_use]
    pub fn contains(&self, id: &TaskId) -> bool {
        self.handles.lock().contains_key(id)
    }

    /// Returns the number of registered handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.lock().len()
    }

    /// Returns `true` if no handle is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.lock().is_empty()
    }

    /// Cancels and removes every registered handle, returning how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        // Drain first: cancelling drops task futures, which deregister themselves.
        let drained: Vec<TaskHandle> = self.handles.lock().drain().map(|(_, h)| h).collect();
        for handle in &drained {
            handle.cancel();
        }
        drained.len()
    }

    /// Returns `true` if both values share the same underlying set.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.handles, &other.handles)
    }
}
