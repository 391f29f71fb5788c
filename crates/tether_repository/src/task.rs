//! One-shot cancellable tasks.
//!
//! A [`Task`] wraps the build → dispatch → decode pipeline of a single run.
//! It delivers exactly one terminal result: awaiting it yields the output, the
//! typed failure, or [`RunError::Cancelled`] if it was cancelled first.
//!
//! Dropping a `Task` does not cancel it; the work keeps running (and keeps
//! updating any resource cache) until it finishes or someone calls
//! [`TaskHandle::cancel`].

use std::sync::Arc;

use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use parking_lot::Mutex;
use tether_endpoint::{Endpoint, Interface, RunError};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;

use crate::cancellables::Cancellables;
use crate::repository::prepare;
use crate::session::Session;

/// Unique identifier for a task.
///
/// Task IDs are generated using nanoid and use `Arc<str>` internally for cheap cloning.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(Arc<str>);

impl TaskId {
    /// Creates a new task ID with a unique nanoid.
    #[must_use]
    pub fn new() -> Self {
        Self(nanoid::nanoid!().into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task_{}", self.0)
    }
}

/// Lifecycle of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// The task is running.
    Active,
    /// The task produced an output.
    Succeeded,
    /// The task produced an error.
    Failed,
    /// The task was cancelled before finishing.
    Cancelled,
}

impl TaskStatus {
    /// Returns `true` once the task can no longer change state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskStatus::Active)
    }
}

struct HandleState {
    status: TaskStatus,
    abort: Option<AbortHandle>,
}

/// Cancellable handle to a running task.
///
/// Handles are cheap to clone and are what [`Cancellables`] sets store.
#[derive(Clone)]
pub struct TaskHandle {
    id: TaskId,
    state: Arc<Mutex<HandleState>>,
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("status", &self.status())
            .finish()
    }
}

impl TaskHandle {
    pub(crate) fn new() -> Self {
        Self {
            id: TaskId::new(),
            state: Arc::new(Mutex::new(HandleState {
                status: TaskStatus::Active,
                abort: None,
            })),
        }
    }

    /// Returns the task's ID.
    #[must_use]
    pub fn id(&self) -> &TaskId {
        &self.id
    }

    /// Returns the task's current status.
    #[must_use]
    pub fn status(&self) -> TaskStatus {
        self.state.lock().status
    }

    /// Returns `true` once the task reached a terminal status.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status().is_terminal()
    }

    /// Cancels the task.
    ///
    /// The task stops at its next suspension point and delivers nothing
    /// further. Returns `false` if the task had already finished.
    pub fn cancel(&self) -> bool {
        let abort = {
            let mut state = self.state.lock();
            if state.status != TaskStatus::Active {
                return false;
            }
            state.status = TaskStatus::Cancelled;
            state.abort.take()
        };
        if let Some(abort) = abort {
            abort.abort();
        }
        tracing::debug!(task_id = %self.id, "task cancelled");
        true
    }

    fn attach(&self, abort: AbortHandle) {
        let mut state = self.state.lock();
        if state.status == TaskStatus::Cancelled {
            drop(state);
            abort.abort();
        } else if state.status == TaskStatus::Active {
            state.abort = Some(abort);
        }
    }

    // Returns `false` if the task was cancelled before it could finish.
    fn finish(&self, status: TaskStatus) -> bool {
        let mut state = self.state.lock();
        if state.status != TaskStatus::Active {
            return false;
        }
        state.status = status;
        state.abort = None;
        true
    }
}

// Removes the task from its sets once its future is dropped, finished or aborted.
struct Registration {
    id: TaskId,
    registries: Vec<Cancellables>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        for registry in &self.registries {
            registry.remove(&self.id);
        }
    }
}

enum Inner<T, E> {
    Ready(Option<Result<T, E>>),
    Pending(oneshot::Receiver<Result<T, E>>),
}

/// A one-shot, cancellable asynchronous result.
///
/// `Task` implements [`Future`]; awaiting it yields the single terminal
/// result. Polling again after completion yields [`RunError::Cancelled`].
pub struct Task<T, E> {
    handle: TaskHandle,
    inner: Inner<T, E>,
}

// `Task` never pin-projects into its fields.
impl<T, E> Unpin for Task<T, E> {}

impl<T, E> fmt::Debug for Task<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", self.handle.id())
            .field("status", &self.handle.status())
            .finish()
    }
}

impl<T, E> Task<T, E> {
    /// Creates an already-completed task.
    #[must_use]
    pub fn ready(result: Result<T, E>) -> Self {
        let handle = TaskHandle::new();
        handle.finish(if result.is_ok() {
            TaskStatus::Succeeded
        } else {
            TaskStatus::Failed
        });
        Self {
            handle,
            inner: Inner::Ready(Some(result)),
        }
    }

    /// Spawns `future` on the current Tokio runtime.
    ///
    /// The task's handle is registered in every set of `registries` until the
    /// task finishes or is cancelled. Without a runtime the task fails with
    /// [`RunError::NoRuntime`] and `future` is dropped unpolled.
    pub fn spawn<F>(future: F, registries: &[&Cancellables]) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: From<RunError> + Send + 'static,
    {
        let handle = TaskHandle::new();
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!(task_id = %handle.id(), "no tokio runtime available; failing task");
            handle.finish(TaskStatus::Failed);
            return Self {
                handle,
                inner: Inner::Ready(Some(Err(RunError::NoRuntime.into()))),
            };
        };

        for registry in registries {
            registry.insert(handle.clone());
        }
        let registration = Registration {
            id: handle.id().clone(),
            registries: registries.iter().map(|r| (*r).clone()).collect(),
        };

        let (sender, receiver) = oneshot::channel();
        let shared = handle.clone();
        let join = runtime.spawn(async move {
            let _registration = registration;
            let result = future.await;
            let finished = shared.finish(if result.is_ok() {
                TaskStatus::Succeeded
            } else {
                TaskStatus::Failed
            });
            if !finished {
                // Cancelled during the final poll; the receiver resolves to Cancelled.
                tracing::trace!(task_id = %shared.id(), "result discarded after cancel");
                return;
            }
            if sender.send(result).is_err() {
                tracing::trace!(task_id = %shared.id(), "task finished without a receiver");
            }
        });
        handle.attach(join.abort_handle());

        Self {
            handle,
            inner: Inner::Pending(receiver),
        }
    }

    /// Returns the task's ID.
    #[must_use]
    pub fn id(&self) -> &TaskId {
        self.handle.id()
    }

    /// Returns a cancellable handle to this task.
    #[must_use]
    pub fn handle(&self) -> &TaskHandle {
        &self.handle
    }

    /// Returns the task's current status.
    #[must_use]
    pub fn status(&self) -> TaskStatus {
        self.handle.status()
    }

    /// Cancels the task. See [`TaskHandle::cancel`].
    pub fn cancel(&self) -> bool {
        self.handle.cancel()
    }
}

impl<T, E: From<RunError>> Future for Task<T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.inner {
            Inner::Ready(result) => {
                Poll::Ready(result.take().unwrap_or_else(|| Err(RunError::Cancelled.into())))
            }
            Inner::Pending(receiver) => {
                let Poll::Ready(received) = Pin::new(receiver).poll(cx) else {
                    return Poll::Pending;
                };
                this.inner = Inner::Ready(None);
                Poll::Ready(received.unwrap_or_else(|_| Err(RunError::Cancelled.into())))
            }
        }
    }
}

/// A task that has not received its input yet.
///
/// Created by [`Repository::task`](crate::Repository::task). Call
/// [`receive`](Self::receive) and then [`start`](Self::start); starting
/// without input resolves to [`RunError::MissingInput`].
pub struct PendingTask<I: Interface, S, E: Endpoint> {
    interface: Arc<I>,
    session: Arc<S>,
    registries: [Cancellables; 2],
    endpoint: E,
    input: Option<(E::Input, E::Options)>,
}

impl<I, S, E> PendingTask<I, S, E>
where
    I: Interface,
    S: Session<Request = I::Request>,
    E: Endpoint<Root = I>,
{
    pub(crate) fn new(
        interface: Arc<I>,
        session: Arc<S>,
        registries: [Cancellables; 2],
        endpoint: E,
    ) -> Self {
        Self {
            interface,
            session,
            registries,
            endpoint,
            input: None,
        }
    }

    /// Supplies the input and options, replacing any earlier ones.
    pub fn receive(&mut self, input: E::Input, options: E::Options) -> &mut Self {
        self.input = Some((input, options));
        self
    }

    /// Supplies the input and options, consuming `self`.
    #[must_use]
    pub fn with_input(mut self, input: E::Input, options: E::Options) -> Self {
        self.receive(input, options);
        self
    }

    /// Returns `true` once input has been received.
    #[must_use]
    pub fn has_input(&self) -> bool {
        self.input.is_some()
    }

    /// Starts the pipeline.
    pub fn start(self) -> Task<E::Output, I::Error> {
        let Some((input, options)) = self.input else {
            tracing::warn!(endpoint = self.endpoint.name(), "task started without input");
            return Task::ready(Err(RunError::MissingInput.into()));
        };
        let [repository, session] = &self.registries;
        match prepare(self.interface, self.session, &self.endpoint, input, options) {
            Ok(dispatch) => Task::spawn(dispatch, &[repository, session]),
            Err(err) => Task::ready(Err(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_task_reports_terminal_status() {
        let ok: Task<u8, RunError> = Task::ready(Ok(1));
        let failed: Task<u8, RunError> = Task::ready(Err(RunError::MissingInput));
        assert_eq!(ok.status(), TaskStatus::Succeeded);
        assert_eq!(failed.status(), TaskStatus::Failed);
        assert!(!ok.cancel());
    }

    #[test]
    fn spawn_without_runtime_fails_with_no_runtime() {
        let registry = Cancellables::new();
        let task: Task<u8, RunError> = Task::spawn(async { Ok(1) }, &[&registry]);
        assert_eq!(task.status(), TaskStatus::Failed);
        assert!(registry.is_empty());

        let result = futures::executor::block_on(task);
        assert!(matches!(result, Err(RunError::NoRuntime)));
    }

    #[tokio::test]
    async fn spawned_task_deregisters_when_done() {
        let registry = Cancellables::new();
        let task: Task<u8, RunError> = Task::spawn(async { Ok(7) }, &[&registry]);
        let handle = task.handle().clone();

        assert_eq!(task.await.ok(), Some(7));
        assert_eq!(handle.status(), TaskStatus::Succeeded);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn cancelled_task_resolves_to_cancelled() {
        let registry = Cancellables::new();
        let task: Task<u8, RunError> =
            Task::spawn(futures::future::pending(), &[&registry]);
        assert_eq!(registry.len(), 1);

        assert!(task.cancel());
        let result = task.await;

        assert!(matches!(result, Err(RunError::Cancelled)));
        tokio::task::yield_now().await;
        assert!(registry.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancel_during_final_poll_discards_result() {
        let (handle_tx, handle_rx) = oneshot::channel::<TaskHandle>();
        let task: Task<u8, RunError> = Task::spawn(
            async move {
                let Ok(handle) = handle_rx.await else {
                    return Err(RunError::MissingInput);
                };
                // The abort lands while this poll is still running, so it cannot interrupt it.
                assert!(handle.cancel());
                Ok(3)
            },
            &[],
        );
        handle_tx.send(task.handle().clone()).unwrap();

        let result = task.await;

        assert!(matches!(result, Err(RunError::Cancelled)), "got {result:?}");
    }
}
