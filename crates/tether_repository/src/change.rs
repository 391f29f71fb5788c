//! Payload-free change broadcast.
//!
//! A [`ChangeNotifier`] carries "something changed" signals from resources and
//! repositories to whoever is interested. Subscribers receive no payload; they
//! re-read whatever state they care about.

use std::sync::{Arc, Weak};

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

type Callback = Arc<dyn Fn() + Send + Sync>;

struct NotifierInner {
    subscribers: RwLock<Vec<(u64, Callback)>>,
    next_id: AtomicU64,
}

/// A broadcast point for change signals.
///
/// Cloning shares the subscriber list. Callbacks run synchronously on the
/// notifying thread, outside of any internal lock, so a callback may freely
/// subscribe, unsubscribe or notify again.
#[derive(Clone)]
pub struct ChangeNotifier {
    inner: Arc<NotifierInner>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl ChangeNotifier {
    /// Creates a notifier without subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(NotifierInner {
                subscribers: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Registers `callback` until the returned [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers.write().push((id, Arc::new(callback)));
        Subscription {
            id,
            notifier: Some(Arc::downgrade(&self.inner)),
        }
    }

    /// Invokes every current subscriber once.
    pub fn notify(&self) {
        let snapshot: Vec<Callback> = self
            .inner
            .subscribers
            .read()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in snapshot {
            callback();
        }
    }

    /// Re-broadcasts every signal of `self` on `target`.
    ///
    /// The forwarding holds `target` weakly; it goes quiet once every clone of
    /// `target` is dropped.
    pub fn forward_to(&self, target: &ChangeNotifier) -> Subscription {
        let target = Arc::downgrade(&target.inner);
        self.subscribe(move || {
            if let Some(inner) = target.upgrade() {
                ChangeNotifier { inner }.notify();
            }
        })
    }

    /// Returns the number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }

    /// Returns `true` if both values share the same subscriber list.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Keeps a [`ChangeNotifier`] callback registered.
///
/// Dropping the subscription unregisters the callback.
#[must_use = "dropping a subscription unregisters its callback"]
pub struct Subscription {
    id: u64,
    notifier: Option<Weak<NotifierInner>>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Subscription {
    /// Returns `true` while the callback is registered on a live notifier.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.notifier
            .as_ref()
            .and_then(Weak::upgrade)
            .is_some_and(|inner| inner.subscribers.read().iter().any(|(id, _)| *id == self.id))
    }

    /// Keeps the callback registered for the notifier's whole lifetime.
    pub fn detach(mut self) {
        self.notifier = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.notifier.take().and_then(|weak| weak.upgrade()) {
            inner.subscribers.write().retain(|(id, _)| *id != self.id);
        }
    }
}
