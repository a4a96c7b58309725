use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type Teardown = Box<dyn FnOnce() + Send>;

struct SubscriptionInner {
    closed: AtomicBool,
    teardowns: Mutex<Vec<Teardown>>,
}

/// Handle to an active observation of a stream.
///
/// Cancelling is explicit: dropping a `Subscription` leaves the observer
/// attached. Call [`unsubscribe`](Self::unsubscribe), or convert the handle
/// into a [`SubscriptionGuard`] to tie it to a scope.
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<SubscriptionInner>,
}

impl Subscription {
    pub fn new<F>(teardown: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let subscription = Self::empty();
        subscription.add(teardown);
        subscription
    }

    /// A subscription with nothing to tear down.
    pub fn empty() -> Self {
        Self {
            inner: Arc::new(SubscriptionInner {
                closed: AtomicBool::new(false),
                teardowns: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Register additional teardown logic.
    ///
    /// Runs immediately if the subscription is already closed.
    pub fn add<F>(&self, teardown: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut teardowns = self.inner.teardowns.lock();
        if self.is_closed() {
            drop(teardowns);
            teardown();
            return;
        }
        teardowns.push(Box::new(teardown));
    }

    /// Cancel `child` together with this subscription.
    pub fn add_subscription(&self, child: Subscription) {
        self.add(move || child.unsubscribe());
    }

    /// Cancel the observation. Teardown runs once; later calls are no-ops.
    pub fn unsubscribe(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let teardowns = std::mem::take(&mut *self.inner.teardowns.lock());
        for teardown in teardowns {
            teardown();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Convert into a guard that unsubscribes when dropped.
    pub fn guard(self) -> SubscriptionGuard {
        SubscriptionGuard { subscription: self }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// RAII guard for a [`Subscription`].
#[must_use = "dropping the guard cancels the subscription"]
pub struct SubscriptionGuard {
    subscription: Subscription,
}

impl SubscriptionGuard {
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn teardown_runs_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let subscription = Subscription::new(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        subscription.unsubscribe();
        subscription.clone().unsubscribe();

        assert!(subscription.is_closed());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn add_after_close_runs_immediately() {
        let subscription = Subscription::empty();
        subscription.unsubscribe();

        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = ran.clone();
        subscription.add(move || ran_clone.store(true, Ordering::SeqCst));

        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn child_closes_with_parent() {
        let parent = Subscription::empty();
        let child = Subscription::empty();
        parent.add_subscription(child.clone());

        parent.unsubscribe();
        assert!(child.is_closed());
    }

    #[test]
    fn guard_unsubscribes_on_drop() {
        let subscription = Subscription::empty();
        {
            let _guard = subscription.clone().guard();
            assert!(!subscription.is_closed());
        }
        assert!(subscription.is_closed());
    }

    #[test]
    fn dropping_handle_keeps_subscription_open() {
        let subscription = Subscription::empty();
        drop(subscription.clone());
        assert!(!subscription.is_closed());
    }
}
