use super::{Observable, Observer, Subscription};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

struct Entry<T> {
    id: u64,
    observer: Observer<T>,
    subscription: Subscription,
}

struct SubjectState<T> {
    observers: Vec<Entry<T>>,
    latest: Option<T>,
}

struct SubjectInner<T> {
    state: Mutex<SubjectState<T>>,
    replay: bool,
    next_id: AtomicU64,
}

/// Multicast broadcaster with an optional replay slot.
///
/// A replaying subject remembers the most recent value and hands it to every
/// new subscriber before any later value.
///
/// # Examples
///
/// ```
/// use tincan_store::observable::Subject;
/// use std::sync::{Arc, Mutex};
///
/// let subject = Subject::replay(1);
/// subject.next(2);
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let seen_clone = seen.clone();
/// let _subscription = subject.subscribe(move |v| seen_clone.lock().unwrap().push(v));
///
/// subject.next(3);
/// assert_eq!(*seen.lock().unwrap(), vec![2, 3]);
/// ```
pub struct Subject<T> {
    inner: Arc<SubjectInner<T>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> Subject<T> {
    /// A subject without replay: late subscribers only see later values.
    pub fn new() -> Self {
        Self::build(None, false)
    }

    /// A subject that replays its latest value, starting with `initial`.
    pub fn replay(initial: T) -> Self {
        Self::build(Some(initial), true)
    }

    fn build(latest: Option<T>, replay: bool) -> Self {
        Self {
            inner: Arc::new(SubjectInner {
                state: Mutex::new(SubjectState {
                    observers: Vec::new(),
                    latest,
                }),
                replay,
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Push a value to every current observer.
    ///
    /// The observer list is snapshotted and the lock released before any
    /// observer runs, so observers may subscribe, unsubscribe or push again.
    pub fn next(&self, value: T) {
        let observers: Vec<(Observer<T>, Subscription)> = {
            let mut state = self.inner.state.lock();
            if self.inner.replay {
                state.latest = Some(value.clone());
            }
            state
                .observers
                .iter()
                .map(|entry| (Arc::clone(&entry.observer), entry.subscription.clone()))
                .collect()
        };

        for (observer, subscription) in observers {
            if !subscription.is_closed() {
                observer(value.clone());
            }
        }
    }

    /// The replayed value, if this subject replays and has one.
    pub fn latest(&self) -> Option<T> {
        self.inner.state.lock().latest.clone()
    }

    pub fn observer_count(&self) -> usize {
        self.inner.state.lock().observers.len()
    }

    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.subscribe_observer(Arc::new(observer))
    }

    pub(crate) fn subscribe_observer(&self, observer: Observer<T>) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let weak: Weak<SubjectInner<T>> = Arc::downgrade(&self.inner);
        let subscription = Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.state.lock().observers.retain(|entry| entry.id != id);
            }
        });

        let replayed = {
            let mut state = self.inner.state.lock();
            state.observers.push(Entry {
                id,
                observer: Arc::clone(&observer),
                subscription: subscription.clone(),
            });
            state.latest.clone()
        };

        if let Some(value) = replayed {
            observer(value);
        }
        subscription
    }

    /// View this subject as a composable stream.
    pub fn as_observable(&self) -> Observable<T> {
        let subject = self.clone();
        Observable::new(move |observer| subject.subscribe_observer(observer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recorder<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn(T) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        (seen, move |value| seen_clone.lock().push(value))
    }

    #[test]
    fn plain_subject_does_not_replay() {
        let subject = Subject::new();
        subject.next(1);

        let (seen, record) = recorder();
        let _subscription = subject.subscribe(record);
        subject.next(2);

        assert_eq!(*seen.lock(), vec![2]);
        assert_eq!(subject.latest(), None);
    }

    #[test]
    fn replay_subject_delivers_latest_first() {
        let subject = Subject::replay("a");
        subject.next("b");

        let (seen, record) = recorder();
        let _subscription = subject.subscribe(record);
        subject.next("c");

        assert_eq!(*seen.lock(), vec!["b", "c"]);
    }

    #[test]
    fn unsubscribe_removes_observer() {
        let subject = Subject::new();
        let (seen, record) = recorder();
        let subscription = subject.subscribe(record);

        subject.next(1);
        subscription.unsubscribe();
        subject.next(2);

        assert_eq!(*seen.lock(), vec![1]);
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn observer_may_push_reentrantly() {
        let subject: Subject<u32> = Subject::new();
        let (seen, record) = recorder();
        let _log = subject.subscribe(record);

        let inner = subject.clone();
        let _echo = subject.subscribe(move |value| {
            if value == 1 {
                inner.next(2);
            }
        });

        subject.next(1);
        assert_eq!(*seen.lock(), vec![1, 2]);
    }

    #[test]
    fn observer_cancelled_mid_delivery_is_skipped() {
        let subject: Subject<u32> = Subject::new();
        let (seen, record) = recorder();

        let late: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let late_clone = late.clone();
        let _canceller = subject.subscribe(move |_| {
            if let Some(subscription) = late_clone.lock().as_ref() {
                subscription.unsubscribe();
            }
        });
        *late.lock() = Some(subject.subscribe(record));

        subject.next(1);
        assert!(seen.lock().is_empty());
    }
}
