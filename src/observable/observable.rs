use super::{Observer, Subscription};
use crate::selector::Identical;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;

type SubscribeFn<T> = dyn Fn(Observer<T>) -> Subscription + Send + Sync;

/// A cold, composable stream of values.
///
/// Nothing happens until [`subscribe`](Self::subscribe) is called; each
/// subscription runs the operator chain independently against its source.
///
/// # Examples
///
/// ```
/// use tincan_store::observable::Subject;
/// use std::sync::{Arc, Mutex};
///
/// let numbers = Subject::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let seen_clone = seen.clone();
///
/// let _subscription = numbers
///     .as_observable()
///     .filter(|n: &i32| n % 2 == 0)
///     .map(|n| n * 10)
///     .subscribe(move |n| seen_clone.lock().unwrap().push(n));
///
/// for n in 1..=4 {
///     numbers.next(n);
/// }
/// assert_eq!(*seen.lock().unwrap(), vec![20, 40]);
/// ```
pub struct Observable<T> {
    subscribe_fn: Arc<SubscribeFn<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            subscribe_fn: Arc::clone(&self.subscribe_fn),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
    pub fn new<F>(subscribe: F) -> Self
    where
        F: Fn(Observer<T>) -> Subscription + Send + Sync + 'static,
    {
        Self {
            subscribe_fn: Arc::new(subscribe),
        }
    }

    /// A stream that never emits.
    pub fn empty() -> Self {
        Self::new(|_| Subscription::empty())
    }

    /// Merge several streams into one.
    pub fn merge(streams: impl IntoIterator<Item = Observable<T>>) -> Self {
        let streams: Vec<Observable<T>> = streams.into_iter().collect();
        Self::new(move |observer| {
            let merged = Subscription::empty();
            for stream in &streams {
                merged.add_subscription(stream.subscribe_observer(Arc::clone(&observer)));
            }
            merged
        })
    }

    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.subscribe_observer(Arc::new(observer))
    }

    pub(crate) fn subscribe_observer(&self, observer: Observer<T>) -> Subscription {
        (self.subscribe_fn)(observer)
    }

    pub fn map<U, F>(&self, f: F) -> Observable<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.flat_map(move |value| Some(f(value)))
    }

    pub fn filter<F>(&self, predicate: F) -> Observable<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.flat_map(move |value| predicate(&value).then_some(value))
    }

    pub fn filter_map<U, F>(&self, f: F) -> Observable<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(T) -> Option<U> + Send + Sync + 'static,
    {
        self.flat_map(f)
    }

    /// Map every value to zero or more outputs, emitted in order.
    pub fn flat_map<U, I, F>(&self, f: F) -> Observable<U>
    where
        U: Clone + Send + Sync + 'static,
        I: IntoIterator<Item = U>,
        F: Fn(T) -> I + Send + Sync + 'static,
    {
        let source = self.clone();
        let f = Arc::new(f);
        Observable::new(move |observer: Observer<U>| {
            let f = Arc::clone(&f);
            source.subscribe(move |value| {
                for output in f(value) {
                    observer(output);
                }
            })
        })
    }

    /// Run a side effect for every value and pass it through unchanged.
    pub fn tap<F>(&self, f: F) -> Observable<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.flat_map(move |value| {
            f(&value);
            Some(value)
        })
    }

    /// Suppress values equal to the one emitted just before them.
    pub fn distinct_until_changed(&self) -> Observable<T>
    where
        T: PartialEq,
    {
        let source = self.clone();
        Observable::new(move |observer: Observer<T>| {
            let last: Mutex<Option<T>> = Mutex::new(None);
            source.subscribe(move |value| {
                {
                    let mut last = last.lock();
                    if last.as_ref() == Some(&value) {
                        return;
                    }
                    *last = Some(value.clone());
                }
                observer(value);
            })
        })
    }

    /// Suppress values [`Identical`] to the one emitted just before them.
    ///
    /// Unlike [`distinct_until_changed`](Self::distinct_until_changed), a
    /// fresh `Arc` holding an equal value counts as a change.
    pub fn distinct_until_identical(&self) -> Observable<T>
    where
        T: Identical,
    {
        let source = self.clone();
        Observable::new(move |observer: Observer<T>| {
            let last: Mutex<Option<T>> = Mutex::new(None);
            source.subscribe(move |value| {
                {
                    let mut last = last.lock();
                    if last.as_ref().is_some_and(|last| last.identical(&value)) {
                        return;
                    }
                    *last = Some(value.clone());
                }
                observer(value);
            })
        })
    }

    /// Map every value to a future and emit its output once it resolves.
    ///
    /// Futures are spawned on the tokio runtime that was current when the
    /// stream was subscribed (or, failing that, when the value arrived).
    /// Outputs that resolve after the subscription was cancelled are dropped.
    /// Completion order follows the futures, not the inputs.
    pub fn then<U, Fut, F>(&self, f: F) -> Observable<U>
    where
        U: Clone + Send + Sync + 'static,
        Fut: Future<Output = U> + Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
    {
        let source = self.clone();
        let f = Arc::new(f);
        Observable::new(move |observer: Observer<U>| {
            let handle = Handle::try_current().ok();
            let outer = Subscription::empty();
            let closed = outer.clone();
            let f = Arc::clone(&f);

            let upstream = source.subscribe(move |value| {
                let Some(handle) = handle.clone().or_else(|| Handle::try_current().ok()) else {
                    tracing::error!("async stream step has no tokio runtime; value dropped");
                    return;
                };
                let pending = f(value);
                let observer = Arc::clone(&observer);
                let closed = closed.clone();
                handle.spawn(async move {
                    let output = pending.await;
                    if !closed.is_closed() {
                        observer(output);
                    }
                });
            });

            outer.add_subscription(upstream);
            outer
        })
    }
}
