use super::engine;
use super::{Slice, State};
use crate::action::{Action, Context};
use crate::effect::Effect;
use crate::error::{ConfigError, StoreError};
use crate::observable::{Observable, Subject, Subscription};
use crate::reducer::ReducerDescriptor;
use crate::selector::Identical;
use parking_lot::{ReentrantMutex, RwLock};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, error, trace, warn};

/// Construction settings for a [`Store`].
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Starting state. The store keeps a deep copy.
    pub initial_state: State,
    /// Log every dispatch at `debug` instead of `trace`.
    pub log_actions: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            initial_state: State::new(),
            log_actions: false,
        }
    }
}

/// Per-store dispatch bookkeeping, only touched while holding the turn lock.
#[derive(Default)]
struct Turn {
    active: bool,
    queue: VecDeque<Action>,
}

/// Ends the active turn even if a reducer or observer panics.
struct TurnReset<'a>(&'a RefCell<Turn>);

impl Drop for TurnReset<'_> {
    fn drop(&mut self) {
        let mut turn = self.0.borrow_mut();
        turn.active = false;
        turn.queue.clear();
    }
}

struct StoreInner {
    // Serializes dispatches and state subscriptions across threads. The
    // owning thread re-enters it from observers and effects.
    turn: ReentrantMutex<RefCell<Turn>>,
    state: Subject<State>,
    actions: Subject<Action>,
    reducers: RwLock<Arc<Vec<ReducerDescriptor>>>,
    context: RwLock<Option<Context>>,
    log_actions: bool,
}

/// Central state container driven by dispatched actions.
///
/// The store folds every action through its registered reducers, publishes
/// the resulting state to selectors, and forwards the action to its effects,
/// whose output may be dispatched again.
///
/// A dispatch made while another one is in flight on the same thread (from
/// an effect, a `select` observer or, worse, a reducer) is not folded
/// immediately. It is queued and runs once the current action has reached
/// every observer, so the action stream always shows causes before their
/// follow-ups. Such a nested call returns `Ok(())` as soon as the action is
/// queued; if the queued action later fails, the failure is only logged.
///
/// # Examples
///
/// ```
/// use tincan_store::{create_reducer, on, Action, Store};
/// use std::sync::{Arc, Mutex};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Counter {
///     value: i32,
/// }
///
/// let store = Store::default();
/// store.register_reducers([create_reducer(
///     "counter",
///     Counter { value: 0 },
///     [on(["INC"], |state: &Arc<Counter>, _| Arc::new(Counter { value: state.value + 1 }))?],
/// )?])?;
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let seen_clone = seen.clone();
/// let _subscription = store
///     .select(|state| state.get::<Counter>("counter").map(|c| c.value))
///     .subscribe(move |value| seen_clone.lock().unwrap().push(value));
///
/// store.dispatch(Action::new("INC"))?;
/// assert_eq!(*seen.lock().unwrap(), vec![Some(0), Some(1)]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Default for Store {
    fn default() -> Self {
        Self::with_config(StoreConfig::default())
    }
}

impl Store {
    /// Create a store starting from a deep copy of `initial`.
    pub fn new(initial: &State) -> Self {
        Self::with_config(StoreConfig {
            initial_state: initial.clone(),
            ..StoreConfig::default()
        })
    }

    pub fn with_config(config: StoreConfig) -> Self {
        let state = config.initial_state.deep_clone();
        debug!(slices = state.len(), "creating store");

        Self {
            inner: Arc::new(StoreInner {
                turn: ReentrantMutex::new(RefCell::new(Turn::default())),
                state: Subject::replay(state),
                actions: Subject::new(),
                reducers: RwLock::new(Arc::new(Vec::new())),
                context: RwLock::new(None),
                log_actions: config.log_actions,
            }),
        }
    }

    /// The most recently published state.
    pub fn snapshot(&self) -> State {
        self.inner.state.latest().unwrap_or_default()
    }

    /// Append reducers and give every slice that is still missing its
    /// initial value.
    ///
    /// Slices already present are left alone. If any slice was filled in,
    /// the new state is published right away, without a dispatch.
    pub fn register_reducers<I>(&self, descriptors: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = ReducerDescriptor>,
    {
        let descriptors: Vec<ReducerDescriptor> = descriptors.into_iter().collect();
        let _turn = self.inner.turn.lock();

        let backfilled = {
            let mut reducers = self.inner.reducers.write();
            for (index, descriptor) in descriptors.iter().enumerate() {
                let key = descriptor.key();
                let taken = reducers.iter().any(|r| r.key() == key)
                    || descriptors[..index].iter().any(|d| d.key() == key);
                if taken {
                    return Err(ConfigError::DuplicateSliceKey {
                        key: key.to_string(),
                    });
                }
            }

            let current = self.snapshot();
            let missing: Vec<(String, Slice)> = descriptors
                .iter()
                .filter(|descriptor| !current.contains_key(descriptor.key()))
                .map(|descriptor| (descriptor.key().to_string(), descriptor.initial().clone()))
                .collect();

            for descriptor in &descriptors {
                debug!(slice = descriptor.key(), "registered reducer");
            }
            let mut next = Vec::clone(&reducers);
            next.extend(descriptors);
            *reducers = Arc::new(next);

            (!missing.is_empty()).then(|| current.replace(missing))
        };

        if let Some(state) = backfilled {
            self.inner.state.next(state);
        }
        Ok(())
    }

    /// Subscribe each effect to the action stream.
    ///
    /// Effects stay active until their handle is cancelled; the returned
    /// subscriptions are in the same order as `effects`.
    pub fn register_effects<I>(&self, effects: I) -> Vec<Subscription>
    where
        I: IntoIterator<Item = Effect>,
    {
        effects
            .into_iter()
            .map(|effect| self.register_effect(effect))
            .collect()
    }

    fn register_effect(&self, effect: Effect) -> Subscription {
        let name = effect.name().unwrap_or("anonymous").to_string();
        let dispatch = effect.config().dispatch;
        debug!(effect = %name, dispatch, "registering effect");

        let output = effect.apply(self.actions());
        if !dispatch {
            return output.subscribe(|_| {});
        }

        // Weak so the action stream does not keep its own store alive.
        let store: Weak<StoreInner> = Arc::downgrade(&self.inner);
        output.subscribe(move |action: Action| {
            let Some(inner) = store.upgrade() else {
                warn!(effect = %name, "store dropped; effect output discarded");
                return;
            };
            let store = Store { inner };
            let action = store.attach_context(action);
            if let Err(err) = store.dispatch(action) {
                error!(effect = %name, error = %err, "effect output could not be dispatched");
            }
        })
    }

    /// Set the context merged into effect output lacking its own.
    pub fn set_context(&self, context: Context) {
        *self.inner.context.write() = Some(context);
    }

    pub fn clear_context(&self) {
        *self.inner.context.write() = None;
    }

    pub fn context(&self) -> Option<Context> {
        self.inner.context.read().clone()
    }

    fn attach_context(&self, action: Action) -> Action {
        if action.context().is_some() {
            return action;
        }
        match self.context() {
            Some(context) => action.with_context(context),
            None => action,
        }
    }

    /// Fold `action` into the state, publish the result, then hand the
    /// action to effects.
    ///
    /// State is only published when some slice changed. If a reducer fails,
    /// nothing is published and the error is returned; the previous state
    /// stays current.
    ///
    /// Called while this thread is already dispatching, the action is queued
    /// behind the current one instead.
    pub fn dispatch(&self, action: Action) -> Result<(), StoreError> {
        if action.kind().is_empty() {
            return Err(StoreError::InvalidAction(
                "action type must not be empty".to_string(),
            ));
        }

        let turn = self.inner.turn.lock();
        let nested = turn.borrow().active;
        if nested {
            trace!(action_type = action.kind(), "queued nested dispatch");
            turn.borrow_mut().queue.push_back(action);
            return Ok(());
        }

        turn.borrow_mut().active = true;
        let _reset = TurnReset(&turn);
        let result = self.fold_and_publish(action);

        loop {
            let queued = turn.borrow_mut().queue.pop_front();
            let Some(queued) = queued else {
                break;
            };
            let action_type = queued.kind().to_string();
            if let Err(err) = self.fold_and_publish(queued) {
                error!(action_type = %action_type, error = %err, "queued dispatch failed");
            }
        }
        result
    }

    fn fold_and_publish(&self, action: Action) -> Result<(), StoreError> {
        let previous = self.snapshot();
        let reducers = Arc::clone(&*self.inner.reducers.read());

        let next = engine::fold(&reducers, &previous, &action).map_err(|err| {
            debug!(action_type = action.kind(), error = %err, "dispatch failed");
            err
        })?;

        let changed = !next.ptr_eq(&previous);
        if self.inner.log_actions {
            debug!(action_type = action.kind(), changed, "dispatch");
        } else {
            trace!(action_type = action.kind(), changed, "dispatch");
        }

        if changed {
            self.inner.state.next(next);
        }
        self.inner.actions.next(action);
        Ok(())
    }

    /// Stream of `selector` applied to the state.
    ///
    /// Emits the current selection on subscribe, then again whenever it is
    /// not [`Identical`] to the previous emission. A slice replaced by an
    /// equal value under a new `Arc` is still a change.
    pub fn select<T, F>(&self, selector: F) -> Observable<T>
    where
        T: Identical + Clone + Send + Sync + 'static,
        F: Fn(&State) -> T + Send + Sync + 'static,
    {
        self.state()
            .map(move |state: State| selector(&state))
            .distinct_until_identical()
    }

    /// Every published state, starting with the current one.
    pub fn state(&self) -> Observable<State> {
        let subject = self.inner.state.clone();
        let store: Weak<StoreInner> = Arc::downgrade(&self.inner);
        Observable::new(move |observer| {
            // Replay must not interleave with a dispatch on another thread.
            let inner = store.upgrade();
            let _turn = inner.as_ref().map(|inner| inner.turn.lock());
            subject.subscribe_observer(observer)
        })
    }

    /// The raw action stream. Only actions dispatched after subscribing are
    /// seen.
    pub fn actions(&self) -> Observable<Action> {
        self.inner.actions.as_observable()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reducers = self.inner.reducers.read();
        f.debug_struct("Store")
            .field("state", &self.snapshot())
            .field("reducers", &reducers.len())
            .finish_non_exhaustive()
    }
}
