use crate::action::{Action, ActionRef};
use crate::error::{BoxError, ConfigError, TransitionError, TransitionFailure};
use crate::store::{Slice, SliceValue};
use std::any::type_name;
use std::fmt;
use std::sync::Arc;

type Handler<S> = Arc<dyn Fn(&Arc<S>, &Action) -> Result<Arc<S>, BoxError> + Send + Sync>;
type Transition =
    Arc<dyn Fn(Option<&Slice>, &Action) -> Result<Slice, TransitionFailure> + Send + Sync>;

/// Which actions a handler binding responds to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Matcher {
    Specific(Vec<String>),
    CatchAll,
}

impl Matcher {
    pub fn matches(&self, kind: &str) -> bool {
        match self {
            Matcher::Specific(kinds) => kinds.iter().any(|k| k == kind),
            Matcher::CatchAll => true,
        }
    }
}

/// A slice transition bound to one or more action types, or to all actions.
pub struct HandlerBinding<S> {
    matcher: Matcher,
    handler: Handler<S>,
}

impl<S> HandlerBinding<S> {
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn is_catch_all(&self) -> bool {
        self.matcher == Matcher::CatchAll
    }
}

impl<S> fmt::Debug for HandlerBinding<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBinding")
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

fn matcher_for<I, R>(refs: I) -> Result<Matcher, ConfigError>
where
    I: IntoIterator<Item = R>,
    R: Into<ActionRef>,
{
    let mut kinds = Vec::new();
    let mut catch_all = false;
    for action_ref in refs {
        match action_ref.into() {
            ActionRef::Type(kind) => kinds.push(kind),
            ActionRef::Any => catch_all = true,
        }
    }

    match (catch_all, kinds.is_empty()) {
        (true, true) => Ok(Matcher::CatchAll),
        (true, false) => Err(ConfigError::MixedCatchAll { types: kinds }),
        (false, true) => Err(ConfigError::EmptyBinding),
        (false, false) => Ok(Matcher::Specific(kinds)),
    }
}

/// Bind `handler` to the given action types.
///
/// The handler receives the current slice and returns the next one.
/// Returning the same `Arc` means the slice did not change.
///
/// Passing [`ANY_ACTION`](crate::ANY_ACTION) alone builds a catch-all
/// binding; mixing it with concrete types is a [`ConfigError`].
pub fn on<S, I, R, F>(refs: I, handler: F) -> Result<HandlerBinding<S>, ConfigError>
where
    S: 'static,
    I: IntoIterator<Item = R>,
    R: Into<ActionRef>,
    F: Fn(&Arc<S>, &Action) -> Arc<S> + Send + Sync + 'static,
{
    try_on(refs, move |state: &Arc<S>, action: &Action| {
        Ok(handler(state, action))
    })
}

/// Like [`on`], for handlers that can fail.
///
/// A failure aborts the dispatch that triggered it and is reported with the
/// slice key and action type.
pub fn try_on<S, I, R, F>(refs: I, handler: F) -> Result<HandlerBinding<S>, ConfigError>
where
    S: 'static,
    I: IntoIterator<Item = R>,
    R: Into<ActionRef>,
    F: Fn(&Arc<S>, &Action) -> Result<Arc<S>, BoxError> + Send + Sync + 'static,
{
    Ok(HandlerBinding {
        matcher: matcher_for(refs)?,
        handler: Arc::new(handler),
    })
}

/// Bind `handler` to every action not claimed by a specific binding.
pub fn on_any<S, F>(handler: F) -> HandlerBinding<S>
where
    S: 'static,
    F: Fn(&Arc<S>, &Action) -> Arc<S> + Send + Sync + 'static,
{
    HandlerBinding {
        matcher: Matcher::CatchAll,
        handler: Arc::new(move |state: &Arc<S>, action: &Action| Ok(handler(state, action))),
    }
}

/// A reducer owning one top-level slice of state.
#[derive(Clone)]
pub struct ReducerDescriptor {
    key: String,
    initial: Slice,
    transition: Transition,
}

impl ReducerDescriptor {
    /// Wrap a plain transition function.
    ///
    /// An absent slice is replaced by `initial` before `reduce` runs.
    pub fn from_fn<S, F>(
        key: impl Into<String>,
        initial: S,
        reduce: F,
    ) -> Result<Self, ConfigError>
    where
        S: SliceValue,
        F: Fn(&Arc<S>, &Action) -> Result<Arc<S>, BoxError> + Send + Sync + 'static,
    {
        let key = key.into();
        if key.is_empty() {
            return Err(ConfigError::EmptySliceKey);
        }

        let initial = Arc::new(initial);
        let default_state = Arc::clone(&initial);
        let transition = move |slice: Option<&Slice>, action: &Action| {
            let current = match slice.map(Slice::downcast::<S>) {
                Some(Some(current)) => current,
                Some(None) => {
                    return Err(TransitionFailure::SliceType {
                        expected: type_name::<S>(),
                    })
                }
                None => Arc::clone(&default_state),
            };
            reduce(&current, action)
                .map(Slice::from_arc)
                .map_err(TransitionFailure::Handler)
        };

        Ok(Self {
            key,
            initial: Slice::from_arc(initial),
            transition: Arc::new(transition),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn initial(&self) -> &Slice {
        &self.initial
    }

    /// Fold `action` into `slice`.
    pub fn transition(
        &self,
        slice: Option<&Slice>,
        action: &Action,
    ) -> Result<Slice, TransitionError> {
        (self.transition)(slice, action).map_err(|source| TransitionError {
            key: self.key.clone(),
            action_type: action.kind().to_string(),
            source,
        })
    }
}

impl fmt::Debug for ReducerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReducerDescriptor")
            .field("key", &self.key)
            .field("initial", &self.initial)
            .finish_non_exhaustive()
    }
}

/// Build a reducer for slice `key` from handler bindings.
///
/// Specific bindings are tried in the order given and the first match wins.
/// If none matches, the catch-all binding runs; without one the slice is
/// returned unchanged.
///
/// # Examples
///
/// ```
/// use tincan_store::{create_reducer, on, Action};
/// use std::sync::Arc;
///
/// #[derive(Clone, Debug)]
/// struct Counter {
///     value: i32,
/// }
///
/// let reducer = create_reducer(
///     "counter",
///     Counter { value: 0 },
///     [on(["INC"], |state: &Arc<Counter>, _| {
///         Arc::new(Counter { value: state.value + 1 })
///     })?],
/// )?;
///
/// let next = reducer.transition(None, &Action::new("INC"))?;
/// assert_eq!(next.downcast::<Counter>().unwrap().value, 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn create_reducer<S, I>(
    key: impl Into<String>,
    initial: S,
    bindings: I,
) -> Result<ReducerDescriptor, ConfigError>
where
    S: SliceValue,
    I: IntoIterator<Item = HandlerBinding<S>>,
{
    let key = key.into();
    let mut specific: Vec<HandlerBinding<S>> = Vec::new();
    let mut catch_all: Option<Handler<S>> = None;

    for binding in bindings {
        if binding.is_catch_all() {
            if catch_all.is_some() {
                return Err(ConfigError::DuplicateCatchAll { key });
            }
            catch_all = Some(binding.handler);
        } else {
            specific.push(binding);
        }
    }

    ReducerDescriptor::from_fn(key, initial, move |state: &Arc<S>, action: &Action| {
        let handler = specific
            .iter()
            .find(|binding| binding.matcher.matches(action.kind()))
            .map(|binding| &binding.handler)
            .or(catch_all.as_ref());

        match handler {
            Some(handler) => handler(state, action),
            None => Ok(Arc::clone(state)),
        }
    })
}
