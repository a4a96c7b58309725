use super::Identical;
use crate::store::State;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A tuple of input selectors evaluated together.
///
/// Implemented for tuples of one to six `Fn(&State) -> A` selectors, where
/// each `A` is [`Identical`]. `V` is the tuple of their outputs.
pub trait SelectorInputs<V>: Send + Sync + 'static {
    fn select_all(&self, state: &State) -> V;
}

macro_rules! impl_selector_inputs {
    ($($sel:ident $out:ident $idx:tt),+) => {
        impl<$($sel, $out),+> SelectorInputs<($($out,)+)> for ($($sel,)+)
        where
            $(
                $sel: Fn(&State) -> $out + Send + Sync + 'static,
                $out: Identical,
            )+
        {
            fn select_all(&self, state: &State) -> ($($out,)+) {
                ($((self.$idx)(state),)+)
            }
        }
    };
}

impl_selector_inputs!(F0 A0 0);
impl_selector_inputs!(F0 A0 0, F1 A1 1);
impl_selector_inputs!(F0 A0 0, F1 A1 1, F2 A2 2);
impl_selector_inputs!(F0 A0 0, F1 A1 1, F2 A2 2, F3 A3 3);
impl_selector_inputs!(F0 A0 0, F1 A1 1, F2 A2 2, F3 A3 3, F4 A4 4);
impl_selector_inputs!(F0 A0 0, F1 A1 1, F2 A2 2, F3 A3 3, F4 A4 4, F5 A5 5);

struct MemoInner<V, R> {
    inputs: Box<dyn Fn(&State) -> V + Send + Sync>,
    project: Box<dyn Fn(&V) -> R + Send + Sync>,
    last: Mutex<Option<(V, R)>>,
    recomputations: AtomicUsize,
}

/// A selector that caches its result against its most recent inputs.
///
/// Only the single latest input tuple is remembered. Alternating between
/// two different input sets recomputes on every call.
pub struct MemoizedSelector<V, R> {
    inner: Arc<MemoInner<V, R>>,
}

impl<V, R> Clone for MemoizedSelector<V, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V, R> MemoizedSelector<V, R>
where
    V: Identical + Send + 'static,
    R: Clone + Send + 'static,
{
    /// Evaluate against `state`, reusing the cached result when every input
    /// is identical to the previous call's.
    pub fn select(&self, state: &State) -> R {
        let values = (self.inner.inputs)(state);

        if let Some((last_values, last_result)) = self.inner.last.lock().as_ref() {
            if last_values.identical(&values) {
                return last_result.clone();
            }
        }

        // Projection runs unlocked so nested selectors cannot deadlock.
        let result = (self.inner.project)(&values);
        self.inner.recomputations.fetch_add(1, Ordering::Relaxed);
        *self.inner.last.lock() = Some((values, result.clone()));
        result
    }

    /// A plain selector function backed by this memo, for use as an input
    /// to other selectors or with [`Store::select`](crate::Store::select).
    pub fn as_fn(&self) -> impl Fn(&State) -> R + Clone + Send + Sync + 'static {
        let selector = self.clone();
        move |state: &State| selector.select(state)
    }

    /// How many times the projection has run.
    pub fn recomputations(&self) -> usize {
        self.inner.recomputations.load(Ordering::Relaxed)
    }

    /// Forget the cached inputs and result.
    pub fn release(&self) {
        self.inner.last.lock().take();
    }
}

/// Compose input selectors with a projection, memoized on the inputs.
///
/// `inputs` is a tuple of selectors; `project` receives a reference to the
/// tuple of their outputs and only runs when at least one output differs
/// from the previous call.
///
/// # Examples
///
/// ```
/// use tincan_store::{create_feature_selector, create_selector, State};
///
/// #[derive(Clone, Debug)]
/// struct Todos(Vec<&'static str>);
///
/// let select_count = create_selector(
///     (create_feature_selector::<Todos>("todos"),),
///     |(todos,)| todos.as_ref().map_or(0, |t| t.0.len()),
/// );
///
/// let state = State::new().with_slice("todos", Todos(vec!["a", "b"]));
/// assert_eq!(select_count.select(&state), 2);
/// assert_eq!(select_count.select(&state), 2);
/// assert_eq!(select_count.recomputations(), 1);
/// ```
pub fn create_selector<I, V, R, P>(inputs: I, project: P) -> MemoizedSelector<V, R>
where
    I: SelectorInputs<V>,
    V: Identical + Send + 'static,
    R: Clone + Send + 'static,
    P: Fn(&V) -> R + Send + Sync + 'static,
{
    MemoizedSelector {
        inner: Arc::new(MemoInner {
            inputs: Box::new(move |state: &State| inputs.select_all(state)),
            project: Box::new(project),
            last: Mutex::new(None),
            recomputations: AtomicUsize::new(0),
        }),
    }
}
