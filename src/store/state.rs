use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Value that can live in a state slice.
///
/// Implemented for every `Clone + Debug + Send + Sync + 'static` type.
pub trait SliceValue: Any + Send + Sync + fmt::Debug {
    fn clone_slice(&self) -> Arc<dyn SliceValue>;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<T> SliceValue for T
where
    T: Clone + fmt::Debug + Send + Sync + 'static,
{
    fn clone_slice(&self) -> Arc<dyn SliceValue> {
        Arc::new(self.clone())
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// Reference-counted, type-erased slice of state.
///
/// `Arc<dyn SliceValue>` is itself a `SliceValue`, so calls go through
/// `*self.0` to reach the stored value rather than the pointer.
///
/// Two slices are the same slice only if they share an allocation; this is
/// what reducers use to signal "unchanged".
#[derive(Clone)]
pub struct Slice(Arc<dyn SliceValue>);

impl Slice {
    pub fn new<T: SliceValue>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn from_arc<T: SliceValue>(value: Arc<T>) -> Self {
        Self(value)
    }

    /// The slice as an `Arc<T>` sharing the same allocation.
    pub fn downcast<T: SliceValue>(&self) -> Option<Arc<T>> {
        <dyn SliceValue>::into_any(Arc::clone(&self.0))
            .downcast::<T>()
            .ok()
    }

    pub fn is<T: SliceValue>(&self) -> bool {
        (*self.0).as_any().is::<T>()
    }

    pub fn ptr_eq(&self, other: &Slice) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }

    /// Structural copy that shares nothing with `self`.
    pub fn deep_clone(&self) -> Slice {
        Slice((*self.0).clone_slice())
    }

    pub fn type_name(&self) -> &'static str {
        (*self.0).type_name()
    }
}

impl fmt::Debug for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// The whole-state container: slice key to slice value.
///
/// A `State` is never mutated once built. Updates produce a new container
/// that shares every unchanged slice with the previous one, so identity
/// checks on the container or on a slice are enough to detect change.
///
/// # Examples
///
/// ```
/// use tincan_store::State;
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Counter {
///     value: i32,
/// }
///
/// let state = State::new().with_slice("counter", Counter { value: 3 });
/// assert_eq!(state.get::<Counter>("counter").map(|c| c.value), Some(3));
/// assert!(state.get::<String>("counter").is_none());
/// ```
#[derive(Clone, Default)]
pub struct State {
    slices: Arc<BTreeMap<String, Slice>>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion, for assembling an initial state.
    pub fn with_slice<T: SliceValue>(self, key: impl Into<String>, value: T) -> Self {
        self.with(key.into(), Slice::new(value))
    }

    pub(crate) fn with(self, key: String, slice: Slice) -> Self {
        let mut slices = Arc::unwrap_or_clone(self.slices);
        slices.insert(key, slice);
        Self {
            slices: Arc::new(slices),
        }
    }

    /// Shallow copy with `changes` applied; unchanged slices are shared.
    pub(crate) fn replace(&self, changes: Vec<(String, Slice)>) -> Self {
        let mut slices = (*self.slices).clone();
        slices.extend(changes);
        Self {
            slices: Arc::new(slices),
        }
    }

    pub fn get<T: SliceValue>(&self, key: &str) -> Option<Arc<T>> {
        self.slices.get(key)?.downcast::<T>()
    }

    pub fn slice(&self, key: &str) -> Option<&Slice> {
        self.slices.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.slices.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slices.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Whether both handles point at the same container.
    pub fn ptr_eq(&self, other: &State) -> bool {
        Arc::ptr_eq(&self.slices, &other.slices)
    }

    /// Copy of the whole tree sharing no slice with `self`.
    pub fn deep_clone(&self) -> State {
        let slices = self
            .slices
            .iter()
            .map(|(key, slice)| (key.clone(), slice.deep_clone()))
            .collect();
        Self {
            slices: Arc::new(slices),
        }
    }
}

/// Containers compare by identity, which is what `select` relies on.
impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.slices.iter()).finish()
    }
}
