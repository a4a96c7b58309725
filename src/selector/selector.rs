use crate::store::{Slice, SliceValue, State};
use std::sync::Arc;

/// Cheap "is this the same value" test used by memoized selectors.
///
/// Shared values (`Arc`, [`State`], [`Slice`]) compare by pointer, so a
/// structurally equal but freshly built value counts as different. Plain
/// scalars compare by value.
pub trait Identical {
    fn identical(&self, other: &Self) -> bool;
}

impl<T: ?Sized> Identical for Arc<T> {
    fn identical(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(self), Arc::as_ptr(other))
    }
}

impl Identical for State {
    fn identical(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Identical for Slice {
    fn identical(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T: Identical> Identical for Option<T> {
    fn identical(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.identical(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<'a> Identical for &'a str {
    fn identical(&self, other: &Self) -> bool {
        self == other
    }
}

macro_rules! impl_identical_by_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl Identical for $t {
                fn identical(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

impl_identical_by_value!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
    String,
);

macro_rules! impl_identical_for_tuple {
    ($($name:ident $idx:tt),+) => {
        impl<$($name: Identical),+> Identical for ($($name,)+) {
            fn identical(&self, other: &Self) -> bool {
                $(self.$idx.identical(&other.$idx))&&+
            }
        }
    };
}

impl_identical_for_tuple!(A 0);
impl_identical_for_tuple!(A 0, B 1);
impl_identical_for_tuple!(A 0, B 1, C 2);
impl_identical_for_tuple!(A 0, B 1, C 2, D 3);
impl_identical_for_tuple!(A 0, B 1, C 2, D 3, E 4);
impl_identical_for_tuple!(A 0, B 1, C 2, D 3, E 4, F 5);

/// Read one slice of state by key.
///
/// This is a plain, unmemoized lookup: `None` if the slice is missing or
/// holds another type.
///
/// # Examples
///
/// ```
/// use tincan_store::{create_feature_selector, State};
///
/// let select_name = create_feature_selector::<String>("name");
/// let state = State::new().with_slice("name", "tincan".to_string());
/// assert_eq!(select_name(&state).as_deref().map(String::as_str), Some("tincan"));
/// ```
pub fn create_feature_selector<T>(
    key: impl Into<String>,
) -> impl Fn(&State) -> Option<Arc<T>> + Clone + Send + Sync + 'static
where
    T: SliceValue,
{
    let key = key.into();
    move |state: &State| state.get::<T>(&key)
}

/// Read one slice of state by key and project it.
pub fn create_feature_selector_with<T, R, P>(
    key: impl Into<String>,
    projection: P,
) -> impl Fn(&State) -> Option<R> + Clone + Send + Sync + 'static
where
    T: SliceValue,
    P: Fn(&Arc<T>) -> R + Send + Sync + 'static,
{
    let key = key.into();
    let projection = Arc::new(projection);
    move |state: &State| state.get::<T>(&key).map(|slice| projection(&slice))
}
