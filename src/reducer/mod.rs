//! Reducers: pure slice transitions composed from handler bindings.

mod reducer;

pub use reducer::{
    create_reducer, on, on_any, try_on, HandlerBinding, Matcher, ReducerDescriptor,
};
