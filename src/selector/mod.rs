//! Selectors: pure reads over the whole state.
//!
//! Feature selectors look up a single slice. Composed selectors combine
//! several inputs and memoize the projection against the latest inputs.

mod memo;
mod selector;

pub use memo::{create_selector, MemoizedSelector, SelectorInputs};
pub use selector::{create_feature_selector, create_feature_selector_with, Identical};
