//! # Tincan Store
//!
//! An action-driven state container for Rust.
//!
//! State lives in a single [`Store`] and only changes by dispatching
//! [`Action`]s through pure reducers. Reads go through selectors, and side
//! effects observe the action stream.
//!
//! ## Writing state
//!
//! - [`Action`] - Immutable record of something that happened
//! - [`create_reducer`] / [`on`] - Pure transitions, one per state slice
//! - [`Store::dispatch`] - Fold an action into the next state
//!
//! ## Reading state
//!
//! - [`create_feature_selector`] - Look up one slice
//! - [`create_selector`] - Derived values, memoized on their inputs
//! - [`Store::select`] - Stream of a selection, emitted when it changes
//!
//! ## Side effects
//!
//! - [`create_effect`] - Turn actions into follow-up actions
//! - [`Store::register_effects`] - Wire effects into the feedback loop
//! - [`Store::set_context`] - Tag effect output with an owner reference
//!
//! Unchanged slices keep their allocation across updates, so selectors can
//! detect change with a pointer comparison.

pub mod action;
pub mod effect;
pub mod error;
pub mod observable;
pub mod reducer;
pub mod selector;
pub mod store;

// Re-export main types for convenience
pub use action::{Action, ActionCreator, ActionRef, Context, ANY_ACTION};
pub use effect::{create_effect, create_effect_with, Effect, EffectConfig};
pub use error::{BoxError, ConfigError, StoreError, TransitionError, TransitionFailure};
pub use observable::{Observable, Subscription, SubscriptionGuard};
pub use reducer::{create_reducer, on, on_any, try_on, HandlerBinding, ReducerDescriptor};
pub use selector::{
    create_feature_selector, create_feature_selector_with, create_selector, Identical,
    MemoizedSelector,
};
pub use store::{Slice, State, Store, StoreConfig};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn it_works() {
        // Basic smoke test
        let store = Store::default();
        store
            .register_reducers([create_reducer(
                "count",
                0i32,
                [on(["add"], |n: &Arc<i32>, _| Arc::new(**n + 1)).unwrap()],
            )
            .unwrap()])
            .unwrap();
        assert_eq!(store.snapshot().get::<i32>("count").as_deref(), Some(&0));
        store.dispatch(Action::new("add")).unwrap();
        assert_eq!(store.snapshot().get::<i32>("count").as_deref(), Some(&1));
    }
}
