//! The store and the state it holds.
//!
//! A store folds dispatched actions through its reducers into an immutable
//! [`State`], publishes every changed state to selectors, and runs effects
//! over the action stream.

mod engine;
mod state;
mod store;

pub use state::{Slice, SliceValue, State};
pub use store::{Store, StoreConfig};
