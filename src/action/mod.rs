//! Actions: immutable records describing what happened.

mod action;

pub use action::{Action, ActionCreator, ActionRef, Context, ANY_ACTION};
