//! Error types for store configuration and action processing.

use thiserror::Error;

/// Boxed error returned by fallible reducer handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Malformed reducer or effect registration.
///
/// Raised synchronously while the store is being set up and fatal to the
/// registration call that produced it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("handler binding needs at least one action type")]
    EmptyBinding,

    #[error("catch-all marker cannot be combined with action types {types:?}")]
    MixedCatchAll { types: Vec<String> },

    #[error("reducer '{key}' has more than one catch-all handler")]
    DuplicateCatchAll { key: String },

    #[error("reducer key must not be empty")]
    EmptySliceKey,

    #[error("slice '{key}' already has a registered reducer")]
    DuplicateSliceKey { key: String },
}

/// Why a single slice transition failed.
#[derive(Error, Debug)]
pub enum TransitionFailure {
    #[error("stored slice is not of type {expected}")]
    SliceType { expected: &'static str },

    #[error("{0}")]
    Handler(#[source] BoxError),
}

/// A reducer failed while folding an action into its slice.
#[derive(Error, Debug)]
#[error("reducer '{key}' failed on action '{action_type}': {source}")]
pub struct TransitionError {
    pub key: String,
    pub action_type: String,
    #[source]
    pub source: TransitionFailure,
}

/// Errors surfaced to the caller of [`Store::dispatch`](crate::Store::dispatch).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_error_names_slice_and_action() {
        let err = TransitionError {
            key: "counter".to_string(),
            action_type: "INC".to_string(),
            source: TransitionFailure::SliceType { expected: "u32" },
        };

        let message = err.to_string();
        assert!(message.contains("'counter'"));
        assert!(message.contains("'INC'"));
        assert!(message.contains("u32"));
    }

    #[test]
    fn store_error_wraps_transition_error() {
        let err: StoreError = TransitionError {
            key: "todos".to_string(),
            action_type: "ADD".to_string(),
            source: TransitionFailure::Handler("boom".into()),
        }
        .into();

        assert!(matches!(err, StoreError::Transition(_)));
        assert!(err.to_string().contains("boom"));
    }
}
