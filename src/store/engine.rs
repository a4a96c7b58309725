use super::State;
use crate::action::Action;
use crate::error::TransitionError;
use crate::reducer::ReducerDescriptor;

/// Fold `action` into `previous` through every reducer, in registration order.
///
/// Slices whose reducer hands back the same allocation are shared with
/// `previous`. If no slice changed, `previous` itself is returned, so the
/// container identity doubles as a change flag. The first failing reducer
/// aborts the fold.
pub(crate) fn fold(
    reducers: &[ReducerDescriptor],
    previous: &State,
    action: &Action,
) -> Result<State, TransitionError> {
    let mut changes = Vec::new();

    for reducer in reducers {
        let slice = previous.slice(reducer.key());
        let next = reducer.transition(slice, action)?;
        if !slice.is_some_and(|slice| slice.ptr_eq(&next)) {
            changes.push((reducer.key().to_string(), next));
        }
    }

    if changes.is_empty() {
        return Ok(previous.clone());
    }
    Ok(previous.replace(changes))
}
