//! Complete counter application demonstrating reducers, selectors and select streams

use std::sync::Arc;
use tincan_store::{
    create_feature_selector, create_reducer, create_selector, on, on_any, Action, ActionCreator,
    StoreConfig, State, Store,
};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug)]
struct CounterState {
    count: i32,
    step: i32,
}

#[derive(Clone, Debug)]
struct History {
    actions: Vec<String>,
}

const INCREMENT: ActionCreator = ActionCreator::new("counter/increment");
const DECREMENT: ActionCreator = ActionCreator::new("counter/decrement");
const RESET: ActionCreator = ActionCreator::new("counter/reset");
const SET_STEP: ActionCreator = ActionCreator::new("counter/set_step");

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Complete Counter Application ===\n");

    println!("1. Initializing store");
    let store = Store::with_config(StoreConfig {
        initial_state: State::new().with_slice(
            "history",
            History {
                actions: vec!["app/boot".to_string()],
            },
        ),
        log_actions: true,
    });

    let counter = create_reducer(
        "counter",
        CounterState { count: 0, step: 1 },
        [
            on([INCREMENT], |state: &Arc<CounterState>, _| {
                Arc::new(CounterState {
                    count: state.count + state.step,
                    ..CounterState::clone(state)
                })
            })?,
            on([DECREMENT], |state: &Arc<CounterState>, _| {
                Arc::new(CounterState {
                    count: state.count - state.step,
                    ..CounterState::clone(state)
                })
            })?,
            on([RESET], |state: &Arc<CounterState>, _| {
                Arc::new(CounterState {
                    count: 0,
                    ..CounterState::clone(state)
                })
            })?,
            on([SET_STEP], |state: &Arc<CounterState>, action| {
                let step = action.payload_as::<i32>().unwrap_or(state.step);
                Arc::new(CounterState {
                    step,
                    ..CounterState::clone(state)
                })
            })?,
        ],
    )?;

    // Seeded by the initial state, so its own initial value is never used.
    let history = create_reducer(
        "history",
        History {
            actions: Vec::new(),
        },
        [on_any(|state: &Arc<History>, action: &Action| {
            let mut actions = state.actions.clone();
            actions.push(action.kind().to_string());
            Arc::new(History { actions })
        })],
    )?;

    store.register_reducers([counter, history])?;

    println!("\n2. Setting up memoized selectors");
    let select_counter = create_feature_selector::<CounterState>("counter");
    let select_summary = create_selector((select_counter.clone(),), |(counter,)| {
        let count = counter.as_ref().map_or(0, |c| c.count);
        format!(
            "Count: {} | Positive: {} | Even: {} | Abs: {}",
            count,
            count > 0,
            count % 2 == 0,
            count.abs()
        )
    });

    let _summary = store
        .select(select_summary.as_fn())
        .subscribe(|summary| println!("   [State] {summary}"));

    let _step = store
        .select(move |state| select_counter(state).map_or(1, |c| c.step))
        .subscribe(|step| println!("   [Step] {step}"));

    println!("\n3. Incrementing...");
    for _ in 0..3 {
        store.dispatch(INCREMENT.create())?;
    }

    println!("\n4. Changing step size to 5");
    store.dispatch(SET_STEP.create_with(5))?;

    println!("\n5. Incrementing with new step...");
    store.dispatch(INCREMENT.create())?;

    println!("\n6. Decrementing...");
    store.dispatch(DECREMENT.create())?;
    store.dispatch(DECREMENT.create())?;

    println!("\n7. Resetting...");
    store.dispatch(RESET.create())?;

    println!("\n8. History:");
    if let Some(history) = store.snapshot().get::<History>("history") {
        for kind in &history.actions {
            println!("   - {kind}");
        }
    }
    println!("   Summary recomputed {} times", select_summary.recomputations());

    println!("\n✓ Example complete!");
    Ok(())
}
