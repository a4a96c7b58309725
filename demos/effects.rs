//! Demonstration of effects: follow-up actions, async work and context

use std::sync::Arc;
use std::time::Duration;
use tincan_store::{
    create_effect, create_effect_with, create_reducer, on, Action, ActionCreator, Context,
    EffectConfig, Store,
};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Default)]
struct Profile {
    loading: bool,
    name: Option<String>,
}

const LOAD: ActionCreator = ActionCreator::new("profile/load");
const LOADED: ActionCreator = ActionCreator::new("profile/loaded");

#[derive(Debug)]
struct Owner(&'static str);

async fn fetch_name(id: u64) -> String {
    tokio::time::sleep(Duration::from_millis(50)).await;
    format!("user-{id}")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Effects Example ===\n");

    println!("1. Registering the profile reducer");
    let store = Store::default();
    store.register_reducers([create_reducer(
        "profile",
        Profile::default(),
        [
            on([LOAD], |_: &Arc<Profile>, _| {
                Arc::new(Profile {
                    loading: true,
                    name: None,
                })
            })?,
            on([LOADED], |_: &Arc<Profile>, action| {
                Arc::new(Profile {
                    loading: false,
                    name: action.payload_as::<String>(),
                })
            })?,
        ],
    )?])?;

    let _profile = store
        .select(|state| {
            state
                .get::<Profile>("profile")
                .map(|p| (p.loading, p.name.clone()))
        })
        .subscribe(|profile| println!("   [State] {profile:?}"));

    println!("\n2. Registering effects");
    store.set_context(Context::new(Owner("effects-demo")));

    // Loads the profile asynchronously and reports the result.
    let load_profile = create_effect(|actions| {
        actions
            .of_type([LOAD])
            .then(|action: Action| async move {
                let id = action.payload_as::<u64>().unwrap_or_default();
                LOADED.create_with(fetch_name(id).await)
            })
    })
    .named("load_profile");

    // Logging only; its output never reaches the store.
    let audit = create_effect_with(
        |actions| {
            actions.tap(|action: &Action| {
                let owner = action
                    .context()
                    .and_then(|c| c.downcast_ref::<Owner>())
                    .map_or("-", |o| o.0);
                println!("   [Audit] {} (owner: {owner})", action.kind());
            })
        },
        EffectConfig { dispatch: false },
    )
    .named("audit");

    let subscriptions = store.register_effects([load_profile, audit]);

    println!("\n3. Dispatching a load request");
    store.dispatch(LOAD.create_with(42))?;
    tokio::time::sleep(Duration::from_millis(200)).await;

    println!("\n4. Cancelling the loader; the next request never completes");
    subscriptions[0].unsubscribe();
    store.dispatch(LOAD.create_with(7))?;
    tokio::time::sleep(Duration::from_millis(200)).await;

    println!("\n5. Final state: {:?}", store.snapshot().get::<Profile>("profile"));

    println!("\n✓ Example complete!");
    Ok(())
}
