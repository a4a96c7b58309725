use crate::action::{Action, ActionRef};
use crate::observable::Observable;
use std::fmt;
use std::sync::Arc;

type EffectFn = Arc<dyn Fn(Observable<Action>) -> Observable<Action> + Send + Sync>;

/// Registration-time settings of an [`Effect`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EffectConfig {
    /// Feed emitted actions back into the store. When `false` the effect's
    /// output is subscribed for its side effects only and then discarded.
    pub dispatch: bool,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self { dispatch: true }
    }
}

/// A transform from the store's action stream to follow-up actions.
///
/// Effects are inert until passed to
/// [`Store::register_effects`](crate::Store::register_effects), which
/// subscribes them for the lifetime of the store.
///
/// # Examples
///
/// ```
/// use tincan_store::{create_effect, Action};
///
/// let ping_pong = create_effect(|actions| {
///     actions.of_type(["ping"]).map(|_| Action::new("pong"))
/// });
/// assert!(ping_pong.config().dispatch);
/// ```
#[derive(Clone)]
pub struct Effect {
    name: Option<String>,
    run: EffectFn,
    config: EffectConfig,
}

impl Effect {
    pub fn new<F>(effect: F) -> Self
    where
        F: Fn(Observable<Action>) -> Observable<Action> + Send + Sync + 'static,
    {
        Self::with_config(effect, EffectConfig::default())
    }

    pub fn with_config<F>(effect: F, config: EffectConfig) -> Self
    where
        F: Fn(Observable<Action>) -> Observable<Action> + Send + Sync + 'static,
    {
        Self {
            name: None,
            run: Arc::new(effect),
            config,
        }
    }

    /// Attach a name used in log output.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn config(&self) -> EffectConfig {
        self.config
    }

    /// Build this effect's output stream from `actions`.
    pub fn apply(&self, actions: Observable<Action>) -> Observable<Action> {
        (self.run)(actions)
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Create an effect whose output is dispatched back into the store.
pub fn create_effect<F>(effect: F) -> Effect
where
    F: Fn(Observable<Action>) -> Observable<Action> + Send + Sync + 'static,
{
    Effect::new(effect)
}

/// Create an effect with explicit configuration.
///
/// # Examples
///
/// ```
/// use tincan_store::{create_effect_with, EffectConfig};
///
/// let logger = create_effect_with(
///     |actions| actions.tap(|action| println!("saw {}", action.kind())),
///     EffectConfig { dispatch: false },
/// );
/// assert!(!logger.config().dispatch);
/// ```
pub fn create_effect_with<F>(effect: F, config: EffectConfig) -> Effect
where
    F: Fn(Observable<Action>) -> Observable<Action> + Send + Sync + 'static,
{
    Effect::with_config(effect, config)
}

impl Observable<Action> {
    /// Keep only actions whose type matches one of `refs`.
    pub fn of_type<I, R>(&self, refs: I) -> Observable<Action>
    where
        I: IntoIterator<Item = R>,
        R: Into<ActionRef>,
    {
        let refs: Vec<ActionRef> = refs.into_iter().map(Into::into).collect();
        self.filter(move |action| refs.iter().any(|action_ref| action.is(action_ref)))
    }
}
