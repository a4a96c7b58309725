//! Effects: observers of the action stream that may emit follow-up actions.

mod effect;

pub use effect::{create_effect, create_effect_with, Effect, EffectConfig};
