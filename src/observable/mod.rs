//! Push-based streams.
//!
//! This module provides the plumbing shared by the state and action streams:
//! - Subjects: observer lists with an optional replay slot
//! - Observables: cold streams composed with operators
//! - Subscriptions: cancellation handles

mod observable;
mod subject;
mod subscription;

use std::sync::Arc;

pub use observable::Observable;
pub use subject::Subject;
pub use subscription::{Subscription, SubscriptionGuard};

/// Callback receiving stream values.
pub type Observer<T> = Arc<dyn Fn(T) + Send + Sync>;
