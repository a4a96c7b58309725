use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque reference attached to actions by a component-lifecycle integration.
///
/// The store never inspects a context; it only forwards it onto actions
/// emitted by effects. Contexts compare by identity.
#[derive(Clone)]
pub struct Context(Arc<dyn Any + Send + Sync>);

impl Context {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrow the wrapped value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Context({:p})", Arc::as_ptr(&self.0))
    }
}

/// An immutable record describing something that happened.
///
/// On the wire the kind is named `type`, and the context is never
/// serialized, so an action can be forwarded to another execution context
/// as-is.
///
/// # Examples
///
/// ```
/// use tincan_store::Action;
/// use serde_json::json;
///
/// let action = Action::new("todos/add").with_payload(json!({ "title": "Learn Rust" }));
/// assert_eq!(action.kind(), "todos/add");
///
/// let wire = serde_json::to_string(&action).unwrap();
/// assert!(wire.contains("\"type\":\"todos/add\""));
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
    #[serde(skip)]
    context: Option<Context>,
}

impl Action {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: None,
            context: None,
        }
    }

    pub fn with_payload(mut self, payload: impl Into<Value>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    /// Deserialize the payload into `T`.
    ///
    /// Returns `None` when the action carries no payload or the payload does
    /// not have the shape of `T`.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Option<T> {
        let payload = self.payload.as_ref()?;
        serde_json::from_value(payload.clone()).ok()
    }

    /// Whether this action's kind matches `action_ref`.
    pub fn is(&self, action_ref: &ActionRef) -> bool {
        action_ref.matches(&self.kind)
    }
}

/// Reference to an action type, or the catch-all marker.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ActionRef {
    Type(String),
    Any,
}

/// Marker matching every action, used to build catch-all handlers.
pub const ANY_ACTION: ActionRef = ActionRef::Any;

impl ActionRef {
    pub fn matches(&self, kind: &str) -> bool {
        match self {
            ActionRef::Type(expected) => expected == kind,
            ActionRef::Any => true,
        }
    }
}

impl From<&str> for ActionRef {
    fn from(kind: &str) -> Self {
        ActionRef::Type(kind.to_string())
    }
}

impl From<String> for ActionRef {
    fn from(kind: String) -> Self {
        ActionRef::Type(kind)
    }
}

impl From<&String> for ActionRef {
    fn from(kind: &String) -> Self {
        ActionRef::Type(kind.clone())
    }
}

impl From<&Action> for ActionRef {
    fn from(action: &Action) -> Self {
        ActionRef::Type(action.kind.clone())
    }
}

impl From<&ActionRef> for ActionRef {
    fn from(action_ref: &ActionRef) -> Self {
        action_ref.clone()
    }
}

/// Factory for actions of one kind.
///
/// # Examples
///
/// ```
/// use tincan_store::ActionCreator;
///
/// const INCREMENT: ActionCreator = ActionCreator::new("counter/increment");
/// let action = INCREMENT.create_with(5);
/// assert_eq!(action.kind(), "counter/increment");
/// assert_eq!(action.payload_as::<i32>(), Some(5));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionCreator {
    kind: &'static str,
}

impl ActionCreator {
    pub const fn new(kind: &'static str) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn create(&self) -> Action {
        Action::new(self.kind)
    }

    pub fn create_with(&self, payload: impl Into<Value>) -> Action {
        Action::new(self.kind).with_payload(payload)
    }
}

impl From<ActionCreator> for ActionRef {
    fn from(creator: ActionCreator) -> Self {
        ActionRef::Type(creator.kind.to_string())
    }
}

impl From<&ActionCreator> for ActionRef {
    fn from(creator: &ActionCreator) -> Self {
        ActionRef::Type(creator.kind.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn context_is_not_serialized() {
        let action = Action::new("sync")
            .with_payload(json!({ "id": 7 }))
            .with_context(Context::new("page-1"));

        let wire = serde_json::to_value(&action).unwrap();
        assert_eq!(wire, json!({ "type": "sync", "payload": { "id": 7 } }));

        let received: Action = serde_json::from_value(wire).unwrap();
        assert_eq!(received.kind(), "sync");
        assert!(received.context().is_none());
    }

    #[test]
    fn payload_as_reads_typed_payload() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Todo {
            title: String,
        }

        let action = Action::new("add").with_payload(json!({ "title": "write tests" }));
        assert_eq!(
            action.payload_as::<Todo>(),
            Some(Todo {
                title: "write tests".to_string()
            })
        );
        assert_eq!(action.payload_as::<u32>(), None);
        assert_eq!(Action::new("empty").payload_as::<u32>(), None);
    }

    #[test]
    fn context_downcasts_and_compares_by_identity() {
        let ctx = Context::new(42u32);
        let same = ctx.clone();
        let other = Context::new(42u32);

        assert_eq!(ctx.downcast_ref::<u32>(), Some(&42));
        assert!(ctx.downcast_ref::<i64>().is_none());
        assert!(ctx.ptr_eq(&same));
        assert!(!ctx.ptr_eq(&other));
    }

    #[test]
    fn action_refs_match_by_kind() {
        const PING: ActionCreator = ActionCreator::new("ping");
        let ping = ActionRef::from(PING);

        assert!(PING.create().is(&ping));
        assert!(!Action::new("pong").is(&ping));
        assert!(Action::new("pong").is(&ANY_ACTION));
    }
}
