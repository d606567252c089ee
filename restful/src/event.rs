//! Events emitted by scopes.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::config::SerializedConfig;
use crate::error::{ListenerError, RequestError};
use crate::response::Response;
use crate::scope::Scope;

/// Name of the event emitted after every successful verb call.
pub const RESPONSE_EVENT: &str = "response";

/// Name of the event emitted after every failed verb call.
pub const ERROR_EVENT: &str = "error";

/// An event travelling up the scope tree.
///
/// Events borrow their payload; listeners that need to keep something must
/// clone it.
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    /// A verb call succeeded.
    Response {
        response: &'a Response,
        config: &'a SerializedConfig,
    },
    /// A verb call failed.
    Error {
        error: &'a RequestError,
        config: &'a SerializedConfig,
    },
    /// A transport-defined event, such as upload progress.
    Custom { name: &'a str, payload: &'a Value },
}

impl Event<'_> {
    /// Returns the name listeners are registered under.
    pub fn name(&self) -> &str {
        match self {
            Self::Response { .. } => RESPONSE_EVENT,
            Self::Error { .. } => ERROR_EVENT,
            Self::Custom { name, .. } => name,
        }
    }

    /// Returns the serialized request configuration for verb events.
    pub fn config(&self) -> Option<&SerializedConfig> {
        match self {
            Self::Response { config, .. } | Self::Error { config, .. } => Some(*config),
            Self::Custom { .. } => None,
        }
    }
}

/// A registered event callback.
///
/// Returning an error stops the event from reaching the remaining listeners
/// and every ancestor scope.
pub type Listener = Arc<dyn Fn(&Event<'_>) -> Result<(), ListenerError> + Send + Sync>;

/// Handle returned when registering a listener, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Forwards transport events to the scope that issued a request.
///
/// Backends receive one with every request so they can report progress or
/// other custom events without knowing about the scope tree.
#[derive(Clone)]
pub struct Emitter {
    scope: Scope,
}

impl Emitter {
    pub(crate) fn new(scope: Scope) -> Self {
        Self { scope }
    }

    /// Emits a custom event on the request's scope. It bubbles like any
    /// other event.
    pub fn emit(&self, name: &str, payload: &Value) -> Result<(), ListenerError> {
        self.scope.emit(&Event::Custom { name, payload })
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    #[test]
    fn test_custom_event_name() {
        let payload = json!({ "loaded": 10 });
        let event = Event::Custom {
            name: "progress",
            payload: &payload,
        };
        assert_eq!(event.name(), "progress");
        assert!(event.config().is_none());
    }

    #[test]
    fn test_listener_ids_are_unique() {
        assert_ne!(ListenerId::next(), ListenerId::next());
    }

    #[test]
    fn test_emitter_bubbles_custom_events() {
        let root = Scope::root();
        let child = root.fork("uploads", true);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        root.on("progress", move |event| {
            if let Event::Custom { payload, .. } = event {
                sink.lock().push((*payload).clone());
            }
            Ok(())
        });

        Emitter::new(child)
            .emit("progress", &json!({ "loaded": 3 }))
            .unwrap();
        assert_eq!(*seen.lock(), vec![json!({ "loaded": 3 })]);
    }
}
