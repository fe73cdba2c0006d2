//! Synchronous event fan-out around the invocation pipeline.
//!
//! Events let external collaborators observe and mutate an invocation at
//! fixed points without the invoker knowing about them: reacting to table
//! creation, rewriting argv before parsing, or transforming/filtering the
//! result before it is returned.
//!
//! Dispatch is strictly synchronous: handlers for an event run in
//! registration order, each to completion, before control returns to the
//! invoker. There is no parallelism and no suspension.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

/// The fixed points in the invocation pipeline where handlers can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventId {
    /// Before the command table is created.
    CommandTableCreate,
    /// After the command table is created and the command resolved.
    PostCommandTableCreate,
    /// After the parser has loaded the command table.
    CommandTableLoaded,
    /// Immediately before argument parsing.
    PreParseArgs,
    /// Immediately after argument parsing.
    PostParseArgs,
    /// After the handler ran; the result may be rewritten in place.
    TransformResult,
    /// After transformation; the result may be filtered in place.
    FilterResult,
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventId::CommandTableCreate => "command-table-create",
            EventId::PostCommandTableCreate => "post-command-table-create",
            EventId::CommandTableLoaded => "command-table-loaded",
            EventId::PreParseArgs => "pre-parse-args",
            EventId::PostParseArgs => "post-parse-args",
            EventId::TransformResult => "transform-result",
            EventId::FilterResult => "filter-result",
        };
        f.write_str(name)
    }
}

/// An event handler failed; aborts the invocation.
#[derive(Debug, Error)]
#[error("event handler error ({event}): {message}")]
pub struct EventError {
    /// The event whose handler failed.
    pub event: EventId,
    /// Human-readable failure description.
    pub message: String,
}

impl EventError {
    /// Creates a new event error.
    pub fn new(event: EventId, message: impl Into<String>) -> Self {
        Self {
            event,
            message: message.into(),
        }
    }
}

/// What an event carries, by pipeline position.
#[derive(Debug, Clone, Default)]
pub enum EventPayload {
    /// Nothing to inspect.
    #[default]
    None,
    /// The raw argv (table/parse events).
    Args(Vec<String>),
    /// The command result; transform/filter handlers mutate it in place
    /// and may flag that a query collaborator was active.
    Result {
        /// The result data.
        value: Value,
        /// Set by a query collaborator when it rewrote the result.
        query_active: bool,
    },
}

impl EventPayload {
    /// The argv, when this is an args payload.
    pub fn args(&self) -> Option<&[String]> {
        match self {
            EventPayload::Args(args) => Some(args),
            _ => None,
        }
    }

    /// The result data, when this is a result payload.
    pub fn result(&self) -> Option<&Value> {
        match self {
            EventPayload::Result { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Mutable access to the result data.
    pub fn result_mut(&mut self) -> Option<&mut Value> {
        match self {
            EventPayload::Result { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Flags that a query collaborator rewrote the result.
    pub fn set_query_active(&mut self, active: bool) {
        if let EventPayload::Result { query_active, .. } = self {
            *query_active = active;
        }
    }

    pub(crate) fn into_result(self) -> (Value, bool) {
        match self {
            EventPayload::Result {
                value,
                query_active,
            } => (value, query_active),
            _ => (Value::Null, false),
        }
    }
}

/// One registered event callback.
pub type EventHandler = Rc<dyn Fn(&mut EventPayload) -> Result<(), EventError>>;

/// The per-session event registry and dispatcher.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<EventId, Vec<EventHandler>>,
}

impl EventDispatcher {
    /// A dispatcher with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for an event; handlers run in registration order.
    pub fn register(
        &mut self,
        event: EventId,
        handler: impl Fn(&mut EventPayload) -> Result<(), EventError> + 'static,
    ) {
        self.handlers.entry(event).or_default().push(Rc::new(handler));
    }

    /// Runs every handler for `event`, in order, aborting on the first error.
    pub fn emit(&self, event: EventId, payload: &mut EventPayload) -> Result<(), EventError> {
        if let Some(handlers) = self.handlers.get(&event) {
            for handler in handlers {
                handler(payload)?;
            }
        }
        Ok(())
    }

    /// The number of handlers registered for `event`.
    pub fn handler_count(&self, event: EventId) -> usize {
        self.handlers.get(&event).map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("events", &self.handlers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_emit_without_handlers_is_noop() {
        let dispatcher = EventDispatcher::new();
        let mut payload = EventPayload::None;
        assert!(dispatcher.emit(EventId::PreParseArgs, &mut payload).is_ok());
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();

        let first = order.clone();
        dispatcher.register(EventId::TransformResult, move |_| {
            first.borrow_mut().push(1);
            Ok(())
        });
        let second = order.clone();
        dispatcher.register(EventId::TransformResult, move |_| {
            second.borrow_mut().push(2);
            Ok(())
        });

        let mut payload = EventPayload::None;
        dispatcher
            .emit(EventId::TransformResult, &mut payload)
            .unwrap();
        assert_eq!(*order.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_transform_handler_rewrites_result() {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(EventId::TransformResult, |payload| {
            if let Some(value) = payload.result_mut() {
                *value = serde_json::json!({"projected": true});
            }
            payload.set_query_active(true);
            Ok(())
        });

        let mut payload = EventPayload::Result {
            value: serde_json::json!({"raw": 1}),
            query_active: false,
        };
        dispatcher
            .emit(EventId::TransformResult, &mut payload)
            .unwrap();

        let (value, query_active) = payload.into_result();
        assert_eq!(value, serde_json::json!({"projected": true}));
        assert!(query_active);
    }

    #[test]
    fn test_error_aborts_remaining_handlers() {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(EventId::PreParseArgs, |_| {
            Err(EventError::new(EventId::PreParseArgs, "first fails"))
        });
        dispatcher.register(EventId::PreParseArgs, |_| {
            panic!("should not run");
        });

        let mut payload = EventPayload::Args(vec!["item".into()]);
        let err = dispatcher
            .emit(EventId::PreParseArgs, &mut payload)
            .unwrap_err();
        assert_eq!(err.event, EventId::PreParseArgs);
        assert!(err.to_string().contains("pre-parse-args"));
    }

    #[test]
    fn test_payload_accessors() {
        let mut args = EventPayload::Args(vec!["a".into()]);
        assert_eq!(args.args().unwrap(), ["a".to_string()]);
        assert!(args.result_mut().is_none());

        let none = EventPayload::None;
        assert!(none.args().is_none());
        assert_eq!(none.into_result(), (Value::Null, false));
    }
}
