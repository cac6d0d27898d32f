//! Transport-agnostic message routing.
//!
//! One inbound message moves through four states: received (decoded into an
//! envelope by its transport), routing (direct listener or route table),
//! invoking (handler called with an explicit responder), and finally either
//! responded or fired-and-forgotten. The router guarantees exactly-once
//! handler invocation per inbound message and at-most-once response
//! delivery when a response is expected.
//!
//! Routing precedence: a listener registered for the literal message name
//! always wins over the namespaced route table, never receives a response
//! channel, and makes the entry point report that no asynchronous response
//! will arrive.

mod sink;
mod table;

use std::collections::HashMap;

use relay_proto::{Envelope, MessageName};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, trace};

pub use sink::{Deferred, PreSend, Resolver, Responder};
pub use table::{RouteDescriptor, RouteTable};

use crate::transport::TabId;

/// Routing and configuration errors.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Neither a route descriptor nor a handler exists for the message.
    #[error("no route or handler for message '{name}'")]
    RouteNotFound {
        /// The unresolvable message name.
        name: String,
    },

    /// A route descriptor exists but its handler was never registered.
    #[error("message '{namespace}#{action}' is routed but has no handler")]
    HandlerNotRegistered {
        /// Namespace of the dangling route.
        namespace: String,
        /// Action of the dangling route.
        action: String,
    },

    /// The message name has no namespace separator and no direct listener.
    #[error("message name '{name}' has no namespace separator")]
    MalformedName {
        /// The unsplittable message name.
        name: String,
    },

    /// The handler itself failed.
    #[error("handler failed: {message}")]
    Handler {
        /// The handler's error, stringified.
        message: String,
        /// Whether the transport was promised a response before the
        /// failure.
        response_expected: bool,
    },
}

/// The caller-context value appended to every handler invocation: where the
/// message came from, for routing a response or follow-up messages back.
#[derive(Debug, Clone)]
pub enum Caller {
    /// The embedded-page frame on the other side of the post boundary.
    Page,
    /// A native-runtime sender descriptor (tab and frame information as the
    /// host delivered it).
    Native(Value),
    /// A legacy-runtime tab, identified by its synthesized id.
    Tab(TabId),
}

/// Everything a handler receives for one inbound message.
pub struct Invocation {
    /// The decoded argument sequence, with the caller's callback
    /// placeholder (a `null` in the route's callback slot) already removed.
    pub args: Vec<Value>,
    /// Who sent the message.
    pub caller: Caller,
    /// The response sink, present iff the route descriptor declares a
    /// response channel. Fulfill it directly, stash a clone for later, or
    /// return a [`Deferred`] and let the router attach it.
    pub responder: Option<Responder>,
}

/// What a handler did with the message.
pub enum HandlerReturn {
    /// The handler is done; it has called the responder itself or never
    /// will.
    Done,
    /// Resolve the responder with this computation's value when it
    /// arrives.
    Deferred(Deferred),
}

/// Error type handlers may fail with; stringified into the process-wide
/// error channel, never propagated to the host.
pub type BoxError = Box<dyn std::error::Error>;

type Handler = Box<dyn FnMut(Invocation) -> Result<HandlerReturn, BoxError>>;
type DirectListener = Box<dyn FnMut(&[Value], &Caller)>;

/// Resolves inbound envelopes to handlers and manages the response channel.
///
/// One instance per process, shared by whichever transport the host
/// environment selected at startup. Registries are instance state; the
/// route table is fixed after construction.
pub struct Router {
    table: RouteTable,
    handlers: HashMap<(String, String), Handler>,
    direct: HashMap<String, DirectListener>,
}

impl Router {
    /// Create a router over a populated route table.
    pub fn new(table: RouteTable) -> Self {
        Self { table, handlers: HashMap::new(), direct: HashMap::new() }
    }

    /// The route table this router consults.
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Register a listener for a literal message name.
    ///
    /// Direct listeners take precedence over the route table, receive no
    /// response channel, and their return value is ignored. Registering the
    /// same name again replaces the previous listener.
    pub fn on_direct(
        &mut self,
        name: impl Into<String>,
        listener: impl FnMut(&[Value], &Caller) + 'static,
    ) {
        self.direct.insert(name.into(), Box::new(listener));
    }

    /// Register the handler function for a namespace/action pair.
    ///
    /// Registering the same pair again replaces the previous handler.
    pub fn register_handler(
        &mut self,
        namespace: impl Into<String>,
        action: impl Into<String>,
        handler: impl FnMut(Invocation) -> Result<HandlerReturn, BoxError> + 'static,
    ) {
        self.handlers.insert((namespace.into(), action.into()), Box::new(handler));
    }

    /// Route and invoke one inbound message.
    ///
    /// `deliver` is the transport's deliver-response primitive; it is only
    /// wired up when the route descriptor declares a response channel.
    /// Returns whether a response will arrive asynchronously.
    ///
    /// # Errors
    ///
    /// Configuration errors ([`RouterError::RouteNotFound`],
    /// [`RouterError::HandlerNotRegistered`],
    /// [`RouterError::MalformedName`]) and handler failures. Transports
    /// that must not propagate errors into the host event loop go through
    /// [`Router::handle`] instead.
    pub fn receive(
        &mut self,
        envelope: Envelope,
        caller: Caller,
        deliver: impl FnOnce(Vec<Value>) + 'static,
    ) -> Result<bool, RouterError> {
        let Envelope { name, mut args, .. } = envelope;

        if let Some(listener) = self.direct.get_mut(&name) {
            trace!(%name, "direct listener took the message");
            listener(&args, &caller);
            return Ok(false);
        }

        let Some(parsed) = MessageName::parse(&name) else {
            return Err(RouterError::MalformedName { name });
        };
        let key = (parsed.namespace.to_owned(), parsed.action.to_owned());

        let descriptor = self.table.get(&key.0, &key.1).cloned();
        let Some(handler) = self.handlers.get_mut(&key) else {
            return Err(match descriptor {
                Some(_) => RouterError::HandlerNotRegistered { namespace: key.0, action: key.1 },
                None => RouterError::RouteNotFound { name },
            });
        };

        let responder = descriptor.map(|desc| {
            // The caller may have sent a placeholder where its callback sat;
            // the responder replaces it.
            let slot = desc.callback_arg_index().unwrap_or_else(|| args.len().saturating_sub(1));
            if matches!(args.get(slot), Some(Value::Null)) {
                args.remove(slot);
            }
            Responder::new(desc.pre_send_transform(), deliver)
        });
        let response_expected = responder.is_some();

        trace!(%name, response_expected, "invoking handler");
        let invocation = Invocation { args, caller, responder: responder.clone() };
        match handler(invocation) {
            Ok(HandlerReturn::Done) => {},
            Ok(HandlerReturn::Deferred(deferred)) => {
                if let Some(responder) = responder {
                    deferred.on_resolve(move |value| responder.respond(vec![value]));
                }
            },
            Err(err) => {
                return Err(RouterError::Handler { message: err.to_string(), response_expected });
            },
        }
        Ok(response_expected)
    }

    /// Transport-facing entry point: route, invoke, and swallow failures.
    ///
    /// Any error is logged through the process-wide error channel and
    /// suppressed; an uncaught error here would destabilize the host event
    /// loop shared with unrelated functionality. The returned bool keeps
    /// the host's response-channel contract: when a route descriptor was
    /// resolved it stays `true` even if invocation then failed, and the
    /// caller's pending call is simply never resolved.
    pub fn handle(
        &mut self,
        envelope: Envelope,
        caller: Caller,
        deliver: impl FnOnce(Vec<Value>) + 'static,
    ) -> bool {
        let name = envelope.name.clone();
        match self.receive(envelope, caller, deliver) {
            Ok(response_expected) => response_expected,
            Err(RouterError::Handler { message, response_expected }) => {
                error!(%name, %message, "message handler failed");
                response_expected
            },
            Err(err @ RouterError::HandlerNotRegistered { .. }) => {
                error!(%name, error = %err, "message routing failed");
                true
            },
            Err(err) => {
                error!(%name, error = %err, "message routing failed");
                false
            },
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::json;

    use super::*;

    fn collect_responses() -> (Rc<RefCell<Vec<Vec<Value>>>>, impl FnOnce(Vec<Value>) + 'static) {
        let responses = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&responses);
        (responses, move |args| sink.borrow_mut().push(args))
    }

    #[test]
    fn direct_listener_wins_over_route_table() {
        let mut table = RouteTable::new();
        table.insert("Foo", "bar", RouteDescriptor::new());
        let mut router = Router::new(table);

        let handler_calls = Rc::new(RefCell::new(0));
        let calls = Rc::clone(&handler_calls);
        router.register_handler("Foo", "bar", move |_| {
            *calls.borrow_mut() += 1;
            Ok(HandlerReturn::Done)
        });

        let direct_calls = Rc::new(RefCell::new(Vec::new()));
        let calls = Rc::clone(&direct_calls);
        router.on_direct("Foo#bar", move |args, _| calls.borrow_mut().push(args.to_vec()));

        let (responses, deliver) = collect_responses();
        let expected = router
            .receive(Envelope::new("Foo#bar", vec![json!("x")]), Caller::Page, deliver)
            .unwrap();

        assert!(!expected, "direct listeners never use the response channel");
        assert_eq!(*direct_calls.borrow(), vec![vec![json!("x")]]);
        assert_eq!(*handler_calls.borrow(), 0);
        assert!(responses.borrow().is_empty());
    }

    #[test]
    fn responder_applies_pre_send_transform() {
        let mut table = RouteTable::new();
        table.insert(
            "Math",
            "double",
            RouteDescriptor::new().pre_send(|args| {
                args.into_iter().map(|v| json!(v.as_i64().unwrap_or(0) * 2)).collect()
            }),
        );
        let mut router = Router::new(table);
        router.register_handler("Math", "double", |invocation| {
            let responder = invocation.responder.unwrap();
            responder.respond(vec![json!(5)]);
            Ok(HandlerReturn::Done)
        });

        let (responses, deliver) = collect_responses();
        let expected =
            router.receive(Envelope::new("Math#double", vec![]), Caller::Page, deliver).unwrap();

        assert!(expected);
        assert_eq!(*responses.borrow(), vec![vec![json!(10)]]);
    }

    #[test]
    fn unknown_route_is_loud_and_sends_nothing() {
        let mut router = Router::new(RouteTable::new());
        let (responses, deliver) = collect_responses();

        let err = router
            .receive(Envelope::new("Missing#Action", vec![]), Caller::Page, deliver)
            .unwrap_err();

        assert!(matches!(err, RouterError::RouteNotFound { name } if name == "Missing#Action"));
        assert!(responses.borrow().is_empty());
    }

    #[test]
    fn routed_but_unregistered_handler_reports_open_channel() {
        let mut table = RouteTable::new();
        table.insert("Tabs", "open", RouteDescriptor::new());
        let mut router = Router::new(table);

        let (responses, deliver) = collect_responses();
        let expected = router.handle(Envelope::new("Tabs#open", vec![]), Caller::Page, deliver);

        // The channel was promised; the caller's pending call hangs.
        assert!(expected);
        assert!(responses.borrow().is_empty());
    }

    #[test]
    fn deferred_return_resolves_the_responder() {
        let mut table = RouteTable::new();
        table.insert("Store", "load", RouteDescriptor::new());
        let mut router = Router::new(table);

        let resolver_slot = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&resolver_slot);
        router.register_handler("Store", "load", move |_| {
            let (deferred, resolver) = Deferred::new();
            *slot.borrow_mut() = Some(resolver);
            Ok(HandlerReturn::Deferred(deferred))
        });

        let (responses, deliver) = collect_responses();
        let expected =
            router.receive(Envelope::new("Store#load", vec![]), Caller::Page, deliver).unwrap();
        assert!(expected);
        assert!(responses.borrow().is_empty(), "nothing delivered until the deferred resolves");

        resolver_slot.borrow_mut().take().unwrap().resolve(json!({"items": 3}));
        assert_eq!(*responses.borrow(), vec![vec![json!({"items": 3})]]);
    }

    #[test]
    fn callback_placeholder_is_stripped() {
        let mut table = RouteTable::new();
        table.insert("Tabs", "open", RouteDescriptor::new());
        let mut router = Router::new(table);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let args_sink = Rc::clone(&seen);
        router.register_handler("Tabs", "open", move |invocation| {
            args_sink.borrow_mut().push(invocation.args);
            Ok(HandlerReturn::Done)
        });

        let (_, deliver) = collect_responses();
        router
            .receive(
                Envelope::new("Tabs#open", vec![json!("https://example.org"), Value::Null]),
                Caller::Page,
                deliver,
            )
            .unwrap();

        assert_eq!(*seen.borrow(), vec![vec![json!("https://example.org")]]);
    }

    #[test]
    fn handler_without_descriptor_fires_and_forgets() {
        let mut router = Router::new(RouteTable::new());
        let got_responder = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&got_responder);
        router.register_handler("Log", "write", move |invocation| {
            *sink.borrow_mut() = Some(invocation.responder.is_some());
            Ok(HandlerReturn::Done)
        });

        let (responses, deliver) = collect_responses();
        let expected = router
            .receive(Envelope::new("Log#write", vec![json!("line")]), Caller::Page, deliver)
            .unwrap();

        assert!(!expected);
        assert_eq!(*got_responder.borrow(), Some(false));
        assert!(responses.borrow().is_empty());
    }

    #[test]
    fn handler_failure_is_swallowed_with_channel_state() {
        let mut table = RouteTable::new();
        table.insert("Tabs", "open", RouteDescriptor::new());
        let mut router = Router::new(table);
        router.register_handler("Tabs", "open", |_| Err("host gone".into()));

        let (responses, deliver) = collect_responses();
        let expected = router.handle(Envelope::new("Tabs#open", vec![]), Caller::Page, deliver);

        assert!(expected, "the route promised a response before the failure");
        assert!(responses.borrow().is_empty());
    }

    #[test]
    fn unseparated_name_without_direct_listener_fails() {
        let mut router = Router::new(RouteTable::new());
        let (_, deliver) = collect_responses();
        let err =
            router.receive(Envelope::new("ping", vec![]), Caller::Page, deliver).unwrap_err();
        assert!(matches!(err, RouterError::MalformedName { name } if name == "ping"));
    }
}
