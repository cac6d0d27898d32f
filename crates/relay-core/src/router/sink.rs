//! Single-resolution response sinks and deferred computations.
//!
//! Transport code only ever talks to a [`Responder`]: one value, delivered
//! at most once, optionally transformed on the way out. A handler may
//! fulfill it directly, or return a [`Deferred`] and let the router attach
//! the responder as its continuation.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use tracing::trace;

/// Pre-send transform applied to outgoing response arguments before they
/// cross the transport boundary.
pub type PreSend = Rc<dyn Fn(Vec<Value>) -> Vec<Value>>;

type Continuation = Box<dyn FnOnce(Value)>;

#[derive(Default)]
struct DeferredShared {
    continuation: Option<Continuation>,
    value: Option<Value>,
    done: bool,
}

/// A value that is not yet available.
///
/// The explicit register-continuation capability: handlers that compute
/// their result asynchronously return one of these instead of calling the
/// responder themselves, and the router wires the two together. Single
/// continuation, single resolution.
pub struct Deferred {
    shared: Rc<RefCell<DeferredShared>>,
}

/// The fulfilling half of a [`Deferred`].
///
/// Consumed by [`Resolver::resolve`]; dropping it unresolved abandons the
/// computation (the continuation never runs).
pub struct Resolver {
    shared: Rc<RefCell<DeferredShared>>,
}

impl Deferred {
    /// Create a deferred computation and its resolver.
    pub fn new() -> (Self, Resolver) {
        let shared = Rc::new(RefCell::new(DeferredShared::default()));
        (Self { shared: Rc::clone(&shared) }, Resolver { shared })
    }

    /// A computation that already has its value.
    pub fn resolved(value: Value) -> Self {
        let shared = Rc::new(RefCell::new(DeferredShared {
            continuation: None,
            value: Some(value),
            done: false,
        }));
        Self { shared }
    }

    /// Register the continuation.
    ///
    /// Runs immediately if the value is already available, otherwise when
    /// the resolver fires. At most one continuation ever runs.
    pub fn on_resolve(self, continuation: impl FnOnce(Value) + 'static) {
        let ready = {
            let mut shared = self.shared.borrow_mut();
            if shared.done {
                return;
            }
            match shared.value.take() {
                Some(value) => {
                    shared.done = true;
                    Some(value)
                },
                None => {
                    shared.continuation = Some(Box::new(continuation));
                    return;
                },
            }
        };
        if let Some(value) = ready {
            continuation(value);
        }
    }
}

impl Resolver {
    /// Resolve with a value, running the continuation if one is attached.
    ///
    /// The borrow is released before the continuation runs, so a
    /// continuation may itself resolve other deferred computations.
    pub fn resolve(self, value: Value) {
        let continuation = {
            let mut shared = self.shared.borrow_mut();
            if shared.done {
                return;
            }
            match shared.continuation.take() {
                Some(k) => {
                    shared.done = true;
                    Some(k)
                },
                None => {
                    shared.value = Some(value);
                    return;
                },
            }
        };
        if let Some(k) = continuation {
            k(value);
        }
    }
}

struct ResponderInner {
    pre_send: Option<PreSend>,
    deliver: Box<dyn FnOnce(Vec<Value>)>,
}

/// The single-resolution response sink for one inbound message.
///
/// Fulfilling it runs the route's pre-send transform and hands the
/// arguments to the transport's deliver-response primitive exactly once.
/// Later calls are ignored; at-most-once delivery is the contract and a
/// double call must not crash.
#[derive(Clone)]
pub struct Responder {
    inner: Rc<RefCell<Option<ResponderInner>>>,
}

impl Responder {
    /// Build a responder around a transport deliver primitive.
    pub fn new(pre_send: Option<PreSend>, deliver: impl FnOnce(Vec<Value>) + 'static) -> Self {
        let inner = ResponderInner { pre_send, deliver: Box::new(deliver) };
        Self { inner: Rc::new(RefCell::new(Some(inner))) }
    }

    /// Deliver the response arguments.
    pub fn respond(&self, args: Vec<Value>) {
        let Some(inner) = self.inner.borrow_mut().take() else {
            trace!("response sink already spent, ignoring");
            return;
        };
        let args = match inner.pre_send {
            Some(transform) => transform(args),
            None => args,
        };
        (inner.deliver)(args);
    }

    /// Whether the response has already been delivered.
    pub fn is_spent(&self) -> bool {
        self.inner.borrow().is_none()
    }
}
