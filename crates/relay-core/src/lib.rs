//! Core state machines for the relay messaging layer.
//!
//! Two independent components, both sitting at a runtime boundary:
//!
//! - [`intercept`]: correlates network-request lifecycle events with a
//!   header cache keyed by request id, and dispatches enriched events to
//!   registered observers.
//! - [`router`] + [`transport`]: decodes message envelopes, resolves them
//!   to handlers, and relays responses over one of three physically
//!   different cross-context transports.
//!
//! # Threading
//!
//! Everything here is single-threaded and event-driven: all state is owned
//! by instances constructed at process start and touched only from the host
//! event loop. Continuations use `Rc`/`RefCell`, so none of these types are
//! `Send`. On a genuinely multi-threaded host, serialize access through a
//! single-consumer queue before reaching this layer.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod intercept;
pub mod router;
pub mod transport;

pub use intercept::{
    Directive, HeaderSet, InterceptError, Interceptor, NetEvent, ObserverId, RequestId, Stage,
    normalize,
};
pub use router::{
    BoxError, Caller, Deferred, HandlerReturn, Invocation, PreSend, Resolver, Responder,
    RouteDescriptor, RouteTable, Router, RouterError,
};
pub use transport::{
    EmbeddedTransport, LegacyHost, LegacyTransport, NativeHost, NativeTransport, PageHost,
    PagePayload, TabId, TabRegistry, TabTarget,
};
