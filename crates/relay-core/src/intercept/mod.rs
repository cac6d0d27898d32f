//! Request-header capture and lifecycle-event dispatch.
//!
//! Every network request the host intercepts flows through here twice: once
//! when its headers are about to be sent, once when response headers
//! arrive. The [`Interceptor`] normalizes raw header arrays, caches the
//! send-phase capture keyed by request id, and enriches later events with
//! it. The send-phase capture is authoritative: re-normalizing at the
//! receive phase cannot recover headers the network layer added in between
//! (auth tokens, cookies).
//!
//! Observers registered per lifecycle stage see the enriched event in
//! registration order; the first one returning a directive short-circuits
//! the rest, and that directive becomes the host's blocking-response value.

mod headers;

use std::collections::HashMap;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;
use tracing::trace;

pub use headers::{HeaderSet, normalize};

/// Configuration errors for the interception layer.
///
/// These indicate a programming mistake in the application layer and are
/// raised synchronously, never swallowed.
#[derive(Debug, Error)]
pub enum InterceptError {
    /// A stage name from the host boundary is not a known lifecycle stage.
    #[error("no request lifecycle stage named '{0}'")]
    UnknownStage(String),
}

/// Observable lifecycle stages of an intercepted network request.
///
/// Completion is not a stage: it only prunes the capture cache (see
/// [`Interceptor::release`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Request headers are about to be sent.
    BeforeSendHeaders,
    /// Response headers arrived.
    HeadersReceived,
    /// The request failed.
    ErrorOccurred,
}

impl Stage {
    /// All stages, in lifecycle order.
    pub const ALL: [Self; 3] = [Self::BeforeSendHeaders, Self::HeadersReceived, Self::ErrorOccurred];

    fn index(self) -> usize {
        match self {
            Self::BeforeSendHeaders => 0,
            Self::HeadersReceived => 1,
            Self::ErrorOccurred => 2,
        }
    }

    /// The host-facing name of this stage.
    pub fn name(self) -> &'static str {
        match self {
            Self::BeforeSendHeaders => "beforeSendHeaders",
            Self::HeadersReceived => "headersReceived",
            Self::ErrorOccurred => "errorOccurred",
        }
    }
}

impl FromStr for Stage {
    type Err = InterceptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.name() == s)
            .ok_or_else(|| InterceptError::UnknownStage(s.to_owned()))
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque request identifier assigned by the host network layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Wrap a host-assigned identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<u64> for RequestId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token identifying a registered observer, for removal.
///
/// The JS original removed listeners by function identity; closures are not
/// comparable, so registration hands back a token instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverId(u64);

/// A lifecycle event as delivered by the host, plus the fields this layer
/// fills in during dispatch.
#[derive(Debug, Clone, Default)]
pub struct NetEvent {
    /// Raw request headers as the host delivered them, if any.
    pub raw_request_headers: Option<Value>,
    /// Raw response headers as the host delivered them, if any.
    pub raw_response_headers: Option<Value>,
    /// Normalized request headers; filled during dispatch. When a
    /// send-phase capture exists for this request it takes precedence over
    /// whatever raw headers accompany the event.
    pub request_headers: Option<HeaderSet>,
    /// Normalized response headers; filled during dispatch.
    pub response_headers: Option<HeaderSet>,
}

/// A host-defined directive returned by an observer to mutate the in-flight
/// request or response (e.g. a blocking-response value rewriting headers).
pub type Directive = Value;

type Observer = Box<dyn FnMut(&RequestId, &NetEvent) -> Option<Directive>>;

/// Correlates request-scoped header sets across the send/receive lifecycle
/// and dispatches enriched events to per-stage observers.
///
/// One instance per process, owned by whatever drives the host's network
/// events; all registries are instance state, not globals.
#[derive(Default)]
pub struct Interceptor {
    observers: [Vec<(ObserverId, Observer)>; 3],
    captured: HashMap<RequestId, HeaderSet>,
    next_observer: u64,
}

impl Interceptor {
    /// Create an interceptor with no observers and an empty capture cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for a lifecycle stage.
    ///
    /// Observers run in registration order. Duplicate registrations are
    /// kept and run twice.
    pub fn add_observer(
        &mut self,
        stage: Stage,
        observer: impl FnMut(&RequestId, &NetEvent) -> Option<Directive> + 'static,
    ) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers[stage.index()].push((id, Box::new(observer)));
        id
    }

    /// Remove a previously registered observer.
    ///
    /// Removing an unknown token is a silent no-op.
    pub fn remove_observer(&mut self, stage: Stage, id: ObserverId) {
        self.observers[stage.index()].retain(|(candidate, _)| *candidate != id);
    }

    /// Number of observers registered for a stage.
    pub fn observer_count(&self, stage: Stage) -> usize {
        self.observers[stage.index()].len()
    }

    /// Capture the send-phase headers for a request, overwriting any stale
    /// entry under the same id.
    ///
    /// A raw value that does not normalize (host variance) captures
    /// nothing; the later lookup miss is a soft miss.
    pub fn capture_request(&mut self, id: &RequestId, raw_headers: &Value) {
        if let Some(headers) = normalize(raw_headers) {
            self.captured.insert(id.clone(), headers);
        }
    }

    /// The send-phase capture for a request, if one is live.
    pub fn captured(&self, id: &RequestId) -> Option<&HeaderSet> {
        self.captured.get(id)
    }

    /// Drop the capture for a request.
    ///
    /// Invoked for both the completed and errored terminal events; no-op if
    /// nothing was captured.
    pub fn release(&mut self, id: &RequestId) {
        self.captured.remove(id);
    }

    /// Enrich an event and run the stage's observers over it.
    ///
    /// With zero observers registered for the stage this returns
    /// immediately without any normalization work; every network event on
    /// every resource of every page flows through here, so the empty case
    /// must stay cheap.
    ///
    /// Returns the first observer's directive, or `None` meaning "do not
    /// alter this request/response".
    pub fn dispatch(
        &mut self,
        stage: Stage,
        request_id: &RequestId,
        event: &mut NetEvent,
    ) -> Option<Directive> {
        if self.observers[stage.index()].is_empty() {
            return None;
        }

        if let Some(raw) = &event.raw_request_headers {
            event.request_headers = normalize(raw);
        }
        if let Some(raw) = &event.raw_response_headers {
            event.response_headers = normalize(raw);
        }
        // The send-phase capture wins over re-normalized request headers.
        if let Some(captured) = self.captured.get(request_id) {
            event.request_headers = Some(captured.clone());
        }

        for (id, observer) in &mut self.observers[stage.index()] {
            if let Some(directive) = observer(request_id, event) {
                trace!(%stage, %request_id, observer = id.0, "observer returned a directive");
                return Some(directive);
            }
        }
        None
    }
}
