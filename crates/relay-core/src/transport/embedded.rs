//! Embedded-page ("bookmarklet") transport.
//!
//! Messages cross the frame boundary via a generic cross-origin post
//! primitive as 3-element tuples `[correlationId, name, args]`. Payloads
//! are serialized to text unless a one-time capability probe shows the
//! boundary preserves structured values; the probe result is cached for
//! the whole session. Every outbound call carries a correlation id so the
//! reply can be matched to the right pending call.
//!
//! Both sides allocate correlation ids independently, so an id alone
//! cannot tell a reply from a request that happens to collide with a
//! pending call. Replies travel under the request's name with the response
//! suffix appended (as on the legacy transport), which keeps the two
//! unambiguous on the wire.

use std::collections::HashMap;
use std::rc::Rc;

use relay_proto::{
    CorrelationId, decode_page, encode_page, response_event_name, split_response_event,
};
use serde_json::{Value, json};
use tracing::{trace, warn};

use crate::router::{Caller, Deferred, Resolver, Router};

/// Message name of the structured-clone capability probe.
///
/// Posted once at init; receiving it back in structured form proves the
/// boundary passes structured values. A no-op direct listener absorbs it.
pub const STRUCTURED_CLONE_PROBE: &str = "structuredCloneTest";

/// A payload crossing the frame boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum PagePayload {
    /// JSON text, for boundaries that only pass strings.
    Text(String),
    /// A structured value passed directly.
    Structured(Value),
}

/// The host's cross-origin post primitive.
pub trait PageHost {
    /// Post a payload to the frame on the other side.
    fn post(&self, payload: PagePayload);
}

/// Transport state for the embedded-page runtime.
pub struct EmbeddedTransport {
    structured_clone: bool,
    next_correlation: u64,
    pending: HashMap<CorrelationId, Resolver>,
}

impl Default for EmbeddedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddedTransport {
    /// Create the transport; [`EmbeddedTransport::init`] must run before
    /// any traffic.
    pub fn new() -> Self {
        Self { structured_clone: false, next_correlation: 1, pending: HashMap::new() }
    }

    /// Register the probe listener and post the capability probe.
    pub fn init(&mut self, router: &mut Router, host: &dyn PageHost) {
        router.on_direct(STRUCTURED_CLONE_PROBE, |_, _| {});
        host.post(PagePayload::Structured(json!([null, STRUCTURED_CLONE_PROBE, null])));
    }

    /// Whether the boundary is known to preserve structured values.
    pub fn structured_clone_supported(&self) -> bool {
        self.structured_clone
    }

    fn next_correlation(&mut self) -> CorrelationId {
        let id = CorrelationId::new(self.next_correlation);
        self.next_correlation += 1;
        id
    }

    fn post(&self, host: &dyn PageHost, wire: Value) {
        if self.structured_clone {
            host.post(PagePayload::Structured(wire));
        } else {
            host.post(PagePayload::Text(wire.to_string()));
        }
    }

    /// Send a message across the frame boundary.
    ///
    /// The returned computation resolves with the reply's argument payload
    /// if one ever arrives; callers that do not care may drop it.
    pub fn send(&mut self, host: &dyn PageHost, name: &str, args: Vec<Value>) -> Deferred {
        let correlation = self.next_correlation();
        let (deferred, resolver) = Deferred::new();
        self.pending.insert(correlation, resolver);
        self.post(host, encode_page(Some(correlation), name, &args));
        deferred
    }

    /// Handle a payload arriving from the other side of the boundary.
    ///
    /// A response-named reply matching a pending call resolves it;
    /// anything else is decoded and routed, with the response posted back
    /// under the request's response event name and the same correlation
    /// id. Undecodable payloads are dropped: the boundary is shared with
    /// unrelated window messaging.
    pub fn on_page_message(
        &mut self,
        router: &mut Router,
        host: &Rc<dyn PageHost>,
        payload: PagePayload,
    ) {
        let value = match payload {
            PagePayload::Structured(value) => {
                self.structured_clone = true;
                value
            },
            PagePayload::Text(text) => match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(_) => {
                    trace!("ignoring non-JSON page message");
                    return;
                },
            },
        };

        let envelope = match decode_page(&value) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(%err, "dropping undecodable page message");
                return;
            },
        };

        if split_response_event(&envelope.name).is_some() {
            if let Some(correlation) = envelope.correlation
                && let Some(resolver) = self.pending.remove(&correlation)
            {
                resolver.resolve(Value::Array(envelope.args));
            } else {
                trace!(name = %envelope.name, "ignoring reply with no pending call");
            }
            return;
        }

        let correlation = envelope.correlation;
        let reply_event = response_event_name(&envelope.name);
        let structured = self.structured_clone;
        let reply_host = Rc::clone(host);
        router.handle(envelope, Caller::Page, move |args: Vec<Value>| {
            let wire = encode_page(correlation, &reply_event, &args);
            if structured {
                reply_host.post(PagePayload::Structured(wire));
            } else {
                reply_host.post(PagePayload::Text(wire.to_string()));
            }
        });
    }
}
