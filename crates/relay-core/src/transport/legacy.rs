//! Legacy-extension transport.
//!
//! Messages are named events on a per-tab object: the event name is the
//! message name and the event payload is `[correlationId, args]`. Responses
//! go back as a synthesized event named `name#Response` with payload
//! `[correlationId, data]`. The host assigns no tab identity, so the
//! transport synthesizes ids through a [`TabRegistry`] and resolves them
//! back to dispatchable targets for response routing.

use std::rc::Rc;

use relay_proto::{decode_event_payload, encode_event_response, response_event_name, split_response_event};
use serde_json::Value;
use tracing::{trace, warn};

use crate::router::{Caller, Router};
use crate::transport::tabs::{TabId, TabRegistry, TabTarget};

/// The legacy host's per-tab event primitives.
pub trait LegacyHost {
    /// Dispatch a named event with a payload to a tab target.
    fn dispatch(&self, target: &TabTarget, event: &str, payload: Value);

    /// Whether the tab is still attached to a host window.
    fn is_attached(&self, target: &TabTarget) -> bool;
}

/// Transport state for the legacy extension runtime.
#[derive(Debug, Default)]
pub struct LegacyTransport {
    tabs: TabRegistry,
}

impl LegacyTransport {
    /// Create the transport with an empty tab registry.
    pub fn new() -> Self {
        Self { tabs: TabRegistry::new() }
    }

    /// The synthesized tab associations.
    pub fn tabs(&self) -> &TabRegistry {
        &self.tabs
    }

    /// Drop registry entries for tabs the host no longer considers
    /// attached. Drive this periodically; tabs close outside this layer's
    /// knowledge.
    pub fn prune_detached(&mut self, host: &dyn LegacyHost) {
        self.tabs.prune_detached(|target| host.is_attached(target));
    }

    /// Send a message to a tab as a named event.
    ///
    /// Fire-and-forget: delivery is not observable on this side.
    pub fn send(&mut self, host: &dyn LegacyHost, tab: TabId, name: &str, args: Vec<Value>) {
        let Some(target) = self.tabs.target(tab) else {
            warn!(%tab, %name, "no target for tab, dropping message");
            return;
        };
        host.dispatch(target, name, Value::Array(args));
    }

    /// Handle a named event arriving from a tab.
    ///
    /// The tab gets an id on first contact. The message is routed, and the
    /// response (if the route expects one) is dispatched back to the same
    /// tab as a `name#Response` event carrying the original correlation
    /// id.
    pub fn on_event(
        &mut self,
        router: &mut Router,
        host: &Rc<dyn LegacyHost>,
        event: &str,
        payload: &Value,
        target: &TabTarget,
    ) {
        if split_response_event(event).is_some() {
            // Response events flow the other way; nothing to route here.
            trace!(%event, "ignoring response event");
            return;
        }

        let tab = self.tabs.ensure(target);

        let (correlation, args) = match decode_event_payload(payload) {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!(%event, %err, "dropping undecodable tab event");
                return;
            },
        };

        let envelope = relay_proto::Envelope::new(event, args).with_correlation(correlation);
        let reply_host = Rc::clone(host);
        let reply_target = target.clone();
        let reply_event = response_event_name(event);
        router.handle(envelope, Caller::Tab(tab), move |args: Vec<Value>| {
            reply_host.dispatch(
                &reply_target,
                &reply_event,
                encode_event_response(correlation, Value::Array(args)),
            );
        });
    }
}
