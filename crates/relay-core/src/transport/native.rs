//! Native-extension transport.
//!
//! The host runtime owns correlation and response delivery: inbound
//! messages arrive with a one-shot response primitive, and outbound sends
//! take a destination context and resolve with that context's reply. The
//! wire shape is the 2-element tuple `[name, args]`.

use relay_proto::{decode_runtime, encode_runtime};
use serde_json::Value;
use tracing::warn;

use crate::router::{Caller, Deferred, Resolver, Router};

/// The host runtime's messaging primitive.
pub trait NativeHost {
    /// Deliver `payload` to the destination context; `on_response` fires
    /// with that context's reply.
    fn send_to(&self, destination: &Value, payload: Value, on_response: Resolver);
}

/// Transport adapter for the native extension runtime.
///
/// Stateless: the host runtime carries all correlation state.
#[derive(Debug, Default)]
pub struct NativeTransport;

impl NativeTransport {
    /// Create the transport adapter.
    pub fn new() -> Self {
        Self
    }

    /// Send a message to a destination context.
    ///
    /// The returned computation resolves with the remote response.
    pub fn send(
        &self,
        host: &dyn NativeHost,
        destination: &Value,
        name: &str,
        args: Vec<Value>,
    ) -> Deferred {
        let (deferred, resolver) = Deferred::new();
        host.send_to(destination, encode_runtime(name, &args), resolver);
        deferred
    }

    /// Handle an inbound message from the host runtime.
    ///
    /// `respond` is the host's one-shot response primitive. Returns whether
    /// it will be invoked asynchronously; the host uses this to keep the
    /// response channel open.
    pub fn on_message(
        &self,
        router: &mut Router,
        payload: &Value,
        sender: Value,
        respond: impl FnOnce(Value) + 'static,
    ) -> bool {
        let envelope = match decode_runtime(payload) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(%err, "dropping undecodable runtime message");
                return false;
            },
        };
        router.handle(envelope, Caller::Native(sender), move |args: Vec<Value>| {
            respond(Value::Array(args));
        })
    }
}
