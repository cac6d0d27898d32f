//! Fake native messaging runtime.

use std::cell::RefCell;

use relay_core::router::Resolver;
use relay_core::transport::NativeHost;
use serde_json::Value;

/// One message captured by the fake runtime, with the resolver the
/// destination would fire on reply.
pub struct SentMessage {
    /// Destination context as the transport addressed it.
    pub destination: Value,
    /// The encoded wire payload.
    pub payload: Value,
    resolver: Resolver,
}

impl SentMessage {
    /// Play the destination's reply.
    pub fn reply(self, value: Value) {
        self.resolver.resolve(value);
    }
}

/// A fake host runtime that records outbound sends and lets tests play the
/// remote side's replies.
#[derive(Default)]
pub struct FakeRuntime {
    sent: RefCell<Vec<SentMessage>>,
}

impl FakeRuntime {
    /// An idle runtime.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every message sent so far, in order.
    pub fn drain(&self) -> Vec<SentMessage> {
        self.sent.borrow_mut().drain(..).collect()
    }
}

impl NativeHost for FakeRuntime {
    fn send_to(&self, destination: &Value, payload: Value, on_response: Resolver) {
        self.sent.borrow_mut().push(SentMessage {
            destination: destination.clone(),
            payload,
            resolver: on_response,
        });
    }
}
