//! Wire format for the relay message protocol.
//!
//! A remote call crosses a runtime boundary as a small JSON tuple: an
//! optional correlation id, a namespaced message name, and an ordered
//! argument payload. Three host transports use two wire shapes:
//!
//! - page (embedded frame) messages: `[correlationId, name, args]`
//! - native runtime messages: `[name, args]` (the host correlates)
//! - legacy per-tab events: the event name carries the message name and the
//!   event payload is `[correlationId, args]`
//!
//! Decoding validates shape and fails with a [`DecodeError`] instead of
//! trusting arbitrary arrays. Argument payloads are always coerced to a
//! sequence, so a handler never has to distinguish "one value" from "a list
//! of one value".
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod envelope;
pub mod errors;
pub mod name;

pub use envelope::{
    CorrelationId, Envelope, decode_event_payload, decode_event_response, decode_page,
    decode_page_text, decode_runtime, encode_event_payload, encode_event_response, encode_page,
    encode_page_text, encode_runtime,
};
pub use errors::{DecodeError, Result};
pub use name::{
    MESSAGE_SEPARATOR, MessageName, RESPONSE_SUFFIX, response_event_name, split_response_event,
};
