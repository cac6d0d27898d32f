//! The three cross-context transports.
//!
//! Chosen at startup based on the host environment and never mixed at
//! runtime. Each transport adapts one host messaging primitive to the
//! [`crate::router::Router`]: it decodes the host's raw payload into an
//! envelope, hands it to the router, and wires the router's response
//! delivery back onto the host primitive. Host primitives are traits so
//! tests can fake them.

mod embedded;
mod legacy;
mod native;
mod tabs;

pub use embedded::{EmbeddedTransport, PageHost, PagePayload, STRUCTURED_CLONE_PROBE};
pub use legacy::{LegacyHost, LegacyTransport};
pub use native::{NativeHost, NativeTransport};
pub use tabs::{TabId, TabRegistry, TabTarget};
