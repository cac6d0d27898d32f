//! In-memory fake hosts for deterministic transport testing.
//!
//! Each fake implements one of the host traits from
//! [`relay_core::transport`] and records everything the transport hands it,
//! so tests can drive complete message flows without a browser runtime:
//! post a payload, loop it back, and assert on what crossed the boundary.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod legacy;
pub mod native;
pub mod page;

pub use legacy::FakeTabHost;
pub use native::{FakeRuntime, SentMessage};
pub use page::FakePage;
