//! Fake cross-origin post boundary.

use std::cell::RefCell;

use relay_core::transport::{PageHost, PagePayload};

/// A fake frame boundary that records posted payloads.
///
/// Configured with whether it preserves structured values, mirroring the
/// capability the real boundary may or may not have. [`FakePage::deliver`]
/// models the payload arriving on the other side: a text-only boundary
/// downgrades structured payloads to their JSON text.
#[derive(Default)]
pub struct FakePage {
    structured: bool,
    posted: RefCell<Vec<PagePayload>>,
}

impl FakePage {
    /// A boundary that preserves structured values.
    pub fn structured() -> Self {
        Self { structured: true, posted: RefCell::new(Vec::new()) }
    }

    /// A boundary that only passes text.
    pub fn text_only() -> Self {
        Self::default()
    }

    /// Take every payload posted so far, in order.
    pub fn drain(&self) -> Vec<PagePayload> {
        self.posted.borrow_mut().drain(..).collect()
    }

    /// What a posted payload looks like when it arrives on the other side.
    pub fn deliver(&self, payload: PagePayload) -> PagePayload {
        match payload {
            PagePayload::Structured(value) if !self.structured => {
                PagePayload::Text(value.to_string())
            },
            other => other,
        }
    }
}

impl PageHost for FakePage {
    fn post(&self, payload: PagePayload) {
        self.posted.borrow_mut().push(payload);
    }
}
