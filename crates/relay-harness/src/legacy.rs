//! Fake legacy tab host.

use std::cell::RefCell;
use std::collections::HashSet;

use relay_core::transport::{LegacyHost, TabTarget};
use serde_json::Value;

/// A fake per-tab event host: records dispatched events and tracks which
/// tabs are still attached to a window.
#[derive(Default)]
pub struct FakeTabHost {
    dispatched: RefCell<Vec<(TabTarget, String, Value)>>,
    attached: RefCell<HashSet<TabTarget>>,
}

impl FakeTabHost {
    /// A host with no tabs attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a tab as attached to a window.
    pub fn attach(&self, target: &TabTarget) {
        self.attached.borrow_mut().insert(target.clone());
    }

    /// Mark a tab as closed.
    pub fn detach(&self, target: &TabTarget) {
        self.attached.borrow_mut().remove(target);
    }

    /// Take every dispatched `(target, event, payload)` triple, in order.
    pub fn drain(&self) -> Vec<(TabTarget, String, Value)> {
        self.dispatched.borrow_mut().drain(..).collect()
    }
}

impl LegacyHost for FakeTabHost {
    fn dispatch(&self, target: &TabTarget, event: &str, payload: Value) {
        self.dispatched.borrow_mut().push((target.clone(), event.to_owned(), payload));
    }

    fn is_attached(&self, target: &TabTarget) -> bool {
        self.attached.borrow().contains(target)
    }
}
