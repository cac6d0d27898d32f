//! Synthesized tab identity for the legacy runtime.
//!
//! The legacy host does not assign tab ids, so the first time a tab is seen
//! the registry synthesizes one and remembers the association. Tabs close
//! outside this layer's knowledge, so the registry holds back-references,
//! not ownership: entries whose tab is no longer attached to a host window
//! are dropped by an externally driven liveness sweep.

use std::collections::HashMap;

use tracing::debug;

/// Synthesized identifier for a legacy-runtime tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(u64);

impl TabId {
    /// The raw id value.
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque host key identifying a dispatchable tab target.
///
/// The host must hand over a key that is stable for the lifetime of the
/// tab, so the registry can recognize a tab it has seen before.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TabTarget(String);

impl TabTarget {
    /// Wrap a host key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw host key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The id-to-tab association for the legacy transport.
#[derive(Debug, Default)]
pub struct TabRegistry {
    ids: HashMap<TabTarget, TabId>,
    targets: HashMap<TabId, TabTarget>,
    next_id: u64,
}

impl TabRegistry {
    /// An empty registry. Ids start at 1.
    pub fn new() -> Self {
        Self { ids: HashMap::new(), targets: HashMap::new(), next_id: 1 }
    }

    /// The id for a tab, synthesizing and persisting one the first time
    /// the tab is seen.
    pub fn ensure(&mut self, target: &TabTarget) -> TabId {
        if let Some(id) = self.ids.get(target) {
            return *id;
        }
        let id = TabId(self.next_id);
        self.next_id += 1;
        self.ids.insert(target.clone(), id);
        self.targets.insert(id, target.clone());
        debug!(%id, target = target.as_str(), "registered tab");
        id
    }

    /// Resolve an id back to its dispatchable host target.
    pub fn target(&self, id: TabId) -> Option<&TabTarget> {
        self.targets.get(&id)
    }

    /// Number of live associations.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Drop every entry whose tab the host no longer considers attached.
    ///
    /// Driven externally (e.g. on a periodic tick); a pruned id is never
    /// reused for a different tab.
    pub fn prune_detached(&mut self, alive: impl Fn(&TabTarget) -> bool) {
        self.targets.retain(|_, target| alive(target));
        self.ids.retain(|target, _| alive(target));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_stable_per_tab() {
        let mut registry = TabRegistry::new();
        let a = TabTarget::new("window-1/tab-a");
        let b = TabTarget::new("window-1/tab-b");

        let id_a = registry.ensure(&a);
        let id_b = registry.ensure(&b);
        assert_ne!(id_a, id_b);
        assert_eq!(registry.ensure(&a), id_a);
        assert_eq!(registry.target(id_a), Some(&a));
    }

    #[test]
    fn prune_drops_detached_tabs_and_never_reuses_ids() {
        let mut registry = TabRegistry::new();
        let a = TabTarget::new("tab-a");
        let b = TabTarget::new("tab-b");
        let id_a = registry.ensure(&a);
        registry.ensure(&b);

        registry.prune_detached(|target| target == &b);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.target(id_a), None);

        // Re-registering the pruned tab synthesizes a fresh id.
        let new_id = registry.ensure(&a);
        assert_ne!(new_id, id_a);
    }
}
